// Coupon template catalog
//
// Fixed per-trigger coupon configurations. The catalog is built once at
// startup and passed by reference; nothing mutates it afterwards.

use crate::loyalty::types::{CouponTemplateKey, DiscountType};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Fixed configuration used to mint coupons for one lifecycle trigger
#[derive(Debug, Clone)]
pub struct CouponTemplate {
    pub key: CouponTemplateKey,
    pub code_prefix: &'static str,
    pub description: &'static str,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_purchase: Option<Decimal>,
    pub validity_months: u32,
}

/// Immutable, enum-keyed lookup table of coupon templates
pub struct TemplateCatalog {
    templates: HashMap<CouponTemplateKey, CouponTemplate>,
}

impl TemplateCatalog {
    /// Build the standard catalog of the five lifecycle templates
    pub fn standard() -> Self {
        let mut templates = HashMap::new();

        templates.insert(
            CouponTemplateKey::Welcome,
            CouponTemplate {
                key: CouponTemplateKey::Welcome,
                code_prefix: "WELCOME-",
                description: "Welcome discount for new members",
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::from(10),
                minimum_purchase: Some(Decimal::from(2000)),
                validity_months: 1,
            },
        );

        templates.insert(
            CouponTemplateKey::FirstOrder,
            CouponTemplate {
                key: CouponTemplateKey::FirstOrder,
                code_prefix: "FIRST-",
                description: "Thank-you discount for your first order",
                discount_type: DiscountType::Fixed,
                discount_value: Decimal::from(1000),
                minimum_purchase: Some(Decimal::from(5000)),
                validity_months: 2,
            },
        );

        templates.insert(
            CouponTemplateKey::Reactivation,
            CouponTemplate {
                key: CouponTemplateKey::Reactivation,
                code_prefix: "COMEBACK-",
                description: "Welcome-back discount",
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::from(20),
                minimum_purchase: Some(Decimal::from(3000)),
                validity_months: 1,
            },
        );

        templates.insert(
            CouponTemplateKey::Birthday,
            CouponTemplate {
                key: CouponTemplateKey::Birthday,
                code_prefix: "BDAY-",
                description: "Birthday month discount",
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::from(15),
                minimum_purchase: None,
                validity_months: 1,
            },
        );

        templates.insert(
            CouponTemplateKey::Launch,
            CouponTemplate {
                key: CouponTemplateKey::Launch,
                code_prefix: "LAUNCH-",
                description: "Launch promotion discount",
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::from(15),
                minimum_purchase: Some(Decimal::from(3000)),
                validity_months: 1,
            },
        );

        Self { templates }
    }

    /// Look up the template for a trigger key
    pub fn get(&self, key: CouponTemplateKey) -> Option<&CouponTemplate> {
        self.templates.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_catalog_covers_all_keys() {
        let catalog = TemplateCatalog::standard();

        let keys = [
            CouponTemplateKey::Welcome,
            CouponTemplateKey::FirstOrder,
            CouponTemplateKey::Reactivation,
            CouponTemplateKey::Birthday,
            CouponTemplateKey::Launch,
        ];

        for key in keys {
            let template = catalog.get(key).expect("template missing from catalog");
            assert_eq!(template.key, key);
        }
    }

    #[test]
    fn test_welcome_template_values() {
        let catalog = TemplateCatalog::standard();
        let welcome = catalog.get(CouponTemplateKey::Welcome).unwrap();

        assert_eq!(welcome.discount_type, DiscountType::Percentage);
        assert_eq!(welcome.discount_value, dec!(10));
        assert_eq!(welcome.minimum_purchase, Some(dec!(2000)));
        assert_eq!(welcome.validity_months, 1);
    }

    #[test]
    fn test_first_order_is_fixed_amount() {
        let catalog = TemplateCatalog::standard();
        let first = catalog.get(CouponTemplateKey::FirstOrder).unwrap();

        assert_eq!(first.discount_type, DiscountType::Fixed);
        assert_eq!(first.discount_value, dec!(1000));
        assert_eq!(first.minimum_purchase, Some(dec!(5000)));
        assert_eq!(first.validity_months, 2);
    }

    #[test]
    fn test_birthday_has_no_minimum() {
        let catalog = TemplateCatalog::standard();
        let birthday = catalog.get(CouponTemplateKey::Birthday).unwrap();

        assert_eq!(birthday.minimum_purchase, None);
        assert_eq!(birthday.discount_value, dec!(15));
    }
}
