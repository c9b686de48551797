// Order Points Calculator
//
// Pure computation of loyalty points from an order's resolved line items.
// Base points are 1% of each item subtotal, truncated toward zero. Sale
// items double their base; campaign items stack an independent 5% bonus.

use crate::loyalty::error::{LoyaltyError, LoyaltyResult};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Line item resolved for points calculation
#[derive(Debug, Clone)]
pub struct PointItem {
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub on_sale: bool,
    pub campaign_id: Option<Uuid>,
}

/// Per-item share of a points calculation
#[derive(Debug, Clone)]
pub struct ItemBreakdown {
    pub product_name: String,
    pub base_points: i32,
    pub bonus_points: i32,
    pub reason: String,
}

/// Result of a points calculation over a full order
#[derive(Debug, Clone)]
pub struct PointsCalculation {
    pub base_points: i32,
    pub bonus_points: i32,
    pub total_points: i32,
    pub breakdown: Vec<ItemBreakdown>,
}

/// Order Points Calculator
///
/// Stateless; all inputs arrive as resolved line items. Zero-item orders
/// yield an all-zero result and there are no other failure modes beyond
/// Decimal-to-integer conversion.
pub struct PointsCalculator;

impl PointsCalculator {
    /// Calculate base and bonus points for an order
    ///
    /// Per item:
    /// - base = floor(unit_price * quantity * 0.01)
    /// - `on_sale` adds a bonus equal to the item's base points
    /// - a campaign adds floor(subtotal * 0.05), stacking with the sale bonus
    pub fn calculate(items: &[PointItem]) -> LoyaltyResult<PointsCalculation> {
        let base_rate = Decimal::new(1, 2); // 0.01
        let campaign_rate = Decimal::new(5, 2); // 0.05

        let mut base_points = 0i32;
        let mut bonus_points = 0i32;
        let mut breakdown = Vec::with_capacity(items.len());

        for item in items {
            let subtotal = item.unit_price * Decimal::from(item.quantity);
            let item_base = floor_points(subtotal * base_rate)?;

            let mut item_bonus = 0i32;
            let mut reasons: Vec<String> = Vec::new();

            if item.on_sale {
                item_bonus += item_base;
                reasons.push("sale item double points".to_string());
            }

            if item.campaign_id.is_some() {
                let campaign_bonus = floor_points(subtotal * campaign_rate)?;
                item_bonus += campaign_bonus;
                reasons.push("campaign 5% bonus".to_string());
            }

            base_points += item_base;
            bonus_points += item_bonus;

            breakdown.push(ItemBreakdown {
                product_name: item.product_name.clone(),
                base_points: item_base,
                bonus_points: item_bonus,
                reason: if reasons.is_empty() {
                    "base points".to_string()
                } else {
                    reasons.join(" + ")
                },
            });
        }

        Ok(PointsCalculation {
            base_points,
            bonus_points,
            total_points: base_points + bonus_points,
            breakdown,
        })
    }
}

/// Truncate a Decimal toward zero and convert to i32
fn floor_points(value: Decimal) -> LoyaltyResult<i32> {
    value
        .floor()
        .to_string()
        .parse::<i32>()
        .map_err(|e| LoyaltyError::CalculationError(format!("Failed to convert points: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(unit_price: Decimal, quantity: i32, on_sale: bool, campaign: bool) -> PointItem {
        PointItem {
            product_name: "Test product".to_string(),
            unit_price,
            quantity,
            on_sale,
            campaign_id: campaign.then(Uuid::new_v4),
        }
    }

    #[test]
    fn test_base_points_only() {
        // 1000 * 2 = 2000 subtotal, 1% = 20 points
        let calc = PointsCalculator::calculate(&[item(dec!(1000), 2, false, false)]).unwrap();

        assert_eq!(calc.base_points, 20);
        assert_eq!(calc.bonus_points, 0);
        assert_eq!(calc.total_points, 20);
        assert_eq!(calc.breakdown.len(), 1);
        assert_eq!(calc.breakdown[0].reason, "base points");
    }

    #[test]
    fn test_sale_item_doubles_base() {
        let calc = PointsCalculator::calculate(&[item(dec!(1000), 2, true, false)]).unwrap();

        assert_eq!(calc.base_points, 20);
        assert_eq!(calc.bonus_points, 20);
        assert_eq!(calc.total_points, 40);
    }

    #[test]
    fn test_campaign_bonus_stacks_on_base() {
        // subtotal 2000: base 20, campaign floor(2000 * 0.05) = 100
        let calc = PointsCalculator::calculate(&[item(dec!(1000), 2, false, true)]).unwrap();

        assert_eq!(calc.base_points, 20);
        assert_eq!(calc.bonus_points, 100);
        assert_eq!(calc.total_points, 120);
    }

    #[test]
    fn test_sale_and_campaign_stack_independently() {
        // base 20, sale bonus 20, campaign bonus 100
        let calc = PointsCalculator::calculate(&[item(dec!(1000), 2, true, true)]).unwrap();

        assert_eq!(calc.base_points, 20);
        assert_eq!(calc.bonus_points, 120);
        assert_eq!(calc.total_points, 140);
        assert_eq!(
            calc.breakdown[0].reason,
            "sale item double points + campaign 5% bonus"
        );
    }

    #[test]
    fn test_fractional_points_truncate_toward_zero() {
        // 199 * 1 = 199 subtotal, 1% = 1.99 -> 1 point (not 2)
        let calc = PointsCalculator::calculate(&[item(dec!(199), 1, false, false)]).unwrap();
        assert_eq!(calc.base_points, 1);

        // 99 subtotal -> 0.99 -> 0 points
        let calc = PointsCalculator::calculate(&[item(dec!(99), 1, false, false)]).unwrap();
        assert_eq!(calc.total_points, 0);
    }

    #[test]
    fn test_empty_order_is_all_zero() {
        let calc = PointsCalculator::calculate(&[]).unwrap();

        assert_eq!(calc.base_points, 0);
        assert_eq!(calc.bonus_points, 0);
        assert_eq!(calc.total_points, 0);
        assert!(calc.breakdown.is_empty());
    }

    #[test]
    fn test_multiple_items_sum() {
        let calc = PointsCalculator::calculate(&[
            item(dec!(1000), 2, false, false), // base 20
            item(dec!(500), 1, true, false),   // base 5, bonus 5
            item(dec!(2000), 1, false, true),  // base 20, bonus 100
        ])
        .unwrap();

        assert_eq!(calc.base_points, 45);
        assert_eq!(calc.bonus_points, 105);
        assert_eq!(calc.total_points, 150);
        assert_eq!(calc.breakdown.len(), 3);
    }
}
