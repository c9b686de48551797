// Coupon email rendering and outbox
//
// Renders the coupon announcement email (HTML + plain text) from askama
// templates and records it in the email_outbox table. Actual delivery is
// handled by an external sender that drains the outbox.

use askama::Template;
use sqlx::PgPool;
use thiserror::Error;

/// Errors while rendering or enqueuing an email
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Template rendering error: {0}")]
    Render(#[from] askama::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Data rendered into the coupon announcement email
pub struct CouponEmail<'a> {
    pub recipient_name: &'a str,
    pub code: &'a str,
    pub description: &'a str,
    pub discount_text: &'a str,
    pub minimum_text: &'a str,
    pub expires_text: &'a str,
}

#[derive(Template)]
#[template(
    source = "<html>
  <body>
    <p>Hi {{ recipient_name }},</p>
    <p>{{ description }}: <strong>{{ discount_text }}</strong>.</p>
    <p>Use code <strong>{{ code }}</strong> at checkout. {{ minimum_text }}</p>
    <p>Your coupon expires on {{ expires_text }}.</p>
  </body>
</html>
",
    ext = "html"
)]
struct CouponEmailHtml<'a> {
    recipient_name: &'a str,
    code: &'a str,
    description: &'a str,
    discount_text: &'a str,
    minimum_text: &'a str,
    expires_text: &'a str,
}

#[derive(Template)]
#[template(
    source = "Hi {{ recipient_name }},

{{ description }}: {{ discount_text }}.

Use code {{ code }} at checkout. {{ minimum_text }}

Your coupon expires on {{ expires_text }}.
",
    ext = "txt"
)]
struct CouponEmailText<'a> {
    recipient_name: &'a str,
    code: &'a str,
    description: &'a str,
    discount_text: &'a str,
    minimum_text: &'a str,
    expires_text: &'a str,
}

/// Renders emails and records them in the outbox
#[derive(Clone)]
pub struct Mailer {
    pool: PgPool,
}

impl Mailer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Render the coupon email and enqueue it for delivery
    pub async fn queue_coupon_email(
        &self,
        user_id: i32,
        recipient: &str,
        email: CouponEmail<'_>,
    ) -> Result<(), EmailError> {
        let subject = format!("Your coupon: {}", email.description);

        let html_body = CouponEmailHtml {
            recipient_name: email.recipient_name,
            code: email.code,
            description: email.description,
            discount_text: email.discount_text,
            minimum_text: email.minimum_text,
            expires_text: email.expires_text,
        }
        .render()?;

        let text_body = CouponEmailText {
            recipient_name: email.recipient_name,
            code: email.code,
            description: email.description,
            discount_text: email.discount_text,
            minimum_text: email.minimum_text,
            expires_text: email.expires_text,
        }
        .render()?;

        sqlx::query(
            r#"
            INSERT INTO email_outbox (user_id, recipient, subject, html_body, text_body)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(recipient)
        .bind(&subject)
        .bind(&html_body)
        .bind(&text_body)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Queued coupon email '{}' for {}", subject, recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample<'a>() -> (CouponEmailHtml<'a>, CouponEmailText<'a>) {
        (
            CouponEmailHtml {
                recipient_name: "Ada",
                code: "WELCOME-A7KX9Q2M",
                description: "Welcome discount for new members",
                discount_text: "10% off",
                minimum_text: "Valid on orders of 2000 or more.",
                expires_text: "July 15, 2024",
            },
            CouponEmailText {
                recipient_name: "Ada",
                code: "WELCOME-A7KX9Q2M",
                description: "Welcome discount for new members",
                discount_text: "10% off",
                minimum_text: "Valid on orders of 2000 or more.",
                expires_text: "July 15, 2024",
            },
        )
    }

    #[test]
    fn test_html_body_contains_code_discount_and_expiry() {
        let (html, _) = sample();
        let rendered = html.render().unwrap();

        assert!(rendered.contains("WELCOME-A7KX9Q2M"));
        assert!(rendered.contains("10% off"));
        assert!(rendered.contains("July 15, 2024"));
        assert!(rendered.contains("Valid on orders of 2000 or more."));
    }

    #[test]
    fn test_text_body_contains_code_discount_and_expiry() {
        let (_, text) = sample();
        let rendered = text.render().unwrap();

        assert!(rendered.contains("WELCOME-A7KX9Q2M"));
        assert!(rendered.contains("10% off"));
        assert!(rendered.contains("July 15, 2024"));
        assert!(!rendered.contains('<'));
    }

    #[test]
    fn test_html_escapes_recipient_name() {
        let html = CouponEmailHtml {
            recipient_name: "<script>alert(1)</script>",
            code: "BDAY-XYZWVUTS",
            description: "Birthday month discount",
            discount_text: "15% off",
            minimum_text: "No minimum purchase required.",
            expires_text: "July 15, 2024",
        };

        let rendered = html.render().unwrap();
        assert!(!rendered.contains("<script>"));
    }
}
