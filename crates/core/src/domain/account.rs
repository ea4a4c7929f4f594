use crate::domain::error::{ensure_valid, invalid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Premium,
}

impl std::str::FromStr for SubscriptionTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "premium" => Ok(Self::Premium),
            other => invalid!("subscription", "unknown tier {other:?}"),
        }
    }
}

/// The locally stored user record. Nothing here is authenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub subscription: SubscriptionTier,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub newsletter: bool,
    pub currency: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            sms_notifications: false,
            newsletter: true,
            currency: "INR".to_string(),
        }
    }
}

impl UserSettings {
    pub fn validate(mut self) -> anyhow::Result<Self> {
        let currency = self.currency.trim().to_ascii_uppercase();
        ensure_valid!(
            currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()),
            "currency",
            "expected a 3-letter currency code (got {:?})",
            self.currency
        );
        self.currency = currency;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPlan {
    pub tier: SubscriptionTier,
    pub name: &'static str,
    /// Monthly price in INR.
    pub monthly_price: u32,
    pub features: &'static [&'static str],
}

pub fn subscription_plans() -> Vec<SubscriptionPlan> {
    vec![
        SubscriptionPlan {
            tier: SubscriptionTier::Free,
            name: "Starter",
            monthly_price: 0,
            features: &["SIP calculator", "Risk profiler", "Overlap analysis for 2 funds"],
        },
        SubscriptionPlan {
            tier: SubscriptionTier::Pro,
            name: "Pro",
            monthly_price: 499,
            features: &[
                "Everything in Starter",
                "Overlap analysis for 3 funds",
                "Personalised allocation",
                "Quarterly portfolio review",
            ],
        },
        SubscriptionPlan {
            tier: SubscriptionTier::Premium,
            name: "Premium",
            monthly_price: 999,
            features: &[
                "Everything in Pro",
                "Dedicated wealth advisor",
                "Tax harvesting guidance",
                "Priority support",
            ],
        },
    ]
}

pub fn normalize_name(name: &str) -> anyhow::Result<String> {
    let name = name.trim();
    ensure_valid!(
        name.chars().count() >= 2,
        "name",
        "must be at least 2 characters"
    );
    Ok(name.to_string())
}

/// Trims and lower-cases; rejects anything that is not `local@domain.tld`.
pub fn normalize_email(email: &str) -> anyhow::Result<String> {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        invalid!("email", "missing '@'");
    };
    ensure_valid!(!local.is_empty(), "email", "missing local part");
    ensure_valid!(
        !email.chars().any(char::is_whitespace),
        "email",
        "must not contain whitespace"
    );
    ensure_valid!(
        !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.'),
        "email",
        "invalid domain {domain:?}"
    );
    Ok(email)
}

pub fn validate_password(password: &str) -> anyhow::Result<()> {
    ensure_valid!(
        password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "must be at least {MIN_PASSWORD_LEN} characters"
    );
    ensure_valid!(
        password.chars().any(|c| c.is_alphabetic()) && password.chars().any(|c| c.is_ascii_digit()),
        "password",
        "must contain a letter and a digit"
    );
    Ok(())
}
