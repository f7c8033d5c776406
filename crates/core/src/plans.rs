//! Subscription plan catalog.
//!
//! The payment provider only reports an amount, so the plan a payment buys
//! is inferred by matching the amount against the catalog prices.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Two prices closer than this are considered equal.
pub const PRICE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTier {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCatalog {
    pub tiers: Vec<PlanTier>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            tiers: vec![
                PlanTier {
                    id: "basic".into(),
                    name: "Basic".into(),
                    price: 29.0,
                    features: vec!["Unlimited matches".into(), "Basic filters".into()],
                },
                PlanTier {
                    id: "pro".into(),
                    name: "Pro".into(),
                    price: 79.0,
                    features: vec![
                        "Everything in Basic".into(),
                        "Advanced filters".into(),
                        "See who liked you".into(),
                    ],
                },
                PlanTier {
                    id: "premium".into(),
                    name: "Premium".into(),
                    price: 149.0,
                    features: vec![
                        "Everything in Pro".into(),
                        "Priority support".into(),
                        "Profile boost".into(),
                    ],
                },
            ],
        }
    }
}

impl PlanCatalog {
    /// Parse a catalog from JSON and check it is usable.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let catalog: PlanCatalog = serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("Invalid plan catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.tiers.is_empty() {
            return Err(CoreError::Validation(
                "Plan catalog must contain at least one tier".to_string(),
            ));
        }
        for (i, tier) in self.tiers.iter().enumerate() {
            if tier.id.trim().is_empty() {
                return Err(CoreError::Validation("Plan id must not be empty".to_string()));
            }
            if !tier.price.is_finite() || tier.price < 0.0 {
                return Err(CoreError::Validation(format!(
                    "Plan '{}' has an invalid price",
                    tier.id
                )));
            }
            if self.tiers[..i].iter().any(|t| t.id == tier.id) {
                return Err(CoreError::Validation(format!(
                    "Duplicate plan id '{}'",
                    tier.id
                )));
            }
        }
        Ok(())
    }

    /// The cheapest tier. Ties keep catalog order.
    pub fn lowest(&self) -> Option<&PlanTier> {
        self.tiers
            .iter()
            .fold(None, |best: Option<&PlanTier>, t| match best {
                Some(b) if b.price <= t.price => Some(b),
                _ => Some(t),
            })
    }

    /// Tier whose price equals `amount` within [`PRICE_EPSILON`], falling
    /// back to the lowest tier when nothing matches.
    pub fn resolve_for_amount(&self, amount: f64) -> Option<&PlanTier> {
        self.tiers
            .iter()
            .find(|t| (t.price - amount).abs() < PRICE_EPSILON)
            .or_else(|| self.lowest())
    }
}
