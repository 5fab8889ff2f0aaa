use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Plan tiers known to the registry. The tier doubles as the plan slug and
/// as the `plan_type` recorded on promotion placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Basic,
    Silver,
    Gold,
    Platinum,
}

impl PlanTier {
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Basic,
        PlanTier::Silver,
        PlanTier::Gold,
        PlanTier::Platinum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "basic",
            PlanTier::Silver => "silver",
            PlanTier::Gold => "gold",
            PlanTier::Platinum => "platinum",
        }
    }

    /// Basic is the implicit plan of stores without an active subscription.
    pub fn is_free(&self) -> bool {
        matches!(self, PlanTier::Basic)
    }

    /// Seed values for the registry. Mirrors the rows inserted by the
    /// initial migration.
    pub fn defaults(&self) -> PlanDefaults {
        match self {
            PlanTier::Basic => PlanDefaults {
                name: "Basic",
                price_cents: 0,
                product_limit: 0,
                featured_slot_max: 0,
                hot_deal_max: 0,
                featured_duration_days: 3,
            },
            PlanTier::Silver => PlanDefaults {
                name: "Silver",
                price_cents: 9_900,
                product_limit: 25,
                featured_slot_max: 5,
                hot_deal_max: 3,
                featured_duration_days: 3,
            },
            PlanTier::Gold => PlanDefaults {
                name: "Gold",
                price_cents: 24_900,
                product_limit: 100,
                featured_slot_max: 10,
                hot_deal_max: 5,
                featured_duration_days: 14,
            },
            PlanTier::Platinum => PlanDefaults {
                name: "Platinum",
                price_cents: 49_900,
                product_limit: 500,
                featured_slot_max: 20,
                hot_deal_max: 10,
                featured_duration_days: 30,
            },
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(PlanTier::Basic),
            "silver" => Ok(PlanTier::Silver),
            "gold" => Ok(PlanTier::Gold),
            "platinum" => Ok(PlanTier::Platinum),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanDefaults {
    pub name: &'static str,
    pub price_cents: i64,
    pub product_limit: i32,
    pub featured_slot_max: i32,
    pub hot_deal_max: i32,
    pub featured_duration_days: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub slug: PlanTier,
    pub name: String,
    pub price_cents: i64,
    pub product_limit: i32,
    pub featured_slot_max: i32,
    pub hot_deal_max: i32,
    pub featured_duration_days: i32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn from_defaults(tier: PlanTier) -> Self {
        let d = tier.defaults();
        Self {
            id: Uuid::new_v4(),
            slug: tier,
            name: d.name.to_string(),
            price_cents: d.price_cents,
            product_limit: d.product_limit,
            featured_slot_max: d.featured_slot_max,
            hot_deal_max: d.hot_deal_max,
            featured_duration_days: d.featured_duration_days,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    pub fn featured_duration(&self) -> Duration {
        Duration::days(i64::from(self.featured_duration_days))
    }
}
