use serde::{Deserialize, Serialize};

/// The two kinds of paid placement a plan grants slots for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    Featured,
    HotDeal,
}

impl PromotionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionKind::Featured => "featured",
            PromotionKind::HotDeal => "hot_deal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromotionKind::Featured => "featured product",
            PromotionKind::HotDeal => "hot deal",
        }
    }
}

impl std::fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
