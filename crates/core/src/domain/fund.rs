use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundCategory {
    LargeCap,
    MidCap,
    SmallCap,
    FlexiCap,
    Elss,
    Index,
    Hybrid,
    Sectoral,
}

impl FundCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::LargeCap => "Large Cap",
            Self::MidCap => "Mid Cap",
            Self::SmallCap => "Small Cap",
            Self::FlexiCap => "Flexi Cap",
            Self::Elss => "ELSS",
            Self::Index => "Index",
            Self::Hybrid => "Hybrid",
            Self::Sectoral => "Sectoral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    /// Percentage of the fund's assets (0-100].
    pub allocation: f64,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutualFund {
    pub id: String,
    pub name: String,
    pub category: FundCategory,
    pub holdings: Vec<Holding>,
}

impl MutualFund {
    pub fn total_allocation(&self) -> f64 {
        self.holdings.iter().map(|h| h.allocation).sum()
    }

    pub fn summary(&self) -> FundSummary {
        FundSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category,
            holdings_count: self.holdings.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundSummary {
    pub id: String,
    pub name: String,
    pub category: FundCategory,
    pub holdings_count: usize,
}

/// Key used to match the same stock across funds.
pub(crate) fn stock_key(name: &str) -> String {
    name.trim().to_lowercase()
}
