//! Rule-based asset allocation and compound-growth projection.

use crate::calc::sip::MAX_YEARS;
use crate::domain::error::ensure_valid;
use crate::domain::questionnaire::{validate_amount, validate_risk_tolerance, Timeframe};
use serde::{Deserialize, Serialize};

pub const EQUITY_RETURN_PCT: f64 = 12.0;
pub const DEBT_RETURN_PCT: f64 = 7.0;
pub const GOLD_RETURN_PCT: f64 = 8.0;
pub const CASH_RETURN_PCT: f64 = 4.0;

const MAX_RATE_PCT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskCategory {
    /// Caller is expected to have validated the 1-10 range.
    pub fn from_score(risk_score: u8) -> Self {
        if risk_score <= 3 {
            Self::Conservative
        } else if risk_score <= 7 {
            Self::Moderate
        } else {
            Self::Aggressive
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Conservative => {
                "Capital preservation comes first; you accept lower returns for stability."
            }
            Self::Moderate => {
                "You balance growth and stability and can ride out moderate market swings."
            }
            Self::Aggressive => {
                "You seek maximum long-term growth and can tolerate large short-term losses."
            }
        }
    }
}

/// Whole-percent split across asset classes; always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub equity: u8,
    pub debt: u8,
    pub gold: u8,
    pub cash: u8,
}

impl AssetAllocation {
    const fn new(equity: u8, debt: u8, gold: u8, cash: u8) -> Self {
        Self {
            equity,
            debt,
            gold,
            cash,
        }
    }

    pub fn total(&self) -> u32 {
        u32::from(self.equity) + u32::from(self.debt) + u32::from(self.gold) + u32::from(self.cash)
    }

    /// Blended annual return (%) using the fixed per-asset-class assumptions.
    pub fn expected_return_pct(&self) -> f64 {
        (f64::from(self.equity) * EQUITY_RETURN_PCT
            + f64::from(self.debt) * DEBT_RETURN_PCT
            + f64::from(self.gold) * GOLD_RETURN_PCT
            + f64::from(self.cash) * CASH_RETURN_PCT)
            / 100.0
    }

    pub fn shares(&self) -> [(&'static str, u8); 4] {
        [
            ("equity", self.equity),
            ("debt", self.debt),
            ("gold", self.gold),
            ("cash", self.cash),
        ]
    }
}

pub fn allocation_for(category: RiskCategory, timeframe: Timeframe) -> AssetAllocation {
    use RiskCategory::*;
    use Timeframe::*;

    match (category, timeframe) {
        (Conservative, Short) => AssetAllocation::new(20, 60, 10, 10),
        (Conservative, Medium) => AssetAllocation::new(30, 50, 10, 10),
        (Conservative, Long) => AssetAllocation::new(40, 45, 10, 5),
        (Moderate, Short) => AssetAllocation::new(40, 45, 10, 5),
        (Moderate, Medium) => AssetAllocation::new(55, 30, 10, 5),
        (Moderate, Long) => AssetAllocation::new(65, 25, 5, 5),
        (Aggressive, Short) => AssetAllocation::new(60, 30, 5, 5),
        (Aggressive, Medium) => AssetAllocation::new(75, 15, 5, 5),
        (Aggressive, Long) => AssetAllocation::new(85, 10, 5, 0),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationAdvice {
    pub risk_tolerance: u8,
    pub category: RiskCategory,
    pub timeframe: Timeframe,
    pub allocation: AssetAllocation,
    pub expected_return_pct: f64,
}

pub fn recommend(risk_tolerance: u8, timeframe: Timeframe) -> anyhow::Result<AllocationAdvice> {
    validate_risk_tolerance(risk_tolerance)?;
    let category = RiskCategory::from_score(risk_tolerance);
    let allocation = allocation_for(category, timeframe);
    Ok(AllocationAdvice {
        risk_tolerance,
        category,
        timeframe,
        allocation,
        expected_return_pct: allocation.expected_return_pct(),
    })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct YearSnapshot {
    pub year: u32,
    pub contributed: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub years: u32,
    pub annual_rate_pct: f64,
    pub total_contributed: f64,
    pub final_value: f64,
    pub estimated_gains: f64,
    pub yearly: Vec<YearSnapshot>,
}

/// Month-by-month growth of an existing balance plus end-of-month contributions.
pub fn project(
    initial: f64,
    monthly_contribution: f64,
    annual_rate_pct: f64,
    years: u32,
) -> anyhow::Result<Projection> {
    validate_amount("initial_investment", initial)?;
    validate_amount("monthly_contribution", monthly_contribution)?;
    ensure_valid!(
        annual_rate_pct.is_finite() && (0.0..=MAX_RATE_PCT).contains(&annual_rate_pct),
        "annual_rate_pct",
        "must be between 0 and {MAX_RATE_PCT} (got {annual_rate_pct})"
    );
    ensure_valid!(
        years <= MAX_YEARS,
        "years",
        "must be at most {MAX_YEARS} (got {years})"
    );

    let monthly_rate = annual_rate_pct / 100.0 / 12.0;
    let mut balance = initial;
    let mut contributed = initial;
    let mut yearly = Vec::with_capacity(years as usize);
    for year in 1..=years {
        for _ in 0..12 {
            balance = balance * (1.0 + monthly_rate) + monthly_contribution;
            contributed += monthly_contribution;
        }
        yearly.push(YearSnapshot {
            year,
            contributed,
            value: balance,
        });
    }

    Ok(Projection {
        years,
        annual_rate_pct,
        total_contributed: contributed,
        final_value: balance,
        estimated_gains: balance - contributed,
        yearly,
    })
}
