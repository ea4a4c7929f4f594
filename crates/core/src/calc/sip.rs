//! Systematic Investment Plan calculator.

use crate::domain::error::ensure_valid;
use serde::{Deserialize, Serialize};

pub const MAX_MONTHLY_AMOUNT: f64 = 10_000_000.0;
pub const MAX_RETURN_PCT: f64 = 30.0;
pub const MAX_YEARS: u32 = 40;
pub const MAX_STEP_UP_PCT: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipInput {
    pub monthly_amount: f64,
    pub annual_return_pct: f64,
    pub years: u32,
    /// Yearly increase of the instalment, in percent.
    #[serde(default)]
    pub annual_step_up_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipYear {
    pub year: u32,
    pub monthly_amount: f64,
    pub invested: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipResult {
    pub invested_amount: f64,
    pub estimated_returns: f64,
    pub total_value: f64,
    pub yearly: Vec<SipYear>,
}

impl SipInput {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure_valid!(
            self.monthly_amount.is_finite()
                && self.monthly_amount > 0.0
                && self.monthly_amount <= MAX_MONTHLY_AMOUNT,
            "monthly_amount",
            "must be greater than 0 and at most {MAX_MONTHLY_AMOUNT} (got {})",
            self.monthly_amount
        );
        ensure_valid!(
            self.annual_return_pct.is_finite()
                && (0.0..=MAX_RETURN_PCT).contains(&self.annual_return_pct),
            "annual_return_pct",
            "must be between 0 and {MAX_RETURN_PCT} (got {})",
            self.annual_return_pct
        );
        ensure_valid!(
            (1..=MAX_YEARS).contains(&self.years),
            "years",
            "must be between 1 and {MAX_YEARS} (got {})",
            self.years
        );
        ensure_valid!(
            self.annual_step_up_pct.is_finite()
                && (0.0..=MAX_STEP_UP_PCT).contains(&self.annual_step_up_pct),
            "annual_step_up_pct",
            "must be between 0 and {MAX_STEP_UP_PCT} (got {})",
            self.annual_step_up_pct
        );
        Ok(())
    }
}

/// Instalments are paid at the start of each month and compound monthly.
pub fn calculate(input: &SipInput) -> anyhow::Result<SipResult> {
    input.validate()?;

    let i = input.annual_return_pct / 100.0 / 12.0;
    let step_up = 1.0 + input.annual_step_up_pct / 100.0;

    let mut instalment = input.monthly_amount;
    let mut balance = 0.0;
    let mut invested = 0.0;
    let mut yearly = Vec::with_capacity(input.years as usize);
    for year in 1..=input.years {
        for _ in 0..12 {
            balance = (balance + instalment) * (1.0 + i);
            invested += instalment;
        }
        yearly.push(SipYear {
            year,
            monthly_amount: instalment,
            invested,
            value: balance,
        });
        instalment *= step_up;
    }

    Ok(SipResult {
        invested_amount: invested,
        estimated_returns: balance - invested,
        total_value: balance,
        yearly,
    })
}

/// Closed-form future value of a level SIP (annuity due).
pub fn future_value(monthly_amount: f64, annual_return_pct: f64, months: u32) -> f64 {
    let n = f64::from(months);
    let i = annual_return_pct / 100.0 / 12.0;
    if i == 0.0 {
        return monthly_amount * n;
    }
    monthly_amount * (((1.0 + i).powf(n) - 1.0) / i) * (1.0 + i)
}
