use crate::domain::error::{ensure_valid, invalid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MIN_RISK_TOLERANCE: u8 = 1;
pub const MAX_RISK_TOLERANCE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Short,
    Medium,
    Long,
}

impl Timeframe {
    /// Projection horizon used for this timeframe.
    pub fn horizon_years(self) -> u32 {
        match self {
            Self::Short => 3,
            Self::Medium => 7,
            Self::Long => 15,
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => invalid!("timeframe", "expected short, medium or long (got {other:?})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentGoal {
    Retirement,
    WealthCreation,
    ChildEducation,
    HomePurchase,
    EmergencyFund,
    TaxSaving,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentPreferences {
    pub esg_focus: bool,
    pub tax_saving: bool,
    pub liquidity_needs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireResult {
    pub risk_tolerance: u8,
    pub timeframe: Timeframe,
    pub goals: Vec<InvestmentGoal>,
    pub initial_investment: f64,
    pub monthly_contribution: f64,
    #[serde(default)]
    pub preferences: InvestmentPreferences,
}

impl QuestionnaireResult {
    /// Schema checks applied to every submission; duplicate goals are collapsed.
    pub fn validate(mut self) -> anyhow::Result<Self> {
        validate_risk_tolerance(self.risk_tolerance)?;
        ensure_valid!(!self.goals.is_empty(), "goals", "select at least one goal");
        validate_amount("initial_investment", self.initial_investment)?;
        validate_amount("monthly_contribution", self.monthly_contribution)?;

        let mut seen = BTreeSet::new();
        self.goals.retain(|g| seen.insert(*g));
        Ok(self)
    }

    pub fn has_goal(&self, goal: InvestmentGoal) -> bool {
        self.goals.contains(&goal)
    }
}

pub fn validate_risk_tolerance(risk_tolerance: u8) -> anyhow::Result<()> {
    ensure_valid!(
        (MIN_RISK_TOLERANCE..=MAX_RISK_TOLERANCE).contains(&risk_tolerance),
        "risk_tolerance",
        "must be between {MIN_RISK_TOLERANCE} and {MAX_RISK_TOLERANCE} (got {risk_tolerance})"
    );
    Ok(())
}

pub(crate) fn validate_amount(field: &'static str, value: f64) -> anyhow::Result<()> {
    ensure_valid!(value.is_finite(), field, "must be a finite number");
    ensure_valid!(value >= 0.0, field, "must not be negative (got {value})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;
    use serde_json::json;

    fn submission() -> serde_json::Value {
        json!({
            "risk_tolerance": 6,
            "timeframe": "long",
            "goals": ["retirement", "tax_saving", "retirement"],
            "initial_investment": 100000.0,
            "monthly_contribution": 10000.0,
        })
    }

    #[test]
    fn accepts_submission_and_dedupes_goals() {
        let q: QuestionnaireResult = serde_json::from_value(submission()).unwrap();
        let q = q.validate().unwrap();
        assert_eq!(
            q.goals,
            vec![InvestmentGoal::Retirement, InvestmentGoal::TaxSaving]
        );
        assert_eq!(q.preferences, InvestmentPreferences::default());
    }

    #[test]
    fn rejects_out_of_range_risk_tolerance() {
        let mut v = submission();
        v["risk_tolerance"] = json!(11);
        let q: QuestionnaireResult = serde_json::from_value(v).unwrap();
        let err = q.validate().unwrap_err();
        let v = err.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(v.field, "risk_tolerance");
    }

    #[test]
    fn rejects_empty_goals_and_negative_amounts() {
        let mut v = submission();
        v["goals"] = json!([]);
        let q: QuestionnaireResult = serde_json::from_value(v).unwrap();
        assert!(q.validate().is_err());

        let mut v = submission();
        v["monthly_contribution"] = json!(-1.0);
        let q: QuestionnaireResult = serde_json::from_value(v).unwrap();
        let err = q.validate().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>().unwrap().field,
            "monthly_contribution"
        );
    }

    #[test]
    fn parses_timeframe_case_insensitively() {
        assert_eq!("Medium".parse::<Timeframe>().unwrap(), Timeframe::Medium);
        assert!("decade".parse::<Timeframe>().is_err());
    }
}
