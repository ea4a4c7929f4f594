use crate::calc::allocation::{self, AllocationAdvice, Projection, RiskCategory};
use crate::catalog::FundCatalog;
use crate::domain::fund::{FundCategory, FundSummary};
use crate::domain::questionnaire::{InvestmentGoal, QuestionnaireResult};
use serde::{Deserialize, Serialize};

pub const MAX_SUGGESTED_FUNDS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub advice: AllocationAdvice,
    pub projection: Projection,
    pub guidance: Vec<String>,
    pub suggested_funds: Vec<FundSummary>,
}

pub fn recommend(
    catalog: &FundCatalog,
    questionnaire: QuestionnaireResult,
) -> anyhow::Result<Recommendation> {
    let q = questionnaire.validate()?;
    let advice = allocation::recommend(q.risk_tolerance, q.timeframe)?;
    let projection = allocation::project(
        q.initial_investment,
        q.monthly_contribution,
        advice.expected_return_pct,
        q.timeframe.horizon_years(),
    )?;

    let guidance = guidance(&advice, &q);
    let suggested_funds = suggest_funds(catalog, advice.category, q.preferences.tax_saving);

    tracing::info!(
        risk_tolerance = q.risk_tolerance,
        category = ?advice.category,
        timeframe = ?q.timeframe,
        final_value = projection.final_value,
        "built investment recommendation"
    );

    Ok(Recommendation {
        advice,
        projection,
        guidance,
        suggested_funds,
    })
}

fn guidance(advice: &AllocationAdvice, q: &QuestionnaireResult) -> Vec<String> {
    let mut out = Vec::new();
    for (class, pct) in advice.allocation.shares() {
        if pct == 0 {
            continue;
        }
        let line = match class {
            "equity" => format!("Put {pct}% in diversified equity funds for long-term growth."),
            "debt" => format!("Keep {pct}% in debt funds to cushion equity volatility."),
            "gold" => format!("Hold {pct}% in gold as an inflation and crisis hedge."),
            _ => format!("Park {pct}% in liquid funds or savings for near-term needs."),
        };
        out.push(line);
    }

    if q.preferences.tax_saving || q.has_goal(InvestmentGoal::TaxSaving) {
        out.push(
            "Route part of the equity share through ELSS funds to claim Section 80C deductions."
                .to_string(),
        );
    }
    if q.preferences.esg_focus {
        out.push("Prefer funds with an ESG mandate within each asset class.".to_string());
    }
    if q.preferences.liquidity_needs {
        out.push("Keep the cash share in liquid funds you can redeem within a day.".to_string());
    }
    if q.has_goal(InvestmentGoal::EmergencyFund) {
        out.push(
            "Build an emergency reserve of six months of expenses before investing the rest."
                .to_string(),
        );
    }
    out
}

fn categories_for(category: RiskCategory) -> &'static [FundCategory] {
    match category {
        RiskCategory::Conservative => &[
            FundCategory::Hybrid,
            FundCategory::Index,
            FundCategory::LargeCap,
        ],
        RiskCategory::Moderate => &[
            FundCategory::LargeCap,
            FundCategory::FlexiCap,
            FundCategory::Hybrid,
            FundCategory::Index,
        ],
        RiskCategory::Aggressive => &[
            FundCategory::MidCap,
            FundCategory::SmallCap,
            FundCategory::FlexiCap,
            FundCategory::Sectoral,
        ],
    }
}

fn suggest_funds(
    catalog: &FundCatalog,
    category: RiskCategory,
    tax_saving: bool,
) -> Vec<FundSummary> {
    let wanted = categories_for(category);
    catalog
        .funds()
        .iter()
        .filter(|f| wanted.contains(&f.category) || (tax_saving && f.category == FundCategory::Elss))
        .take(MAX_SUGGESTED_FUNDS)
        .map(|f| f.summary())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;
    use crate::domain::questionnaire::{InvestmentPreferences, Timeframe};
    use approx::assert_relative_eq;

    fn questionnaire(risk_tolerance: u8, timeframe: Timeframe) -> QuestionnaireResult {
        QuestionnaireResult {
            risk_tolerance,
            timeframe,
            goals: vec![InvestmentGoal::WealthCreation],
            initial_investment: 50_000.0,
            monthly_contribution: 5_000.0,
            preferences: InvestmentPreferences::default(),
        }
    }

    #[test]
    fn aggressive_long_term_plan() {
        let catalog = FundCatalog::bundled().unwrap();
        let r = recommend(&catalog, questionnaire(9, Timeframe::Long)).unwrap();

        assert_eq!(r.advice.category, RiskCategory::Aggressive);
        assert_eq!(r.projection.years, 15);
        assert_eq!(r.projection.yearly.len(), 15);
        assert_relative_eq!(r.projection.total_contributed, 50_000.0 + 5_000.0 * 180.0);
        assert!(r.projection.final_value > r.projection.total_contributed);
        // Cash share is 0 for aggressive/long, so three asset-class lines.
        assert_eq!(r.guidance.len(), 3);

        let ids: Vec<_> = r.suggested_funds.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["we-flexicap", "we-midcap-opportunities", "we-smallcap-discovery"]
        );
    }

    #[test]
    fn conservative_plan_with_preferences() {
        let catalog = FundCatalog::bundled().unwrap();
        let mut q = questionnaire(2, Timeframe::Short);
        q.goals.push(InvestmentGoal::EmergencyFund);
        q.preferences = InvestmentPreferences {
            esg_focus: true,
            tax_saving: true,
            liquidity_needs: true,
        };
        let r = recommend(&catalog, q).unwrap();

        assert_eq!(r.advice.category, RiskCategory::Conservative);
        assert_eq!(r.guidance.len(), 4 + 4);
        assert!(r.guidance.iter().any(|g| g.contains("ELSS")));

        let ids: Vec<_> = r.suggested_funds.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["we-bluechip", "we-nifty50-index", "we-tax-saver"]);
    }

    #[test]
    fn invalid_questionnaire_is_rejected() {
        let catalog = FundCatalog::bundled().unwrap();
        let mut q = questionnaire(5, Timeframe::Medium);
        q.goals.clear();
        let err = recommend(&catalog, q).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }
}
