//! Scored risk-profile questionnaire.

use crate::calc::allocation::{allocation_for, AssetAllocation, RiskCategory};
use crate::domain::error::{ensure_valid, invalid};
use crate::domain::questionnaire::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPTIONS_PER_QUESTION: u8 = 4;

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    /// Option `n` (1-based) scores `n` points.
    pub options: [&'static str; OPTIONS_PER_QUESTION as usize],
}

pub const QUESTION_COUNT: usize = 6;

pub static QUESTIONS: [Question; QUESTION_COUNT] = [
    Question {
        id: "age",
        prompt: "What is your age?",
        options: ["60 or older", "45 to 59", "30 to 44", "Under 30"],
    },
    Question {
        id: "horizon",
        prompt: "When will you need most of this money?",
        options: [
            "Within 3 years",
            "In 3 to 5 years",
            "In 5 to 10 years",
            "More than 10 years from now",
        ],
    },
    Question {
        id: "drawdown_reaction",
        prompt: "Your portfolio falls 20% in a month. What do you do?",
        options: [
            "Sell everything",
            "Sell some of it",
            "Hold and wait",
            "Invest more",
        ],
    },
    Question {
        id: "income_stability",
        prompt: "How stable is your income?",
        options: [
            "Irregular or uncertain",
            "Somewhat stable",
            "Stable",
            "Very stable with surplus savings",
        ],
    },
    Question {
        id: "experience",
        prompt: "How much investing experience do you have?",
        options: [
            "None",
            "Fixed deposits and savings only",
            "Some mutual funds",
            "Direct equities and derivatives",
        ],
    },
    Question {
        id: "objective",
        prompt: "What is your primary objective?",
        options: [
            "Protect my capital",
            "Generate regular income",
            "Balanced growth",
            "Maximise long-term growth",
        ],
    },
];

const MIN_RAW: u32 = QUESTION_COUNT as u32;
const MAX_RAW: u32 = QUESTION_COUNT as u32 * OPTIONS_PER_QUESTION as u32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub raw_score: u32,
    pub risk_score: u8,
    pub category: RiskCategory,
    pub description: String,
    pub timeframe: Timeframe,
    pub allocation: AssetAllocation,
    pub expected_return_pct: f64,
}

/// Maps a raw questionnaire score onto the 1-10 risk scale.
pub fn risk_score(raw: u32) -> u8 {
    let raw = raw.clamp(MIN_RAW, MAX_RAW);
    let scaled = f64::from(raw - MIN_RAW) * 9.0 / f64::from(MAX_RAW - MIN_RAW);
    1 + scaled.round() as u8
}

fn timeframe_from_horizon(option: u8) -> Timeframe {
    match option {
        1 => Timeframe::Short,
        2 | 3 => Timeframe::Medium,
        _ => Timeframe::Long,
    }
}

pub fn assess(answers: &BTreeMap<String, u8>) -> anyhow::Result<RiskProfile> {
    for key in answers.keys() {
        if !QUESTIONS.iter().any(|q| q.id == key) {
            invalid!("answers", "unknown question {key:?}");
        }
    }

    let mut raw_score = 0u32;
    let mut horizon = 0u8;
    for q in &QUESTIONS {
        let Some(&option) = answers.get(q.id) else {
            invalid!("answers", "question {:?} is unanswered", q.id);
        };
        ensure_valid!(
            (1..=OPTIONS_PER_QUESTION).contains(&option),
            "answers",
            "answer to {:?} must be 1..={OPTIONS_PER_QUESTION} (got {option})",
            q.id
        );
        if q.id == "horizon" {
            horizon = option;
        }
        raw_score += u32::from(option);
    }

    let risk_score = risk_score(raw_score);
    let category = RiskCategory::from_score(risk_score);
    let timeframe = timeframe_from_horizon(horizon);
    let allocation = allocation_for(category, timeframe);

    tracing::debug!(raw_score, risk_score, ?category, ?timeframe, "assessed risk profile");

    Ok(RiskProfile {
        raw_score,
        risk_score,
        category,
        description: category.description().to_string(),
        timeframe,
        allocation,
        expected_return_pct: allocation.expected_return_pct(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;
    use proptest::prelude::*;

    fn answers(values: [u8; QUESTION_COUNT]) -> BTreeMap<String, u8> {
        QUESTIONS
            .iter()
            .zip(values)
            .map(|(q, v)| (q.id.to_string(), v))
            .collect()
    }

    #[test]
    fn score_scale_endpoints() {
        assert_eq!(risk_score(6), 1);
        assert_eq!(risk_score(24), 10);
        assert_eq!(risk_score(15), 6);
    }

    #[test]
    fn cautious_investor_is_conservative() {
        let p = assess(&answers([1, 1, 1, 2, 1, 1])).unwrap();
        assert_eq!(p.raw_score, 7);
        assert_eq!(p.risk_score, 2);
        assert_eq!(p.category, RiskCategory::Conservative);
        assert_eq!(p.timeframe, Timeframe::Short);
        assert_eq!(p.allocation, allocation_for(RiskCategory::Conservative, Timeframe::Short));
    }

    #[test]
    fn young_long_horizon_investor_is_aggressive() {
        let p = assess(&answers([4, 4, 4, 3, 3, 4])).unwrap();
        assert_eq!(p.raw_score, 22);
        assert_eq!(p.risk_score, 9);
        assert_eq!(p.category, RiskCategory::Aggressive);
        assert_eq!(p.timeframe, Timeframe::Long);
        assert_eq!(p.allocation.total(), 100);
    }

    #[test]
    fn middle_answers_are_moderate_medium() {
        let p = assess(&answers([3, 2, 3, 3, 2, 3])).unwrap();
        assert_eq!(p.category, RiskCategory::Moderate);
        assert_eq!(p.timeframe, Timeframe::Medium);
    }

    #[test]
    fn rejects_missing_unknown_and_out_of_range_answers() {
        let mut missing = answers([2; 6]);
        missing.remove("experience");
        let mut unknown = answers([2; 6]);
        unknown.insert("favourite_colour".to_string(), 1);
        let out_of_range = answers([2, 2, 5, 2, 2, 2]);
        let zero = answers([0, 2, 2, 2, 2, 2]);

        for bad in [missing, unknown, out_of_range, zero] {
            let err = assess(&bad).unwrap_err();
            assert_eq!(err.downcast_ref::<ValidationError>().unwrap().field, "answers");
        }
    }

    proptest! {
        #[test]
        fn any_valid_answer_set_scores_within_scale(values in prop::array::uniform6(1u8..=4)) {
            let p = assess(&answers(values)).unwrap();
            prop_assert!((1..=10).contains(&p.risk_score));
            prop_assert_eq!(p.allocation.total(), 100);
        }
    }
}
