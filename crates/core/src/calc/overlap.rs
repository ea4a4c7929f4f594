//! Portfolio overlap between two or three mutual funds.
//!
//! Holdings are matched by stock name (trimmed, case-insensitive). The overlap
//! of a pair is the sum over common stocks of the smaller of the two
//! allocations, so it reads as "percent of either portfolio that is the same
//! money".

use crate::catalog::FundCatalog;
use crate::domain::error::ensure_valid;
use crate::domain::fund::{stock_key, MutualFund};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const MIN_FUNDS: usize = 2;
pub const MAX_FUNDS: usize = 3;

const MODERATE_THRESHOLD: f64 = 25.0;
const HIGH_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapLevel {
    Low,
    Moderate,
    High,
}

impl OverlapLevel {
    pub fn from_percent(pct: f64) -> Self {
        if pct >= HIGH_THRESHOLD {
            Self::High
        } else if pct >= MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairOverlap {
    pub fund_a: String,
    pub fund_b: String,
    pub overlap_pct: f64,
    pub common_stocks: usize,
    pub level: OverlapLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonHolding {
    pub name: String,
    pub sector: String,
    /// Allocation in each selected fund that holds the stock, keyed by fund id.
    pub allocations: BTreeMap<String, f64>,
    pub fund_count: usize,
    /// Smallest allocation across the funds holding the stock.
    pub overlap_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorOverlap {
    pub sector: String,
    pub stocks: usize,
    pub overlap_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapReport {
    pub fund_ids: Vec<String>,
    pub pairs: Vec<PairOverlap>,
    pub average_overlap_pct: f64,
    pub common_holdings: Vec<CommonHolding>,
    pub sectors: Vec<SectorOverlap>,
}

/// Overlap percentage between two funds, in [0, 100].
pub fn pair_overlap(a: &MutualFund, b: &MutualFund) -> (f64, usize) {
    let b_by_key: HashMap<String, f64> = b
        .holdings
        .iter()
        .map(|h| (stock_key(&h.name), h.allocation))
        .collect();

    let mut sum = 0.0;
    let mut common = 0;
    for h in &a.holdings {
        if let Some(other) = b_by_key.get(&stock_key(&h.name)) {
            sum += h.allocation.min(*other);
            common += 1;
        }
    }

    (sum.clamp(0.0, 100.0), common)
}

pub fn analyze(catalog: &FundCatalog, fund_ids: &[String]) -> anyhow::Result<OverlapReport> {
    ensure_valid!(
        (MIN_FUNDS..=MAX_FUNDS).contains(&fund_ids.len()),
        "fund_ids",
        "select {MIN_FUNDS} or {MAX_FUNDS} funds (got {})",
        fund_ids.len()
    );

    let mut seen = BTreeSet::new();
    let mut funds = Vec::with_capacity(fund_ids.len());
    for id in fund_ids {
        let fund = catalog.require(id)?;
        ensure_valid!(
            seen.insert(fund.id.as_str()),
            "fund_ids",
            "fund {} selected more than once",
            fund.id
        );
        funds.push(fund);
    }

    let report = analyze_funds(&funds);
    tracing::debug!(
        funds = ?report.fund_ids,
        average_overlap_pct = report.average_overlap_pct,
        common_holdings = report.common_holdings.len(),
        "computed portfolio overlap"
    );
    Ok(report)
}

fn analyze_funds(funds: &[&MutualFund]) -> OverlapReport {
    let mut pairs = Vec::new();
    for i in 0..funds.len() {
        for j in (i + 1)..funds.len() {
            let (overlap_pct, common_stocks) = pair_overlap(funds[i], funds[j]);
            pairs.push(PairOverlap {
                fund_a: funds[i].id.clone(),
                fund_b: funds[j].id.clone(),
                overlap_pct,
                common_stocks,
                level: OverlapLevel::from_percent(overlap_pct),
            });
        }
    }

    let average_overlap_pct = if pairs.is_empty() {
        0.0
    } else {
        pairs.iter().map(|p| p.overlap_pct).sum::<f64>() / pairs.len() as f64
    };

    let common_holdings = common_holdings(funds);
    let sectors = sector_summary(&common_holdings);

    OverlapReport {
        fund_ids: funds.iter().map(|f| f.id.clone()).collect(),
        pairs,
        average_overlap_pct,
        common_holdings,
        sectors,
    }
}

fn common_holdings(funds: &[&MutualFund]) -> Vec<CommonHolding> {
    // Keyed by normalized stock name; first fund to list the stock names it.
    let mut merged: Vec<(String, CommonHolding)> = Vec::new();
    for fund in funds {
        for h in &fund.holdings {
            let key = stock_key(&h.name);
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some((_, entry)) => {
                    entry.allocations.insert(fund.id.clone(), h.allocation);
                }
                None => {
                    let mut allocations = BTreeMap::new();
                    allocations.insert(fund.id.clone(), h.allocation);
                    merged.push((
                        key,
                        CommonHolding {
                            name: h.name.clone(),
                            sector: h.sector.clone(),
                            allocations,
                            fund_count: 0,
                            overlap_weight: 0.0,
                        },
                    ));
                }
            }
        }
    }

    let mut out: Vec<CommonHolding> = merged
        .into_iter()
        .map(|(_, mut entry)| {
            entry.fund_count = entry.allocations.len();
            entry.overlap_weight = entry
                .allocations
                .values()
                .copied()
                .fold(f64::INFINITY, f64::min);
            entry
        })
        .filter(|entry| entry.fund_count >= 2)
        .collect();

    out.sort_by(|a, b| {
        b.fund_count
            .cmp(&a.fund_count)
            .then_with(|| {
                b.overlap_weight
                    .partial_cmp(&a.overlap_weight)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

fn sector_summary(common: &[CommonHolding]) -> Vec<SectorOverlap> {
    let mut by_sector: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for h in common {
        let entry = by_sector.entry(h.sector.as_str()).or_default();
        entry.0 += 1;
        entry.1 += h.overlap_weight;
    }

    let mut out: Vec<SectorOverlap> = by_sector
        .into_iter()
        .map(|(sector, (stocks, overlap_weight))| SectorOverlap {
            sector: sector.to_string(),
            stocks,
            overlap_weight,
        })
        .collect();
    out.sort_by(|a, b| {
        b.overlap_weight
            .partial_cmp(&a.overlap_weight)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.sector.cmp(&b.sector))
    });
    out
}
