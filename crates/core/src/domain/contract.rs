use crate::catalog::FundCatalog;
use crate::domain::fund::{stock_key, FundCategory, Holding, MutualFund};
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MAX_FUNDS: usize = 30;
pub const MAX_HOLDINGS_PER_FUND: usize = 10;
const ALLOCATION_TOLERANCE: f64 = 0.01;

/// On-disk shape of a fund catalog, checked before it becomes a [`FundCatalog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub funds: Vec<CatalogFund>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFund {
    pub id: String,
    pub name: String,
    pub category: FundCategory,
    pub holdings: Vec<CatalogHolding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogHolding {
    pub name: String,
    pub allocation: f64,
    pub sector: String,
}

impl CatalogFile {
    pub fn validate_and_into_catalog(self) -> anyhow::Result<FundCatalog> {
        ensure!(!self.funds.is_empty(), "catalog must contain at least one fund");
        ensure!(
            self.funds.len() <= MAX_FUNDS,
            "catalog must contain at most {MAX_FUNDS} funds (got {})",
            self.funds.len()
        );

        let mut seen_ids = BTreeSet::<String>::new();
        let mut funds = Vec::with_capacity(self.funds.len());
        for fund in self.funds {
            funds.push(fund.validate_and_into_fund(&mut seen_ids)?);
        }

        Ok(FundCatalog::from_validated(funds))
    }
}

impl CatalogFund {
    fn validate_and_into_fund(self, seen_ids: &mut BTreeSet<String>) -> anyhow::Result<MutualFund> {
        let id = self.id.trim().to_string();
        ensure!(!id.is_empty(), "fund id must be non-empty");
        ensure!(seen_ids.insert(id.clone()), "duplicate fund id: {id}");

        let name = self.name.trim().to_string();
        ensure!(!name.is_empty(), "fund {id}: name must be non-empty");

        ensure!(
            (1..=MAX_HOLDINGS_PER_FUND).contains(&self.holdings.len()),
            "fund {id}: must have 1..={MAX_HOLDINGS_PER_FUND} holdings (got {})",
            self.holdings.len()
        );

        let mut seen_stocks = BTreeSet::<String>::new();
        let mut holdings = Vec::with_capacity(self.holdings.len());
        for h in self.holdings {
            let stock = h.name.trim().to_string();
            ensure!(!stock.is_empty(), "fund {id}: holding name must be non-empty");
            if !seen_stocks.insert(stock_key(&stock)) {
                bail!("fund {id}: stock listed twice: {stock}");
            }
            ensure!(
                h.allocation.is_finite() && h.allocation > 0.0 && h.allocation <= 100.0,
                "fund {id}: allocation for {stock} must be in (0, 100] (got {})",
                h.allocation
            );
            let sector = h.sector.trim().to_string();
            ensure!(!sector.is_empty(), "fund {id}: sector for {stock} must be non-empty");

            holdings.push(Holding {
                name: stock,
                allocation: h.allocation,
                sector,
            });
        }

        let total: f64 = holdings.iter().map(|h| h.allocation).sum();
        ensure!(
            total <= 100.0 + ALLOCATION_TOLERANCE,
            "fund {id}: holdings sum to {total:.2}%, more than 100%"
        );

        Ok(MutualFund {
            id,
            name,
            category: self.category,
            holdings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fund(id: &str, holdings: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Fund {id}"),
            "category": "large_cap",
            "holdings": holdings,
        })
    }

    fn parse(v: serde_json::Value) -> anyhow::Result<FundCatalog> {
        serde_json::from_value::<CatalogFile>(v)?.validate_and_into_catalog()
    }

    #[test]
    fn accepts_valid_catalog_and_trims_fields() {
        let catalog = parse(json!({
            "funds": [fund(" a ", json!([
                {"name": " Infosys ", "allocation": 8.5, "sector": "IT"},
                {"name": "TCS", "allocation": 6.0, "sector": " IT "},
            ]))]
        }))
        .unwrap();
        let a = catalog.get("a").unwrap();
        assert_eq!(a.holdings[0].name, "Infosys");
        assert_eq!(a.holdings[1].sector, "IT");
    }

    #[test]
    fn rejects_duplicate_fund_ids() {
        let h = json!([{"name": "TCS", "allocation": 5.0, "sector": "IT"}]);
        let res = parse(json!({"funds": [fund("a", h.clone()), fund("a", h)]}));
        assert!(res.is_err());
    }

    #[test]
    fn rejects_stock_listed_twice_ignoring_case() {
        let res = parse(json!({"funds": [fund("a", json!([
            {"name": "TCS", "allocation": 5.0, "sector": "IT"},
            {"name": "tcs ", "allocation": 5.0, "sector": "IT"},
        ]))]}));
        assert!(res.is_err());
    }

    #[test]
    fn rejects_bad_allocations() {
        for alloc in [0.0, -1.0, 100.5] {
            let res = parse(json!({"funds": [fund("a", json!([
                {"name": "TCS", "allocation": alloc, "sector": "IT"},
            ]))]}));
            assert!(res.is_err(), "allocation {alloc} should be rejected");
        }

        let res = parse(json!({"funds": [fund("a", json!([
            {"name": "TCS", "allocation": 60.0, "sector": "IT"},
            {"name": "Infosys", "allocation": 45.0, "sector": "IT"},
        ]))]}));
        assert!(res.is_err());
    }

    #[test]
    fn rejects_empty_and_oversized_catalogs() {
        assert!(parse(json!({"funds": []})).is_err());

        let h = json!([{"name": "TCS", "allocation": 5.0, "sector": "IT"}]);
        let funds: Vec<_> = (0..=MAX_FUNDS).map(|i| fund(&format!("f{i}"), h.clone())).collect();
        assert!(parse(json!({"funds": funds})).is_err());
    }

    #[test]
    fn rejects_too_many_holdings() {
        let holdings: Vec<_> = (0..=MAX_HOLDINGS_PER_FUND)
            .map(|i| json!({"name": format!("S{i}"), "allocation": 1.0, "sector": "IT"}))
            .collect();
        assert!(parse(json!({"funds": [fund("a", json!(holdings))]})).is_err());
    }
}
