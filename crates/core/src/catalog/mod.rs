use crate::domain::contract::CatalogFile;
use crate::domain::error::NotFoundError;
use crate::domain::fund::{FundSummary, MutualFund};
use anyhow::Context;
use std::path::Path;

const BUNDLED_CATALOG: &str = include_str!("../../data/funds.json");

/// Immutable, validated list of funds, kept in file order.
#[derive(Debug, Clone)]
pub struct FundCatalog {
    funds: Vec<MutualFund>,
}

impl FundCatalog {
    pub(crate) fn from_validated(funds: Vec<MutualFund>) -> Self {
        Self { funds }
    }

    pub fn bundled() -> anyhow::Result<Self> {
        parse_catalog(BUNDLED_CATALOG).context("bundled fund catalog is invalid")
    }

    /// Reads `path` when given, otherwise falls back to the bundled catalog.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            let catalog = Self::bundled()?;
            tracing::debug!(funds = catalog.len(), "using bundled fund catalog");
            return Ok(catalog);
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read fund catalog {}", path.display()))?;
        let catalog = parse_catalog(&text)
            .with_context(|| format!("invalid fund catalog {}", path.display()))?;
        tracing::info!(path = %path.display(), funds = catalog.len(), "loaded fund catalog");
        Ok(catalog)
    }

    pub fn funds(&self) -> &[MutualFund] {
        &self.funds
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MutualFund> {
        let id = id.trim();
        self.funds.iter().find(|f| f.id == id)
    }

    pub fn require(&self, id: &str) -> anyhow::Result<&MutualFund> {
        self.get(id)
            .ok_or_else(|| NotFoundError::new("fund", id.trim()).into())
    }

    pub fn summaries(&self) -> Vec<FundSummary> {
        self.funds.iter().map(MutualFund::summary).collect()
    }
}

pub fn parse_catalog(text: &str) -> anyhow::Result<FundCatalog> {
    let file = serde_json::from_str::<CatalogFile>(text)
        .context("fund catalog is not valid JSON for the catalog schema")?;
    file.validate_and_into_catalog()
}
