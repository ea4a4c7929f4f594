pub mod calc;
pub mod catalog;
pub mod domain;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::path::{Path, PathBuf};

    pub const DEFAULT_STORE_PATH: &str = ".wealthevolve/local_storage.json";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub fund_catalog_path: Option<PathBuf>,
        pub store_path: Option<PathBuf>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                fund_catalog_path: non_empty_var("FUND_CATALOG_PATH").map(PathBuf::from),
                store_path: non_empty_var("WEALTHEVOLVE_STORE_PATH").map(PathBuf::from),
            })
        }

        pub fn store_path(&self) -> &Path {
            self.store_path
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_STORE_PATH))
        }

        pub fn require_fund_catalog_path(&self) -> anyhow::Result<&Path> {
            self.fund_catalog_path
                .as_deref()
                .context("FUND_CATALOG_PATH is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}
