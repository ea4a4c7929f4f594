//! Local key/value persistence standing in for browser local storage.

pub mod account;
pub mod file;
pub mod memory;

pub use account::AccountService;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub const USER_KEY: &str = "wealthevolve_user";
pub const SETTINGS_KEY: &str = "wealthevolve_settings";

#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
