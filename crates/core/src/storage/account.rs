use crate::domain::account::{
    normalize_email, normalize_name, validate_password, SubscriptionTier, User, UserSettings,
};
use crate::domain::error::{ensure_valid, ConflictError, NotFoundError};
use crate::storage::{KeyValueStore, SETTINGS_KEY, USER_KEY};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Account screens over a [`KeyValueStore`].
///
/// There is no credential check anywhere: whoever can write the store is the
/// user. Passwords are validated for shape and then dropped.
///
/// Every write holds `write_lock` from the read through to the store call, so
/// clones of one service never interleave a read-modify-write.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl AccountService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> anyhow::Result<User> {
        let name = normalize_name(name)?;
        let email = normalize_email(email)?;
        validate_password(password)?;
        ensure_valid!(
            password == confirm_password,
            "confirm_password",
            "passwords do not match"
        );

        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.current_user().await? {
            if existing.email == email {
                return Err(ConflictError {
                    detail: format!("an account for {email} already exists"),
                }
                .into());
            }
        }

        let user = User {
            id: uuid::Uuid::new_v4(),
            email,
            name,
            subscription: SubscriptionTier::Free,
            created_at: chrono::Utc::now(),
        };
        self.put(USER_KEY, &user).await?;
        tracing::info!(user_id = %user.id, "signed up");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<User> {
        let email = normalize_email(email)?;
        ensure_valid!(!password.is_empty(), "password", "is required");

        match self.current_user().await? {
            Some(user) if user.email == email => {
                tracing::info!(user_id = %user.id, "logged in");
                Ok(user)
            }
            _ => Err(NotFoundError::new("account", email).into()),
        }
    }

    pub async fn current_user(&self) -> anyhow::Result<Option<User>> {
        self.fetch(USER_KEY).await
    }

    pub async fn update_profile(&self, name: &str, email: &str) -> anyhow::Result<User> {
        let name = normalize_name(name)?;
        let email = normalize_email(email)?;
        let _guard = self.write_lock.lock().await;
        let mut user = self.require_user().await?;
        user.name = name;
        user.email = email;
        self.put(USER_KEY, &user).await?;
        tracing::info!(user_id = %user.id, "updated profile");
        Ok(user)
    }

    pub async fn change_subscription(&self, tier: SubscriptionTier) -> anyhow::Result<User> {
        let _guard = self.write_lock.lock().await;
        let mut user = self.require_user().await?;
        let previous = user.subscription;
        user.subscription = tier;
        self.put(USER_KEY, &user).await?;
        tracing::info!(user_id = %user.id, ?previous, current = ?tier, "changed subscription");
        Ok(user)
    }

    pub async fn settings(&self) -> anyhow::Result<UserSettings> {
        Ok(self.fetch(SETTINGS_KEY).await?.unwrap_or_default())
    }

    pub async fn update_settings(&self, settings: UserSettings) -> anyhow::Result<UserSettings> {
        let settings = settings.validate()?;
        let _guard = self.write_lock.lock().await;
        self.put(SETTINGS_KEY, &settings).await?;
        Ok(settings)
    }

    /// Forgets the user; settings stay behind like they do in the browser.
    pub async fn logout(&self) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(USER_KEY).await
    }

    async fn require_user(&self) -> anyhow::Result<User> {
        self.current_user()
            .await?
            .ok_or_else(|| NotFoundError::new("account", "no user is signed in").into())
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("stored value for {key} is malformed"))?;
        Ok(Some(value))
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("failed to encode value for {key}"))?;
        self.store.set(key, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;
    use crate::storage::{JsonFileStore, MemoryStore};

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn signup_then_login_round_trip() {
        let svc = service();
        let user = svc
            .signup("Asha Rao", " Asha@Example.com ", "wealth2024", "wealth2024")
            .await
            .unwrap();
        assert_eq!(user.email, "asha@example.com");
        assert_eq!(user.subscription, SubscriptionTier::Free);

        let logged_in = svc.login("ASHA@example.com", "anything").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn signup_validates_fields() {
        let svc = service();
        let cases = [
            ("A", "a@b.co", "wealth2024", "wealth2024", "name"),
            ("Asha", "not-an-email", "wealth2024", "wealth2024", "email"),
            ("Asha", "a@b.co", "short", "short", "password"),
            ("Asha", "a@b.co", "wealth2024", "wealth2025", "confirm_password"),
        ];
        for (name, email, pw, confirm, field) in cases {
            let err = svc.signup(name, email, pw, confirm).await.unwrap_err();
            assert_eq!(err.downcast_ref::<ValidationError>().unwrap().field, field);
        }
        assert!(svc.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let svc = service();
        svc.signup("Asha", "a@b.co", "wealth2024", "wealth2024")
            .await
            .unwrap();
        let err = svc
            .signup("Asha", "A@B.co", "wealth2024", "wealth2024")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ConflictError>().is_some());
    }

    #[tokio::test]
    async fn login_without_account_is_not_found() {
        let svc = service();
        let err = svc.login("a@b.co", "wealth2024").await.unwrap_err();
        assert!(err.downcast_ref::<NotFoundError>().is_some());
    }

    #[tokio::test]
    async fn profile_and_subscription_require_user() {
        let svc = service();
        assert!(svc.update_profile("Asha", "a@b.co").await.is_err());
        assert!(svc.change_subscription(SubscriptionTier::Pro).await.is_err());

        svc.signup("Asha", "a@b.co", "wealth2024", "wealth2024")
            .await
            .unwrap();
        let user = svc.update_profile("Asha R", "asha@b.co").await.unwrap();
        assert_eq!(user.name, "Asha R");
        let user = svc.change_subscription(SubscriptionTier::Premium).await.unwrap();
        assert_eq!(user.subscription, SubscriptionTier::Premium);
        assert_eq!(user.email, "asha@b.co");
    }

    #[tokio::test]
    async fn settings_default_and_survive_logout() {
        let svc = service();
        assert_eq!(svc.settings().await.unwrap(), UserSettings::default());

        let updated = svc
            .update_settings(UserSettings {
                newsletter: false,
                currency: "usd".to_string(),
                ..UserSettings::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.currency, "USD");

        svc.signup("Asha", "a@b.co", "wealth2024", "wealth2024")
            .await
            .unwrap();
        svc.logout().await.unwrap();
        assert!(svc.current_user().await.unwrap().is_none());
        assert!(!svc.settings().await.unwrap().newsletter);
    }

    #[tokio::test]
    async fn file_backed_store_uses_local_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        let svc = AccountService::new(Arc::new(JsonFileStore::new(&path)));
        svc.signup("Asha", "a@b.co", "wealth2024", "wealth2024")
            .await
            .unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let user: User = serde_json::from_str(doc[USER_KEY].as_str().unwrap()).unwrap();
        assert_eq!(user.email, "a@b.co");
        assert!(!doc.to_string().contains("wealth2024"));
    }

    /// Yields on every call so joined futures interleave between read and write.
    struct YieldingStore(MemoryStore);

    #[async_trait::async_trait]
    impl KeyValueStore for YieldingStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            tokio::task::yield_now().await;
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            self.0.set(key, value).await
        }

        async fn remove(&self, key: &str) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            self.0.remove(key).await
        }
    }

    fn yielding_service() -> AccountService {
        AccountService::new(Arc::new(YieldingStore(MemoryStore::new())))
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let svc = yielding_service();
        svc.signup("Asha", "a@b.co", "wealth2024", "wealth2024")
            .await
            .unwrap();

        let (sub, profile) = tokio::join!(
            svc.change_subscription(SubscriptionTier::Premium),
            svc.update_profile("Asha Renamed", "a@b.co"),
        );
        sub.unwrap();
        profile.unwrap();

        let user = svc.current_user().await.unwrap().unwrap();
        assert_eq!(user.name, "Asha Renamed");
        assert_eq!(user.subscription, SubscriptionTier::Premium);
    }

    #[tokio::test]
    async fn concurrent_duplicate_signups_conflict() {
        let svc = yielding_service();
        let other = svc.clone();
        let (a, b) = tokio::join!(
            svc.signup("Asha", "a@b.co", "wealth2024", "wealth2024"),
            other.signup("Asha", "a@b.co", "wealth2024", "wealth2024"),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert!(err.downcast_ref::<ConflictError>().is_some());
    }

    #[tokio::test]
    async fn malformed_stored_user_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{not json".to_string()).await.unwrap();
        let svc = AccountService::new(store);
        assert!(svc.current_user().await.is_err());
    }
}
