use crate::options::{DirectoryOptions, EmptyRenamePolicy};
use async_trait::async_trait;
use portal_core::{
    Alias, AliasDirectory, CreateParams, Created, DirectoryError, DirectoryStore, Result,
};
use portal_generator::Generator;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use url::Url;

/// A concrete implementation of the [`AliasDirectory`] trait.
///
/// This service wraps a [`DirectoryStore`] and a [`Generator`] to handle:
/// - Input validation (URL syntax, alias syntax, self-renames)
/// - Alias generation when the caller supplies none
/// - Bounding every store call by `store_timeout`
///
/// Uniqueness is never pre-checked here. The store's constraint decides, and
/// its `AliasExists` is surfaced as is, except for generated aliases when
/// `generated_alias_retries` allows another draw.
#[derive(Debug)]
pub struct DirectoryService<S, G> {
    store: Arc<S>,
    generator: Arc<G>,
    options: DirectoryOptions,
}

impl<S, G> Clone for DirectoryService<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            options: self.options.clone(),
        }
    }
}

impl<S: DirectoryStore, G: Generator> DirectoryService<S, G> {
    /// Creates a new `DirectoryService` with default options.
    pub fn new(store: S, generator: G) -> Self {
        Self::with_options(store, generator, DirectoryOptions::default())
    }

    pub fn with_options(store: S, generator: G, options: DirectoryOptions) -> Self {
        Self {
            store: Arc::new(store),
            generator: Arc::new(generator),
            options,
        }
    }

    pub fn options(&self) -> &DirectoryOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates that the URL is absolute and has a host.
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(DirectoryError::invalid_input("url must not be empty"));
        }

        let parsed = Url::parse(url)
            .map_err(|e| DirectoryError::InvalidInput(format!("invalid url '{}': {}", url, e)))?;

        if !parsed.has_host() {
            return Err(DirectoryError::InvalidInput(format!(
                "url must have a scheme and host: '{}'",
                url
            )));
        }

        Ok(())
    }

    fn generate_alias(&self) -> Alias {
        self.generator.generate(self.options.alias_length)
    }

    /// Runs a store call under `store_timeout`. Dropping the call on expiry
    /// releases its pooled connection.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.options.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.options.store_timeout.as_millis() as u64,
                    "store call timed out"
                );
                Err(DirectoryError::StoreUnavailable)
            }
        }
    }

    async fn create_generated(&self, url: &str) -> Result<Created> {
        let mut retries_left = self.options.generated_alias_retries;

        loop {
            let alias = self.generate_alias();
            match self.bounded("create", self.store.create(url, &alias)).await {
                Ok(id) => return Ok(Created { id, alias }),
                Err(DirectoryError::AliasExists(_)) if retries_left > 0 => {
                    retries_left -= 1;
                    debug!(%alias, retries_left, "generated alias collided, drawing another");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Renames `current` to a fresh alias. A draw equal to `current` counts
    /// as a collision.
    async fn rename_generated(&self, current: &Alias) -> Result<Alias> {
        let mut retries_left = self.options.generated_alias_retries;

        loop {
            let alias = self.generate_alias();
            let outcome = if alias == *current {
                Err(DirectoryError::AliasExists(alias.to_string()))
            } else {
                self.bounded("update", self.store.update(current, &alias))
                    .await
            };

            match outcome {
                Ok(()) => return Ok(alias),
                Err(DirectoryError::AliasExists(_)) if retries_left > 0 => {
                    retries_left -= 1;
                    debug!(%alias, retries_left, "generated alias collided, drawing another");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<S: DirectoryStore, G: Generator> AliasDirectory for DirectoryService<S, G> {
    async fn create(&self, params: CreateParams) -> Result<Created> {
        let requested = params
            .alias
            .filter(|alias| !alias.is_empty())
            .map(Alias::new)
            .transpose()?;
        Self::validate_url(&params.url)?;

        let created = match requested {
            Some(alias) => {
                let id = self
                    .bounded("create", self.store.create(&params.url, &alias))
                    .await?;
                Created { id, alias }
            }
            None => self.create_generated(&params.url).await?,
        };

        info!(alias = %created.alias, id = %created.id, "alias created");
        Ok(created)
    }

    async fn lookup(&self, alias: &str) -> Result<String> {
        let alias = Alias::reference(alias)?;
        trace!(%alias, "looking up alias");

        self.bounded("lookup", self.store.lookup(&alias)).await
    }

    async fn update(&self, current: &str, new_alias: Option<&str>) -> Result<Alias> {
        let current = Alias::reference(current)?;

        let new = match new_alias.filter(|alias| !alias.is_empty()) {
            Some(alias) => {
                let new = Alias::new(alias)?;
                if new == current {
                    return Err(DirectoryError::invalid_input(
                        "new alias must differ from the current alias",
                    ));
                }
                self.bounded("update", self.store.update(&current, &new))
                    .await?;
                new
            }
            None => match self.options.empty_rename {
                EmptyRenamePolicy::Reject => {
                    return Err(DirectoryError::invalid_input(
                        "new alias must not be empty",
                    ));
                }
                EmptyRenamePolicy::Generate => self.rename_generated(&current).await?,
            },
        };

        info!(from = %current, to = %new, "alias renamed");
        Ok(new)
    }

    async fn delete(&self, alias: &str) -> Result<()> {
        let alias = Alias::reference(alias)?;

        self.bounded("delete", self.store.delete(&alias)).await?;

        info!(%alias, "alias deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::RecordId;
    use portal_generator::{SeededRandom, ALPHABET};
    use portal_storage::SqliteStore;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Wraps a store and counts how many calls reach it.
    struct CountingStore<S> {
        inner: S,
        calls: AtomicUsize,
    }

    impl<S> CountingStore<S> {
        fn new(inner: S) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<S: DirectoryStore> DirectoryStore for CountingStore<S> {
        async fn create(&self, url: &str, alias: &Alias) -> Result<RecordId> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create(url, alias).await
        }

        async fn lookup(&self, alias: &Alias) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(alias).await
        }

        async fn update(&self, current: &Alias, new: &Alias) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.update(current, new).await
        }

        async fn delete(&self, alias: &Alias) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(alias).await
        }
    }

    /// Never answers within any reasonable timeout.
    struct StalledStore;

    #[async_trait]
    impl DirectoryStore for StalledStore {
        async fn create(&self, _url: &str, _alias: &Alias) -> Result<RecordId> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RecordId(1))
        }

        async fn lookup(&self, _alias: &Alias) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }

        async fn update(&self, _current: &Alias, _new: &Alias) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn delete(&self, _alias: &Alias) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    /// Hands out a fixed sequence of aliases, repeating the last one.
    struct ScriptedGenerator {
        aliases: Vec<&'static str>,
        next: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(aliases: Vec<&'static str>) -> Self {
            Self {
                aliases,
                next: AtomicUsize::new(0),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        fn generate(&self, _length: NonZeroUsize) -> Alias {
            let index = self.next.fetch_add(1, Ordering::SeqCst);
            let alias = self.aliases[index.min(self.aliases.len() - 1)];
            Alias::new_unchecked(alias)
        }
    }

    type TestService<G> = DirectoryService<CountingStore<SqliteStore>, G>;

    async fn service_with<G: Generator>(generator: G, options: DirectoryOptions) -> TestService<G> {
        let store = SqliteStore::in_memory().await.unwrap();
        DirectoryService::with_options(CountingStore::new(store), generator, options)
    }

    async fn test_service() -> TestService<SeededRandom> {
        service_with(SeededRandom::new(7), DirectoryOptions::default()).await
    }

    #[tokio::test]
    async fn create_with_generated_alias() {
        let service = test_service().await;

        let created = service
            .create(CreateParams::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(created.alias.as_str().len(), 6);
        assert!(created
            .alias
            .as_str()
            .bytes()
            .all(|b| ALPHABET.contains(&b)));
        assert_eq!(
            service.lookup(created.alias.as_str()).await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn empty_alias_means_generate() {
        let service = test_service().await;

        let created = service
            .create(CreateParams::new("https://example.com").with_alias(""))
            .await
            .unwrap();

        assert_eq!(created.alias.as_str().len(), 6);
    }

    #[tokio::test]
    async fn generated_alias_length_is_configurable() {
        let options = DirectoryOptions::builder()
            .alias_length(NonZeroUsize::new(10).unwrap())
            .build();
        let service = service_with(SeededRandom::new(1), options).await;

        let created = service
            .create(CreateParams::new("https://example.com"))
            .await
            .unwrap();
        assert_eq!(created.alias.as_str().len(), 10);
    }

    #[tokio::test]
    async fn create_with_custom_alias_round_trips() {
        let service = test_service().await;
        let url = "https://example.com/some/path?x=1&y=%C3%BC";

        let created = service
            .create(CreateParams::new(url).with_alias("abc"))
            .await
            .unwrap();

        assert_eq!(created.alias.as_str(), "abc");
        assert_eq!(service.lookup("abc").await.unwrap(), url);
    }

    #[tokio::test]
    async fn create_with_duplicate_alias_fails() {
        let service = test_service().await;

        service
            .create(CreateParams::new("https://example1.com").with_alias("my-alias"))
            .await
            .unwrap();
        let err = service
            .create(CreateParams::new("https://example2.com").with_alias("my-alias"))
            .await
            .unwrap_err();

        assert_eq!(err, DirectoryError::AliasExists("my-alias".into()));
    }

    #[tokio::test]
    async fn create_with_invalid_url_writes_nothing() {
        let service = test_service().await;

        let err = service
            .create(CreateParams::new("not-a-url").with_alias("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
        assert_eq!(
            service.lookup("x").await.unwrap_err(),
            DirectoryError::UrlNotFound("x".into())
        );
    }

    #[tokio::test]
    async fn create_rejects_urls_without_host() {
        let service = test_service().await;

        for url in ["", "mailto:someone@example.com", "/relative/path", "https://"] {
            let err = service
                .create(CreateParams::new(url).with_alias("x"))
                .await
                .unwrap_err();
            assert!(matches!(err, DirectoryError::InvalidInput(_)), "{url}");
        }
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn create_rejects_malformed_custom_alias() {
        let service = test_service().await;

        let err = service
            .create(CreateParams::new("https://example.com").with_alias("has space"))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn generated_collision_is_surfaced_by_default() {
        let service = service_with(
            ScriptedGenerator::new(vec!["TAKEN1", "FRESH1"]),
            DirectoryOptions::default(),
        )
        .await;
        service
            .create(CreateParams::new("https://first.example").with_alias("TAKEN1"))
            .await
            .unwrap();

        let err = service
            .create(CreateParams::new("https://second.example"))
            .await
            .unwrap_err();

        assert_eq!(err, DirectoryError::AliasExists("TAKEN1".into()));
    }

    #[tokio::test]
    async fn generated_collision_retries_when_enabled() {
        let options = DirectoryOptions::builder()
            .generated_alias_retries(2)
            .build();
        let service = service_with(
            ScriptedGenerator::new(vec!["TAKEN1", "TAKEN1", "FRESH1"]),
            options,
        )
        .await;
        service
            .create(CreateParams::new("https://first.example").with_alias("TAKEN1"))
            .await
            .unwrap();

        let created = service
            .create(CreateParams::new("https://second.example"))
            .await
            .unwrap();

        assert_eq!(created.alias.as_str(), "FRESH1");
    }

    #[tokio::test]
    async fn generated_collision_gives_up_after_retries() {
        let options = DirectoryOptions::builder()
            .generated_alias_retries(1)
            .build();
        let service =
            service_with(ScriptedGenerator::new(vec!["TAKEN1"]), options).await;
        service
            .create(CreateParams::new("https://first.example").with_alias("TAKEN1"))
            .await
            .unwrap();
        let calls_before = service.store().calls();

        let err = service
            .create(CreateParams::new("https://second.example"))
            .await
            .unwrap_err();

        assert_eq!(err, DirectoryError::AliasExists("TAKEN1".into()));
        assert_eq!(service.store().calls() - calls_before, 2);
    }

    #[tokio::test]
    async fn custom_alias_collision_is_never_retried() {
        let options = DirectoryOptions::builder()
            .generated_alias_retries(5)
            .build();
        let service = service_with(SeededRandom::new(3), options).await;
        service
            .create(CreateParams::new("https://first.example").with_alias("mine"))
            .await
            .unwrap();
        let calls_before = service.store().calls();

        let err = service
            .create(CreateParams::new("https://second.example").with_alias("mine"))
            .await
            .unwrap_err();

        assert_eq!(err, DirectoryError::AliasExists("mine".into()));
        assert_eq!(service.store().calls() - calls_before, 1);
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_alias_have_one_winner() {
        let service = Arc::new(test_service().await);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .create(
                            CreateParams::new(format!("https://example.com/{i}"))
                                .with_alias("race"),
                        )
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => wins += 1,
                Err(err) => assert_eq!(err, DirectoryError::AliasExists("race".into())),
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn lookup_empty_alias_is_rejected_before_store() {
        let service = test_service().await;

        let err = service.lookup("").await.unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn lookup_unknown_alias_is_url_not_found() {
        let service = test_service().await;

        let err = service.lookup("nope").await.unwrap_err();
        assert_eq!(err, DirectoryError::UrlNotFound("nope".into()));
    }

    #[tokio::test]
    async fn update_renames_alias() {
        let service = test_service().await;
        service
            .create(CreateParams::new("https://example.com").with_alias("abc"))
            .await
            .unwrap();

        let renamed = service.update("abc", Some("xyz")).await.unwrap();

        assert_eq!(renamed.as_str(), "xyz");
        assert_eq!(
            service.lookup("abc").await.unwrap_err(),
            DirectoryError::UrlNotFound("abc".into())
        );
        assert_eq!(service.lookup("xyz").await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn update_to_same_alias_is_rejected_before_store() {
        let service = test_service().await;

        let err = service.update("same", Some("same")).await.unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn update_with_empty_current_is_rejected() {
        let service = test_service().await;

        let err = service.update("", Some("xyz")).await.unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn update_with_empty_new_alias_is_rejected_by_default() {
        let service = test_service().await;
        service
            .create(CreateParams::new("https://example.com").with_alias("abc"))
            .await
            .unwrap();
        let calls_before = service.store().calls();

        for new_alias in [None, Some("")] {
            let err = service.update("abc", new_alias).await.unwrap_err();
            assert!(matches!(err, DirectoryError::InvalidInput(_)));
        }
        assert_eq!(service.store().calls(), calls_before);
    }

    #[tokio::test]
    async fn update_with_empty_new_alias_generates_when_configured() {
        let options = DirectoryOptions::builder()
            .empty_rename(EmptyRenamePolicy::Generate)
            .build();
        let service = service_with(ScriptedGenerator::new(vec!["NEW123"]), options).await;
        service
            .create(CreateParams::new("https://example.com").with_alias("abc"))
            .await
            .unwrap();

        let renamed = service.update("abc", None).await.unwrap();

        assert_eq!(renamed.as_str(), "NEW123");
        assert_eq!(
            service.lookup("NEW123").await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn generated_rename_retries_when_enabled() {
        let options = DirectoryOptions::builder()
            .empty_rename(EmptyRenamePolicy::Generate)
            .generated_alias_retries(2)
            .build();
        let service =
            service_with(ScriptedGenerator::new(vec!["abc", "TAKEN1", "FRESH1"]), options).await;
        for alias in ["abc", "TAKEN1"] {
            service
                .create(CreateParams::new("https://example.com").with_alias(alias))
                .await
                .unwrap();
        }

        let renamed = service.update("abc", None).await.unwrap();

        assert_eq!(renamed.as_str(), "FRESH1");
        assert_eq!(
            service.lookup("TAKEN1").await.unwrap(),
            "https://example.com"
        );
        assert!(matches!(
            service.lookup("abc").await,
            Err(DirectoryError::UrlNotFound(_))
        ));
    }

    #[tokio::test]
    async fn generated_rename_collision_surfaces_without_retries() {
        let options = DirectoryOptions::builder()
            .empty_rename(EmptyRenamePolicy::Generate)
            .build();
        let service = service_with(ScriptedGenerator::new(vec!["TAKEN1", "FRESH1"]), options).await;
        for alias in ["abc", "TAKEN1"] {
            service
                .create(CreateParams::new("https://example.com").with_alias(alias))
                .await
                .unwrap();
        }

        let err = service.update("abc", None).await.unwrap_err();

        assert!(matches!(err, DirectoryError::AliasExists(_)));
        assert_eq!(
            service.lookup("abc").await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn update_propagates_store_outcomes() {
        let service = test_service().await;
        service
            .create(CreateParams::new("https://one.example").with_alias("one"))
            .await
            .unwrap();
        service
            .create(CreateParams::new("https://two.example").with_alias("two"))
            .await
            .unwrap();

        assert_eq!(
            service.update("one", Some("two")).await.unwrap_err(),
            DirectoryError::AliasExists("two".into())
        );
        assert_eq!(
            service.update("ghost", Some("three")).await.unwrap_err(),
            DirectoryError::AliasNotFound("ghost".into())
        );
    }

    #[tokio::test]
    async fn update_rejects_malformed_new_alias() {
        let service = test_service().await;

        let err = service.update("abc", Some("bad/alias")).await.unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn delete_is_final() {
        let service = test_service().await;
        service
            .create(CreateParams::new("https://example.com").with_alias("abc"))
            .await
            .unwrap();

        service.delete("abc").await.unwrap();

        assert_eq!(
            service.delete("abc").await.unwrap_err(),
            DirectoryError::AliasNotFound("abc".into())
        );
    }

    #[tokio::test]
    async fn delete_empty_alias_is_rejected_before_store() {
        let service = test_service().await;

        let err = service.delete("").await.unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn slow_store_times_out_as_unavailable() {
        let options = DirectoryOptions::builder()
            .store_timeout(Duration::from_millis(20))
            .build();
        let service = DirectoryService::with_options(StalledStore, SeededRandom::new(0), options);

        assert_eq!(
            service.lookup("abc").await.unwrap_err(),
            DirectoryError::StoreUnavailable
        );
        assert_eq!(
            service
                .create(CreateParams::new("https://example.com"))
                .await
                .unwrap_err(),
            DirectoryError::StoreUnavailable
        );
    }
}
