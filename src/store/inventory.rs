use anyhow::Result;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One selectable object reported by the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Listings of workspace objects used to populate selectors
#[async_trait::async_trait]
pub trait InventorySource: Send + Sync {
    async fn list_catalogs(&self) -> Result<Vec<InventoryItem>>;
    async fn list_schemas(&self, catalog: &str) -> Result<Vec<InventoryItem>>;
    async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<InventoryItem>>;
    async fn list_volumes(&self, catalog: &str, schema: &str) -> Result<Vec<InventoryItem>>;
    async fn list_functions(&self, catalog: &str, schema: &str) -> Result<Vec<InventoryItem>>;
    async fn list_vector_search_endpoints(&self) -> Result<Vec<InventoryItem>>;
    async fn list_warehouses(&self) -> Result<Vec<InventoryItem>>;
    async fn list_service_principals(&self) -> Result<Vec<InventoryItem>>;
}

/// The current user's items first, then case-insensitive by name.
/// Owners are matched case-insensitively.
pub fn sort_by_owner(items: Vec<InventoryItem>, current_user: Option<&str>) -> Vec<InventoryItem> {
    let current_user = current_user.map(str::to_lowercase);
    items
        .into_iter()
        .sorted_by_cached_key(|item| {
            let owner = item.owner.as_deref().map(str::to_lowercase);
            let mine = current_user.is_some() && owner == current_user;
            (!mine, item.name.to_lowercase())
        })
        .collect()
}

#[derive(Debug)]
struct Selection<K, T> {
    key: Option<K>,
    loading: bool,
    items: Vec<T>,
    error: Option<String>,
}

/// Items loaded for the current value of one selector.
///
/// `begin` records the key a load was started for. `complete` applies the
/// result only while that key is still the selected one; a slower response for
/// an earlier selection is discarded.
#[derive(Debug)]
pub struct SelectorCache<K, T> {
    state: Arc<RwLock<Selection<K, T>>>,
}

impl<K, T> Clone for SelectorCache<K, T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, T> Default for SelectorCache<K, T> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(Selection {
                key: None,
                loading: false,
                items: Vec::new(),
                error: None,
            })),
        }
    }
}

impl<K, T> SelectorCache<K, T>
where
    K: Clone + PartialEq + Debug + Send + Sync,
    T: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin(&self, key: K) {
        let mut state = self.state.write().await;
        state.key = Some(key);
        state.loading = true;
        state.items.clear();
        state.error = None;
    }

    /// Returns whether the result was applied
    pub async fn complete(&self, key: &K, result: Result<Vec<T>>) -> bool {
        let mut state = self.state.write().await;
        if state.key.as_ref() != Some(key) {
            log::debug!(
                "discarding inventory result for {:?}; selection is now {:?}",
                key,
                state.key
            );
            return false;
        }
        state.loading = false;
        match result {
            Ok(items) => state.items = items,
            Err(err) => {
                log::warn!("inventory listing for {:?} failed: {}", key, err);
                state.items.clear();
                state.error = Some(err.to_string());
            }
        }
        true
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.key = None;
        state.loading = false;
        state.items.clear();
        state.error = None;
    }

    pub async fn key(&self) -> Option<K> {
        self.state.read().await.key.clone()
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.read().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }
}

/// Cascading catalog -> schema -> table selection.
///
/// Changing an upper level clears everything below it.
pub struct CatalogBrowser<S: InventorySource> {
    source: Arc<S>,
    current_user: Option<String>,
    catalogs: SelectorCache<(), InventoryItem>,
    endpoints: SelectorCache<(), InventoryItem>,
    warehouses: SelectorCache<(), InventoryItem>,
    schemas: SelectorCache<String, InventoryItem>,
    tables: SelectorCache<(String, String), InventoryItem>,
}

impl<S: InventorySource> CatalogBrowser<S> {
    pub fn new(source: Arc<S>, current_user: Option<String>) -> Self {
        Self {
            source,
            current_user,
            catalogs: SelectorCache::new(),
            endpoints: SelectorCache::new(),
            warehouses: SelectorCache::new(),
            schemas: SelectorCache::new(),
            tables: SelectorCache::new(),
        }
    }

    fn sorted(&self, result: Result<Vec<InventoryItem>>) -> Result<Vec<InventoryItem>> {
        result.map(|items| sort_by_owner(items, self.current_user.as_deref()))
    }

    /// Load the top-level listings concurrently
    pub async fn prime(&self) {
        self.catalogs.begin(()).await;
        self.endpoints.begin(()).await;
        self.warehouses.begin(()).await;
        let (catalogs, endpoints, warehouses) = tokio::join!(
            self.source.list_catalogs(),
            self.source.list_vector_search_endpoints(),
            self.source.list_warehouses(),
        );
        self.catalogs.complete(&(), self.sorted(catalogs)).await;
        self.endpoints.complete(&(), self.sorted(endpoints)).await;
        self.warehouses.complete(&(), self.sorted(warehouses)).await;
    }

    /// Returns whether the loaded schemas were applied
    pub async fn select_catalog(&self, catalog: &str) -> bool {
        let key = catalog.to_string();
        self.schemas.begin(key.clone()).await;
        self.tables.clear().await;
        let result = self.source.list_schemas(catalog).await;
        self.schemas.complete(&key, self.sorted(result)).await
    }

    pub async fn select_schema(&self, catalog: &str, schema: &str) -> bool {
        let key = (catalog.to_string(), schema.to_string());
        self.tables.begin(key.clone()).await;
        let result = self.source.list_tables(catalog, schema).await;
        self.tables.complete(&key, self.sorted(result)).await
    }

    pub async fn catalogs(&self) -> Vec<InventoryItem> {
        self.catalogs.items().await
    }

    pub async fn endpoints(&self) -> Vec<InventoryItem> {
        self.endpoints.items().await
    }

    pub async fn warehouses(&self) -> Vec<InventoryItem> {
        self.warehouses.items().await
    }

    pub async fn schemas(&self) -> Vec<InventoryItem> {
        self.schemas.items().await
    }

    pub async fn tables(&self) -> Vec<InventoryItem> {
        self.tables.items().await
    }

    /// Uncached listings; a failed listing is empty
    pub async fn volumes(&self, catalog: &str, schema: &str) -> Vec<InventoryItem> {
        self.or_empty(self.source.list_volumes(catalog, schema).await)
    }

    pub async fn functions(&self, catalog: &str, schema: &str) -> Vec<InventoryItem> {
        self.or_empty(self.source.list_functions(catalog, schema).await)
    }

    pub async fn service_principals(&self) -> Vec<InventoryItem> {
        self.or_empty(self.source.list_service_principals().await)
    }

    fn or_empty(&self, result: Result<Vec<InventoryItem>>) -> Vec<InventoryItem> {
        self.sorted(result).unwrap_or_else(|err| {
            log::warn!("inventory listing failed: {}", err);
            Vec::new()
        })
    }

    pub async fn selected_catalog(&self) -> Option<String> {
        self.schemas.key().await
    }

    pub async fn tables_error(&self) -> Option<String> {
        self.tables.error().await
    }
}
