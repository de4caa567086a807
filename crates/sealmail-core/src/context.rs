//! State shared by the use case groups of one client.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::cache::{CacheKind, CacheQuery, CacheRepository, Cacheable};
use crate::common::{ListOutput, Pagination};
use crate::sealing::SealingService;
use crate::{Error, Result};

#[derive(Clone)]
pub(crate) struct Context {
    pub sealing: Arc<dyn SealingService>,
    pub cache: Option<Arc<CacheRepository>>,
    /// Serializes provisioning and deprovisioning of addresses and masks.
    pub account_lock: Arc<Mutex<()>>,
    pub default_page_limit: u32,
}

impl Context {
    pub fn sealing(&self) -> &dyn SealingService {
        self.sealing.as_ref()
    }

    pub fn page(&self, pagination: &Pagination) -> Result<Pagination> {
        pagination.resolved(self.default_page_limit)
    }

    /// Writes records to the cache. Failures are logged, not returned.
    pub async fn write_through<T: Cacheable + Sync>(&self, records: &[T]) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put_all(records).await {
                warn!(kind = T::KIND.as_str(), error = %e, "Failed to write cache");
            }
        }
    }

    /// Drops a stale record from the cache.
    pub async fn evict(&self, kind: CacheKind, id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.remove(kind, id).await {
                warn!(kind = kind.as_str(), id, error = %e, "Failed to evict cache entry");
            }
        }
    }

    /// Drops every record of `kind` under `parent_id`.
    pub async fn evict_children(&self, kind: CacheKind, parent_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.remove_by_parent(kind, parent_id).await {
                warn!(kind = kind.as_str(), parent_id, error = %e, "Failed to evict cache entries");
            }
        }
    }

    /// Drops every record of `kind` in `group_id`.
    pub async fn evict_group(&self, kind: CacheKind, group_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.remove_by_group(kind, group_id).await {
                warn!(kind = kind.as_str(), group_id, error = %e, "Failed to evict cache entries");
            }
        }
    }

    /// Reads one record from the cache; `None` when no cache is configured.
    pub async fn cached<T: Cacheable>(&self, id: &str) -> Result<Option<T>> {
        match &self.cache {
            Some(cache) => cache.get(id).await,
            None => Ok(None),
        }
    }

    /// Reads one page from the cache. The page token is the row offset.
    pub async fn cached_page<T: Cacheable>(
        &self,
        mut query: CacheQuery,
        pagination: &Pagination,
    ) -> Result<ListOutput<T>> {
        let Some(cache) = &self.cache else {
            return Ok(ListOutput::empty());
        };

        let page = self.page(pagination)?;
        let limit = page.limit.unwrap_or(self.default_page_limit);
        let offset = match page.next_token.as_deref() {
            Some(token) => token
                .parse::<u32>()
                .map_err(|_| Error::InvalidArgument(format!("invalid page token: {token}")))?,
            None => 0,
        };
        query.limit = limit;
        query.offset = offset;

        let items: Vec<T> = cache.list(&query).await?;
        let next_token = (items.len() == limit as usize).then(|| (offset + limit).to_string());
        Ok(ListOutput::new(items, next_token))
    }
}
