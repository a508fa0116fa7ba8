//! Read-through cache over the loan product catalog and member directory.
//!
//! Lookups are keyed by query identity: two reads with the same filters share
//! one cache entry, and entries older than the configured time-to-live are
//! fetched again. Filtering happens client-side on the full product list,
//! which is itself cached under the unfiltered key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use sacco_api::LoanPortalApi;
use sacco_types::{ApplicantType, LoanProduct, Member};
use tracing::{debug, info};

use crate::WorkflowError;

const MEMBERS_KEY: &str = "members";

/// Filters applied to the loan product catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    pub active_only: bool,
    pub applicant_type: Option<ApplicantType>,
}

impl CatalogQuery {
    /// Products a new application may be started under.
    pub fn active() -> Self {
        Self {
            active_only: true,
            applicant_type: None,
        }
    }

    pub fn cache_key(&self) -> String {
        let mut key = String::from("loan-products");
        if self.active_only {
            key.push_str("?active=true");
        }
        if let Some(applicant_type) = self.applicant_type {
            key.push_str(if self.active_only { "&" } else { "?" });
            key.push_str("applicantType=");
            key.push_str(applicant_type.as_str());
        }
        key
    }

    fn matches(&self, product: &LoanProduct) -> bool {
        (!self.active_only || product.is_active)
            && self
                .applicant_type
                .is_none_or(|applicant_type| product.applicant_type == applicant_type)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    fetched_at: Instant,
    items: Vec<T>,
}

#[derive(Debug)]
struct QueryCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    time_to_live: Duration,
}

impl<T: Clone> QueryCache<T> {
    fn new(time_to_live: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            time_to_live,
        }
    }

    fn lookup_fresh(&self, key: &str) -> Option<Vec<T>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        (entry.fetched_at.elapsed() < self.time_to_live).then(|| entry.items.clone())
    }

    fn store_items(&self, key: String, items: Vec<T>) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                items,
            },
        );
    }

    fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Catalog reader shared by every editing session of a process.
#[derive(Debug)]
pub struct CatalogReader<A: ?Sized> {
    api: Arc<A>,
    products: QueryCache<LoanProduct>,
    members: QueryCache<Member>,
}

impl<A: LoanPortalApi + ?Sized> CatalogReader<A> {
    pub fn new(api: Arc<A>, time_to_live: Duration) -> Self {
        Self {
            api,
            products: QueryCache::new(time_to_live),
            members: QueryCache::new(time_to_live),
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Loan products matching `query`, served from cache when fresh.
    pub async fn loan_products(&self, query: CatalogQuery) -> Result<Vec<LoanProduct>, WorkflowError> {
        let key = query.cache_key();
        if let Some(items) = self.products.lookup_fresh(&key) {
            debug!(cache_key = %key, item_count = items.len(), "catalog cache hit");
            return Ok(items);
        }

        let unfiltered_key = CatalogQuery::default().cache_key();
        let all = match self.products.lookup_fresh(&unfiltered_key) {
            Some(items) => items,
            None => {
                debug!(cache_key = %unfiltered_key, "catalog fetch started");
                let items = self
                    .api
                    .list_loan_products()
                    .await
                    .map_err(|error| WorkflowError::remote(None, error))?;
                info!(item_count = items.len(), "loan products fetched");
                self.products.store_items(unfiltered_key.clone(), items.clone());
                items
            }
        };

        let filtered: Vec<LoanProduct> = all.into_iter().filter(|product| query.matches(product)).collect();
        if key != unfiltered_key {
            self.products.store_items(key, filtered.clone());
        }
        Ok(filtered)
    }

    /// Member records for the applicant selector, served from cache when fresh.
    pub async fn members(&self) -> Result<Vec<Member>, WorkflowError> {
        if let Some(items) = self.members.lookup_fresh(MEMBERS_KEY) {
            debug!(cache_key = MEMBERS_KEY, item_count = items.len(), "catalog cache hit");
            return Ok(items);
        }
        let items = self
            .api
            .list_members()
            .await
            .map_err(|error| WorkflowError::remote(None, error))?;
        info!(item_count = items.len(), "members fetched");
        self.members.store_items(MEMBERS_KEY.to_string(), items.clone());
        Ok(items)
    }

    /// Drop every cached lookup.
    pub fn invalidate(&self) {
        self.products.clear();
        self.members.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_reflect_query_identity() {
        assert_eq!(CatalogQuery::default().cache_key(), "loan-products");
        assert_eq!(CatalogQuery::active().cache_key(), "loan-products?active=true");
        let group = CatalogQuery {
            active_only: false,
            applicant_type: Some(ApplicantType::Group),
        };
        assert_eq!(group.cache_key(), "loan-products?applicantType=GROUP");
        let active_group = CatalogQuery {
            active_only: true,
            ..group
        };
        assert_eq!(active_group.cache_key(), "loan-products?active=true&applicantType=GROUP");
    }

    #[test]
    fn expired_entries_are_not_served() {
        let cache: QueryCache<u32> = QueryCache::new(Duration::ZERO);
        cache.store_items("k".into(), vec![1, 2]);
        assert!(cache.lookup_fresh("k").is_none());

        let cache: QueryCache<u32> = QueryCache::new(Duration::from_secs(60));
        cache.store_items("k".into(), vec![1, 2]);
        assert_eq!(cache.lookup_fresh("k"), Some(vec![1, 2]));
        cache.clear();
        assert!(cache.lookup_fresh("k").is_none());
    }
}
