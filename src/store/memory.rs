//! Volatile in-process backend.
//!
//! Same contract as the file backend, nothing survives a restart. Each
//! collection sits behind its own `RwLock`; a write holds the lock for the
//! whole mutation. Cross-collection operations lock `businesses` first.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RecordStore, ScanRetention, StoreError};
use crate::models::business::{Business, BusinessId};
use crate::models::review::ReviewCatalog;
use crate::models::scan::ScanEvent;

#[derive(Default)]
pub struct MemoryStore {
    businesses: RwLock<Vec<Business>>,
    scans: RwLock<Vec<ScanEvent>>,
    reviews: RwLock<ReviewCatalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reviews(reviews: ReviewCatalog) -> Self {
        Self {
            reviews: RwLock::new(reviews),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_businesses(&self) -> Result<Vec<Business>, StoreError> {
        Ok(self.businesses.read().await.clone())
    }

    async fn get_business(&self, id: &BusinessId) -> Result<Option<Business>, StoreError> {
        Ok(self
            .businesses
            .read()
            .await
            .iter()
            .find(|b| &b.id == id)
            .cloned())
    }

    async fn put_business(&self, business: Business) -> Result<(), StoreError> {
        let mut all = self.businesses.write().await;
        match all.iter_mut().find(|b| b.id == business.id) {
            Some(existing) => *existing = business,
            None => all.push(business),
        }
        Ok(())
    }

    async fn delete_business(
        &self,
        id: &BusinessId,
        retention: ScanRetention,
    ) -> Result<bool, StoreError> {
        let mut all = self.businesses.write().await;
        let before = all.len();
        all.retain(|b| &b.id != id);

        if retention == ScanRetention::Purge {
            self.scans.write().await.retain(|s| &s.business_id != id);
        }
        Ok(all.len() != before)
    }

    async fn record_scan(&self, scan: ScanEvent) -> Result<Option<Business>, StoreError> {
        let businesses = self.businesses.read().await;
        let Some(business) = businesses.iter().find(|b| b.id == scan.business_id).cloned() else {
            return Ok(None);
        };

        self.scans.write().await.push(scan);
        Ok(Some(business))
    }

    async fn list_scans(
        &self,
        business_id: Option<&BusinessId>,
    ) -> Result<Vec<ScanEvent>, StoreError> {
        let scans = self.scans.read().await;
        Ok(match business_id {
            Some(id) => scans.iter().filter(|s| &s.business_id == id).cloned().collect(),
            None => scans.clone(),
        })
    }

    async fn review_catalog(&self) -> Result<ReviewCatalog, StoreError> {
        Ok(self.reviews.read().await.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::scan::ScanTimestamp;

    fn business(id: &str) -> Business {
        Business {
            id: BusinessId::from(id),
            name: id.to_string(),
            category: "general".to_string(),
            owner_email: "owner@example.com".to_string(),
            external_review_url: "https://example.com/review".to_string(),
            status: "active".to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_merged() {
        let store = Arc::new(MemoryStore::new());
        for id in ["even", "odd"] {
            store.put_business(business(id)).await.unwrap();
        }
        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = if i % 2 == 0 { "even" } else { "odd" };
                tokio::spawn(async move {
                    store
                        .record_scan(ScanEvent::new(BusinessId::from(id), ScanTimestamp::now()))
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        assert_eq!(store.list_scans(None).await.unwrap().len(), 100);
        assert_eq!(
            store
                .list_scans(Some(&BusinessId::from("even")))
                .await
                .unwrap()
                .len(),
            50
        );
    }

    #[tokio::test]
    async fn purge_delete_drops_scans_with_the_record() {
        let store = MemoryStore::new();
        store.put_business(business("a")).await.unwrap();
        store.put_business(business("b")).await.unwrap();
        for id in ["a", "b", "a"] {
            store
                .record_scan(ScanEvent::new(BusinessId::from(id), ScanTimestamp::now()))
                .await
                .unwrap();
        }

        assert!(
            store
                .delete_business(&BusinessId::from("a"), ScanRetention::Purge)
                .await
                .unwrap()
        );
        let left = store.list_scans(None).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].business_id, BusinessId::from("b"));
        assert!(
            store
                .record_scan(ScanEvent::new(BusinessId::from("a"), ScanTimestamp::now()))
                .await
                .unwrap()
                .is_none()
        );
    }
}
