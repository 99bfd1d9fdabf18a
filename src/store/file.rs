//! JSON file backend.
//!
//! Each collection lives in its own file under the data directory
//! (`businesses.json`, `scans.json`, `reviews.json`). Every mutation is a
//! whole-collection read-modify-write performed under that collection's lock,
//! and the new content replaces the old file with an atomic rename so a
//! concurrent reader sees either the previous or the next version.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{RecordStore, ScanRetention, StoreError};
use crate::models::business::{Business, BusinessId};
use crate::models::review::ReviewCatalog;
use crate::models::scan::ScanEvent;

const BUSINESSES: &str = "businesses";
const SCANS: &str = "scans";
const REVIEWS: &str = "reviews";

/// Lock order: `businesses_lock` before `scans_lock`.
pub struct JsonFileStore {
    data_dir: PathBuf,
    // Shared while a scan is checked against its business, exclusive while
    // the businesses collection is rewritten.
    businesses_lock: RwLock<()>,
    scans_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// Collection files are not created here; a missing file reads as empty.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| StoreError::Io {
                collection: "data directory",
                source,
            })?;

        tracing::info!(path = %data_dir.display(), "opened json file store");

        Ok(Self {
            data_dir,
            businesses_lock: RwLock::new(()),
            scans_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }

    async fn read<T>(&self, collection: &'static str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let bytes = match tokio::fs::read(self.path_for(collection)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => return Err(StoreError::Io { collection, source }),
        };

        // A freshly touched file is empty rather than corrupt.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice(&bytes).map_err(|source| StoreError::CorruptData { collection, source })
    }

    async fn write<T>(&self, collection: &'static str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let bytes = encode(value).map_err(|e| StoreError::Io {
            collection,
            source: e.into(),
        })?;

        let path = self.path_for(collection);
        let tmp_path = path.with_extension(format!("json.tmp.{}", Uuid::new_v4().simple()));

        let result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &path).await
        }
        .await;

        if let Err(source) = result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io { collection, source });
        }

        Ok(())
    }

    /// Load, change and rewrite one collection. Caller must hold its lock.
    async fn mutate<T, R, F>(&self, collection: &'static str, change: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned + Default + Send,
        R: Send,
        F: FnOnce(&mut T) -> R + Send,
    {
        let mut value: T = self.read(collection).await?;
        let outcome = change(&mut value);
        self.write(collection, &value).await?;
        Ok(outcome)
    }
}

/// Pretty JSON with four-space indentation, matching existing data files.
fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn list_businesses(&self) -> Result<Vec<Business>, StoreError> {
        self.read(BUSINESSES).await
    }

    async fn get_business(&self, id: &BusinessId) -> Result<Option<Business>, StoreError> {
        let businesses: Vec<Business> = self.read(BUSINESSES).await?;
        Ok(businesses.into_iter().find(|b| &b.id == id))
    }

    async fn put_business(&self, business: Business) -> Result<(), StoreError> {
        let _businesses = self.businesses_lock.write().await;
        self.mutate(BUSINESSES, |all: &mut Vec<Business>| {
            match all.iter_mut().find(|b| b.id == business.id) {
                Some(existing) => *existing = business,
                None => all.push(business),
            }
        })
        .await
    }

    async fn delete_business(
        &self,
        id: &BusinessId,
        retention: ScanRetention,
    ) -> Result<bool, StoreError> {
        let _businesses = self.businesses_lock.write().await;
        let existed = self
            .mutate(BUSINESSES, |all: &mut Vec<Business>| {
                let before = all.len();
                all.retain(|b| &b.id != id);
                all.len() != before
            })
            .await?;

        if retention == ScanRetention::Purge {
            let _scans = self.scans_lock.lock().await;
            let purged = self
                .mutate(SCANS, |all: &mut Vec<ScanEvent>| {
                    let before = all.len();
                    all.retain(|s| &s.business_id != id);
                    before - all.len()
                })
                .await?;
            tracing::info!(business_id = %id, purged, "purged scan history");
        }

        Ok(existed)
    }

    async fn record_scan(&self, scan: ScanEvent) -> Result<Option<Business>, StoreError> {
        let _businesses = self.businesses_lock.read().await;
        let businesses: Vec<Business> = self.read(BUSINESSES).await?;
        let Some(business) = businesses.into_iter().find(|b| b.id == scan.business_id) else {
            return Ok(None);
        };

        let _scans = self.scans_lock.lock().await;
        self.mutate(SCANS, |all: &mut Vec<ScanEvent>| all.push(scan))
            .await?;
        Ok(Some(business))
    }

    async fn list_scans(
        &self,
        business_id: Option<&BusinessId>,
    ) -> Result<Vec<ScanEvent>, StoreError> {
        let mut scans: Vec<ScanEvent> = self.read(SCANS).await?;
        if let Some(id) = business_id {
            scans.retain(|s| &s.business_id == id);
        }
        Ok(scans)
    }

    async fn review_catalog(&self) -> Result<ReviewCatalog, StoreError> {
        self.read(REVIEWS).await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::scan::ScanTimestamp;

    fn business(id: &str, name: &str) -> Business {
        Business {
            id: BusinessId::from(id),
            name: name.to_string(),
            category: "general".to_string(),
            owner_email: "owner@example.com".to_string(),
            external_review_url: "https://example.com/review".to_string(),
            status: "active".to_string(),
        }
    }

    fn scan(id: &str, time: &str) -> ScanEvent {
        ScanEvent::new(BusinessId::from(id), ScanTimestamp::from(time))
    }

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        assert!(store.list_businesses().await.unwrap().is_empty());
        assert!(store.list_scans(None).await.unwrap().is_empty());
        assert_eq!(store.review_catalog().await.unwrap(), ReviewCatalog::default());
    }

    #[tokio::test]
    async fn corrupt_collection_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("businesses.json"), "[{not json").unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        let err = store.list_businesses().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::CorruptData {
                collection: "businesses",
                ..
            }
        ));
        // A write must not clobber the unreadable file either.
        assert!(store.put_business(business("b1", "Cafe")).await.is_err());
        // Nor may a scan be recorded against it.
        assert!(store.record_scan(scan("b1", "2024-01-01 10:00")).await.is_err());
    }

    #[tokio::test]
    async fn whitespace_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scans.json"), "\n  ").unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        assert!(store.list_scans(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collections_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        let written: Vec<Business> = (0..5)
            .map(|i| business(&format!("b{i}"), &format!("Shop {i}")))
            .collect();
        for b in &written {
            store.put_business(b.clone()).await.unwrap();
        }
        let scans = vec![
            scan("b1", "2024-01-01 10:00"),
            scan("b3", "2024-01-01 11:30"),
            scan("b1", "2024-01-02 09:15"),
        ];
        for s in &scans {
            assert!(store.record_scan(s.clone()).await.unwrap().is_some());
        }

        let reopened = JsonFileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list_businesses().await.unwrap(), written);
        assert_eq!(reopened.list_scans(None).await.unwrap(), scans);
    }

    #[tokio::test]
    async fn emptied_collections_round_trip_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store.put_business(business("a", "First")).await.unwrap();
        store.record_scan(scan("a", "2024-01-01 10:00")).await.unwrap();
        store
            .delete_business(&BusinessId::from("a"), ScanRetention::Purge)
            .await
            .unwrap();

        // Both files exist and hold empty arrays rather than being absent.
        let raw = std::fs::read_to_string(dir.path().join("businesses.json")).unwrap();
        assert_eq!(raw, "[]");
        let raw = std::fs::read_to_string(dir.path().join("scans.json")).unwrap();
        assert_eq!(raw, "[]");

        let reopened = JsonFileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list_businesses().await.unwrap(), Vec::<Business>::new());
        assert_eq!(reopened.list_scans(None).await.unwrap(), Vec::<ScanEvent>::new());
    }

    #[tokio::test]
    async fn put_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store.put_business(business("a", "First")).await.unwrap();
        store.put_business(business("b", "Second")).await.unwrap();
        store.put_business(business("a", "Renamed")).await.unwrap();

        let names: Vec<_> = store
            .list_businesses()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Renamed", "Second"]);
    }

    #[tokio::test]
    async fn delete_of_absent_business_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store.put_business(business("a", "First")).await.unwrap();

        assert!(
            !store
                .delete_business(&BusinessId::from("zz"), ScanRetention::Retain)
                .await
                .unwrap()
        );
        assert!(
            store
                .delete_business(&BusinessId::from("a"), ScanRetention::Retain)
                .await
                .unwrap()
        );
        assert!(store.get_business(&BusinessId::from("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scans_of_unknown_business_are_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        assert!(store.record_scan(scan("ghost", "2024-01-01 10:00")).await.unwrap().is_none());
        assert!(!dir.path().join("scans.json").exists());
    }

    #[tokio::test]
    async fn purge_only_touches_one_business() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store.put_business(business("a", "First")).await.unwrap();
        store.put_business(business("b", "Second")).await.unwrap();
        for id in ["a", "b", "a"] {
            store.record_scan(scan(id, "2024-01-01 10:00")).await.unwrap();
        }

        store
            .delete_business(&BusinessId::from("a"), ScanRetention::Purge)
            .await
            .unwrap();
        assert_eq!(store.list_scans(None).await.unwrap(), vec![scan("b", "2024-01-01 10:00")]);
    }

    #[tokio::test]
    async fn retained_scans_outlive_their_business() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store.put_business(business("a", "First")).await.unwrap();
        store.record_scan(scan("a", "2024-01-01 10:00")).await.unwrap();

        store
            .delete_business(&BusinessId::from("a"), ScanRetention::Retain)
            .await
            .unwrap();
        assert_eq!(store.list_scans(None).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        store.put_business(business("b1", "Cafe")).await.unwrap();

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .record_scan(ScanEvent::new(BusinessId::from("b1"), ScanTimestamp::now()))
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        let scans = store.list_scans(Some(&BusinessId::from("b1"))).await.unwrap();
        assert_eq!(scans.len(), 40);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn purge_delete_racing_scans_leaves_no_history() {
        for round in 0..30 {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
            store.put_business(business("b1", "Cafe")).await.unwrap();

            let visits: Vec<_> = (0..4)
                .map(|_| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move {
                        store
                            .record_scan(ScanEvent::new(BusinessId::from("b1"), ScanTimestamp::now()))
                            .await
                    })
                })
                .collect();
            let delete = {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .delete_business(&BusinessId::from("b1"), ScanRetention::Purge)
                        .await
                })
            };

            for visit in visits {
                visit.await.unwrap().unwrap();
            }
            assert!(delete.await.unwrap().unwrap());
            assert!(
                store.list_scans(None).await.unwrap().is_empty(),
                "scans survived purge in round {round}"
            );
        }
    }

    #[tokio::test]
    async fn writes_four_space_indented_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store.put_business(business("a", "First")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("businesses.json")).unwrap();
        assert!(raw.starts_with("[\n    {\n        \"id\": \"a\""));
    }
}
