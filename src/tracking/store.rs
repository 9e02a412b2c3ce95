use std::{
    future::Future,
    ops::Deref,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::fs::operations::{read_if_exists, replace_file, LockFile};

use super::{
    entities::StoreDocument, error::TrackingError, ActivityKind, ActivitySample, AggregateRecord,
    GroupId, SubjectId, TrackedSubject,
};

const DOCUMENT_FILE: &str = "store.json";
const LOCK_FILE: &str = "store.lock";

type Result<T, E = TrackingError> = std::result::Result<T, E>;

/// Interface for abstracting storage of the registry and activity records.
pub trait ActivityStore {
    /// Adds a subject to the registry. Fails with [TrackingError::AlreadyTracked] if it's there.
    fn register_subject(
        &self,
        subject: SubjectId,
        group: GroupId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Removes a subject from the registry, keeping its records.
    fn unregister_soft(&self, subject: SubjectId) -> impl Future<Output = Result<()>> + Send;

    /// Removes a subject from the registry together with all of its records in a single write.
    fn delete_subject(&self, subject: SubjectId) -> impl Future<Output = Result<()>> + Send;

    fn list_tracked(&self) -> impl Future<Output = Result<Vec<TrackedSubject>>> + Send;

    fn is_tracked(&self, subject: SubjectId) -> impl Future<Output = Result<bool>> + Send;

    /// Adds one unit to a record, creating it if needed. Kind is only used on creation.
    fn increment(
        &self,
        subject: SubjectId,
        activity: &str,
        kind: ActivityKind,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Commits all samples of a tick at once. Samples of subjects that left the registry in the
    /// meantime are dropped. Returns the amount of applied samples.
    fn record_tick(
        &self,
        samples: Vec<ActivitySample>,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Returns records of a subject. Subjects without records produce an empty vector.
    fn list_records(
        &self,
        subject: SubjectId,
    ) -> impl Future<Output = Result<Vec<AggregateRecord>>> + Send;
}

impl<T: Deref> ActivityStore for T
where
    T::Target: ActivityStore,
{
    fn register_subject(
        &self,
        subject: SubjectId,
        group: GroupId,
    ) -> impl Future<Output = Result<()>> + Send {
        self.deref().register_subject(subject, group)
    }

    fn unregister_soft(&self, subject: SubjectId) -> impl Future<Output = Result<()>> + Send {
        self.deref().unregister_soft(subject)
    }

    fn delete_subject(&self, subject: SubjectId) -> impl Future<Output = Result<()>> + Send {
        self.deref().delete_subject(subject)
    }

    fn list_tracked(&self) -> impl Future<Output = Result<Vec<TrackedSubject>>> + Send {
        self.deref().list_tracked()
    }

    fn is_tracked(&self, subject: SubjectId) -> impl Future<Output = Result<bool>> + Send {
        self.deref().is_tracked(subject)
    }

    fn increment(
        &self,
        subject: SubjectId,
        activity: &str,
        kind: ActivityKind,
    ) -> impl Future<Output = Result<()>> + Send {
        self.deref().increment(subject, activity, kind)
    }

    fn record_tick(
        &self,
        samples: Vec<ActivitySample>,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize>> + Send {
        self.deref().record_tick(samples, at)
    }

    fn list_records(
        &self,
        subject: SubjectId,
    ) -> impl Future<Output = Result<Vec<AggregateRecord>>> + Send {
        self.deref().list_records(subject)
    }
}

/// The main realization of [ActivityStore]. The whole store is a single JSON document that is
/// replaced on every change. The document on disk is the only source of truth: every operation
/// reloads it, so a query process and the daemon can work with the same directory.
pub struct JsonActivityStore {
    document_path: PathBuf,
    lock: LockFile,
    /// The file lock belongs to the descriptor, so any unlock releases it for the whole process.
    /// Operations of this process take turns.
    access: Mutex<()>,
}

impl JsonActivityStore {
    /// Opens a store in the directory, creating the directory and an empty document if they
    /// don't exist yet.
    pub async fn open(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let lock = LockFile::open(&dir.join(LOCK_FILE)).await?;
        let store = Self {
            document_path: dir.join(DOCUMENT_FILE),
            lock,
            access: Mutex::new(()),
        };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        let _access = self.access.lock().await;
        self.lock.lock_exclusive()?;
        let result = self.create_if_missing().await;
        self.lock.unlock().await?;
        result
    }

    async fn create_if_missing(&self) -> Result<()> {
        if read_if_exists(&self.document_path).await?.is_none() {
            debug!("Creating store document {:?}", self.document_path);
            self.save(&StoreDocument::default()).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<StoreDocument> {
        match read_if_exists(&self.document_path).await? {
            Some(data) => Ok(serde_json::from_slice(&data).inspect_err(|e| {
                warn!("Store document {:?} is corrupted {e}", self.document_path)
            })?),
            None => Ok(StoreDocument::default()),
        }
    }

    async fn save(&self, document: &StoreDocument) -> Result<()> {
        let data = serde_json::to_vec_pretty(document)?;
        replace_file(&self.document_path, &data).await?;
        Ok(())
    }

    async fn read(&self) -> Result<StoreDocument> {
        let _access = self.access.lock().await;
        self.lock.lock_shared()?;
        let result = self.load().await;
        self.lock.unlock().await?;
        result
    }

    /// Semi-safe acquire-release around a read-modify-write of the document. Nothing is written
    /// if `change` fails.
    async fn update<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut StoreDocument) -> Result<T> + Send,
        T: Send,
    {
        let _access = self.access.lock().await;
        self.lock.lock_exclusive()?;
        let result = self.update_locked(change).await;
        self.lock.unlock().await?;
        result
    }

    async fn update_locked<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut StoreDocument) -> Result<T> + Send,
        T: Send,
    {
        let mut document = self.load().await?;
        let value = change(&mut document)?;
        self.save(&document).await?;
        Ok(value)
    }
}

impl ActivityStore for JsonActivityStore {
    async fn register_subject(&self, subject: SubjectId, group: GroupId) -> Result<()> {
        self.update(|document| {
            if document.register(subject, group) {
                Ok(())
            } else {
                Err(TrackingError::AlreadyTracked(subject))
            }
        })
        .await
    }

    async fn unregister_soft(&self, subject: SubjectId) -> Result<()> {
        self.update(|document| {
            if document.unregister(subject) {
                Ok(())
            } else {
                Err(TrackingError::NotTracked(subject))
            }
        })
        .await
    }

    async fn delete_subject(&self, subject: SubjectId) -> Result<()> {
        self.update(|document| {
            if !document.unregister(subject) {
                return Err(TrackingError::NotTracked(subject));
            }
            document.purge_records(subject);
            Ok(())
        })
        .await
    }

    async fn list_tracked(&self) -> Result<Vec<TrackedSubject>> {
        Ok(self.read().await?.tracked_subjects())
    }

    async fn is_tracked(&self, subject: SubjectId) -> Result<bool> {
        Ok(self.read().await?.is_tracked(subject))
    }

    async fn increment(&self, subject: SubjectId, activity: &str, kind: ActivityKind) -> Result<()> {
        let sample = ActivitySample {
            subject,
            activity: activity.into(),
            kind,
        };
        self.update(move |document| {
            document.increment(&sample);
            Ok(())
        })
        .await
    }

    async fn record_tick(&self, samples: Vec<ActivitySample>, at: DateTime<Utc>) -> Result<usize> {
        self.update(move |document| {
            let mut applied = 0;
            for sample in &samples {
                if !document.is_tracked(sample.subject) {
                    debug!("Dropping sample of untracked subject {}", sample.subject);
                    continue;
                }
                document.increment(sample);
                applied += 1;
            }
            document.last_tick = Some(at);
            Ok(applied)
        })
        .await
    }

    async fn list_records(&self, subject: SubjectId) -> Result<Vec<AggregateRecord>> {
        Ok(self.read().await?.records_of(subject))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::tracking::{
        error::TrackingError,
        store::{ActivityStore, JsonActivityStore},
        ActivityKind, ActivitySample, GroupId, SubjectId,
    };

    const SUBJECT: SubjectId = SubjectId(1);
    const GROUP: GroupId = GroupId(10);

    #[tokio::test]
    async fn test_missing_records_are_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;

        assert!(store.list_records(SUBJECT).await?.is_empty());
        assert!(store.list_tracked().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_increment_creates_then_adds() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;

        store.increment(SUBJECT, "Chess", ActivityKind::PLAYING).await?;
        let records = store.list_records(SUBJECT).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_units, 1);

        store.increment(SUBJECT, "Chess", ActivityKind::WATCHING).await?;
        let records = store.list_records(SUBJECT).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_units, 2);
        assert_eq!(records[0].kind, ActivityKind::PLAYING);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_twice_fails() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;

        store.register_subject(SUBJECT, GROUP).await?;
        let second = store.register_subject(SUBJECT, GroupId(11)).await;

        assert!(matches!(second, Err(TrackingError::AlreadyTracked(SUBJECT))));
        assert_eq!(store.list_tracked().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_purges_everything() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;
        store.register_subject(SUBJECT, GROUP).await?;
        store.register_subject(SubjectId(2), GROUP).await?;
        store.increment(SUBJECT, "Chess", ActivityKind::PLAYING).await?;
        store.increment(SUBJECT, "Go", ActivityKind::PLAYING).await?;
        store.increment(SubjectId(2), "Chess", ActivityKind::PLAYING).await?;

        store.delete_subject(SUBJECT).await?;

        assert!(store.list_records(SUBJECT).await?.is_empty());
        assert!(!store.is_tracked(SUBJECT).await?);
        assert_eq!(store.list_records(SubjectId(2)).await?.len(), 1);
        assert!(store.is_tracked(SubjectId(2)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_unregister_keeps_records() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;
        store.register_subject(SUBJECT, GROUP).await?;
        store.increment(SUBJECT, "Chess", ActivityKind::PLAYING).await?;

        store.unregister_soft(SUBJECT).await?;

        assert!(!store.is_tracked(SUBJECT).await?);
        assert_eq!(store.list_records(SUBJECT).await?.len(), 1);
        assert!(matches!(
            store.unregister_soft(SUBJECT).await,
            Err(TrackingError::NotTracked(SUBJECT))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_tick_skips_untracked_subjects() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;
        store.register_subject(SUBJECT, GROUP).await?;

        let samples = vec![
            ActivitySample {
                subject: SUBJECT,
                activity: "Chess".into(),
                kind: ActivityKind::PLAYING,
            },
            ActivitySample {
                subject: SubjectId(2),
                activity: "Chess".into(),
                kind: ActivityKind::PLAYING,
            },
        ];
        let applied = store
            .record_tick(samples, Utc.with_ymd_and_hms(2018, 7, 4, 0, 0, 0).unwrap())
            .await?;

        assert_eq!(applied, 1);
        assert_eq!(store.list_records(SUBJECT).await?.len(), 1);
        assert!(store.list_records(SubjectId(2)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_survives_reopening() -> Result<()> {
        let dir = tempdir()?;
        {
            let store = JsonActivityStore::open(dir.path()).await?;
            store.register_subject(SUBJECT, GROUP).await?;
            store.increment(SUBJECT, "Chess", ActivityKind::LISTENING).await?;
        }

        let store = JsonActivityStore::open(dir.path()).await?;
        let tracked = store.list_tracked().await?;
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].group, GROUP);
        let records = store.list_records(SUBJECT).await?;
        assert_eq!(records[0].kind, ActivityKind::LISTENING);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_document_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;
        std::fs::write(dir.path().join("store.json"), "{ not json")?;

        assert!(matches!(
            store.list_tracked().await,
            Err(TrackingError::Json(_))
        ));
        Ok(())
    }
}
