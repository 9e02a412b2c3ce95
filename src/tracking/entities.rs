use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityKind, ActivitySample, AggregateRecord, GroupId, SubjectId, TrackedSubject};

/// The struct used for storing the whole store on the disk. Registry and records live in one
/// document, so that every change to them is a single write.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct StoreDocument {
    #[serde(default)]
    pub last_tick: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tracked: Vec<TrackedSubjectEntity>,
    #[serde(default)]
    pub records: Vec<ActivityRecordEntity>,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Copy)]
pub struct TrackedSubjectEntity {
    pub subject: SubjectId,
    pub group: GroupId,
}

/// Represents the counter of a single activity of a subject.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivityRecordEntity {
    pub subject: SubjectId,
    pub activity: Arc<str>,
    pub units: u64,
    pub kind: ActivityKind,
}

impl StoreDocument {
    pub fn is_tracked(&self, subject: SubjectId) -> bool {
        self.tracked.iter().any(|v| v.subject == subject)
    }

    /// Returns false if the subject was already registered.
    pub fn register(&mut self, subject: SubjectId, group: GroupId) -> bool {
        if self.is_tracked(subject) {
            return false;
        }
        self.tracked.push(TrackedSubjectEntity { subject, group });
        true
    }

    /// Returns false if the subject wasn't registered.
    pub fn unregister(&mut self, subject: SubjectId) -> bool {
        let before = self.tracked.len();
        self.tracked.retain(|v| v.subject != subject);
        before != self.tracked.len()
    }

    pub fn purge_records(&mut self, subject: SubjectId) {
        self.records.retain(|v| v.subject != subject);
    }

    /// Adds a single unit to the record. Kind is only taken into account when the record is
    /// created.
    pub fn increment(&mut self, sample: &ActivitySample) {
        let existing = self
            .records
            .iter_mut()
            .find(|v| v.subject == sample.subject && v.activity == sample.activity);

        match existing {
            Some(record) => record.units += 1,
            None => self.records.push(ActivityRecordEntity {
                subject: sample.subject,
                activity: sample.activity.clone(),
                units: 1,
                kind: sample.kind,
            }),
        }
    }

    pub fn tracked_subjects(&self) -> Vec<TrackedSubject> {
        self.tracked.iter().map(|&v| v.into()).collect()
    }

    pub fn records_of(&self, subject: SubjectId) -> Vec<AggregateRecord> {
        self.records
            .iter()
            .filter(|v| v.subject == subject)
            .cloned()
            .map(Into::into)
            .collect()
    }
}

impl From<TrackedSubjectEntity> for TrackedSubject {
    fn from(TrackedSubjectEntity { subject, group }: TrackedSubjectEntity) -> Self {
        TrackedSubject { subject, group }
    }
}

impl From<ActivityRecordEntity> for AggregateRecord {
    fn from(
        ActivityRecordEntity {
            subject,
            activity,
            units,
            kind,
        }: ActivityRecordEntity,
    ) -> Self {
        AggregateRecord {
            subject,
            activity,
            total_units: units,
            kind,
        }
    }
}
