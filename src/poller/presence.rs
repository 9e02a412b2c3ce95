//! Contract the poller uses to find out what subjects are doing right now.
//! A miss on any level (unknown group, subject that left or is offline) is a normal outcome and
//! is represented by `None`.

use std::{collections::HashMap, sync::Arc};

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

use crate::tracking::{ActivityKind, GroupId, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Activity {
    /// Name of the activity. For example 'Chess' or 'Lo-fi radio'
    pub name: Arc<str>,
    #[serde(default)]
    pub kind: ActivityKind,
}

/// Live state of a subject inside a group.
#[derive(Debug, Clone, Default)]
pub struct SubjectPresence {
    activities: Vec<Activity>,
}

impl SubjectPresence {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    /// Activities in the order the platform reports them. The first one is the primary one.
    pub fn current_activities(&self) -> &[Activity] {
        &self.activities
    }
}

/// Intended to serve as a contract presence platforms must implement.
#[cfg_attr(test, automock)]
pub trait PresenceSource: Send {
    /// Called once at the start of every tick, before any lookups.
    fn refresh(&mut self) -> anyhow::Result<()>;

    fn resolve_group(&self, group: GroupId) -> Option<Arc<dyn GroupPresence>>;
}

pub trait GroupPresence: Send + Sync {
    fn resolve_subject(&self, subject: SubjectId) -> Option<SubjectPresence>;
}

/// Group with a fixed set of members.
#[derive(Debug, Clone, Default)]
pub struct StaticGroup {
    members: HashMap<SubjectId, Vec<Activity>>,
}

impl StaticGroup {
    pub fn new(members: HashMap<SubjectId, Vec<Activity>>) -> Self {
        Self { members }
    }

    pub fn with_member(mut self, subject: SubjectId, activities: Vec<Activity>) -> Self {
        self.members.insert(subject, activities);
        self
    }
}

impl GroupPresence for StaticGroup {
    fn resolve_subject(&self, subject: SubjectId) -> Option<SubjectPresence> {
        self.members
            .get(&subject)
            .map(|activities| SubjectPresence::new(activities.clone()))
    }
}
