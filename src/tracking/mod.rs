//! Tracking is organized around [store::JsonActivityStore].
//! The basic idea is:
//!  - There is a registry of subjects that opted into tracking, together with the group their
//!    presence is resolved in.
//!  - Every sampling interval the poller adds one unit to the record of whatever the subject is
//!    doing right now.
//!  - Records are keyed by subject and activity name, so a subject has a single counter per
//!    activity.

pub mod entities;
pub mod error;
pub mod registry;
pub mod store;

use std::{fmt::Display, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

/// Identifier of a tracked entity, for example a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub u64);

/// Identifier of the context presence is resolved in, for example a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(SubjectId)
    }
}

impl FromStr for GroupId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(GroupId)
    }
}

/// Tag classifying the nature of an activity. Unknown tags are kept as is, so that a newer
/// presence platform can't break older stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityKind(pub u8);

const VERBS: [&str; 4] = ["played", "streamed", "listened", "watched"];
const UNKNOWN_VERB: &str = "????";

impl ActivityKind {
    pub const PLAYING: ActivityKind = ActivityKind(0);
    pub const STREAMING: ActivityKind = ActivityKind(1);
    pub const LISTENING: ActivityKind = ActivityKind(2);
    pub const WATCHING: ActivityKind = ActivityKind(3);

    pub fn verb(self) -> &'static str {
        VERBS.get(self.0 as usize).copied().unwrap_or(UNKNOWN_VERB)
    }
}

/// A subject that is currently sampled by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedSubject {
    pub subject: SubjectId,
    pub group: GroupId,
}

/// Accumulated amount of sampling intervals a subject spent on an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRecord {
    pub subject: SubjectId,
    pub activity: Arc<str>,
    pub total_units: u64,
    pub kind: ActivityKind,
}

/// One observation made by the poller during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySample {
    pub subject: SubjectId,
    pub activity: Arc<str>,
    pub kind: ActivityKind,
}

#[cfg(test)]
mod tests {
    use super::{ActivityKind, SubjectId};

    #[test]
    fn test_known_kinds_have_verbs() {
        assert_eq!(ActivityKind::PLAYING.verb(), "played");
        assert_eq!(ActivityKind::STREAMING.verb(), "streamed");
        assert_eq!(ActivityKind::LISTENING.verb(), "listened");
        assert_eq!(ActivityKind::WATCHING.verb(), "watched");
    }

    #[test]
    fn test_unknown_kind_falls_back() {
        assert_eq!(ActivityKind(4).verb(), "????");
        assert_eq!(ActivityKind(255).verb(), "????");
    }

    #[test]
    fn test_subject_id_parsing() {
        assert_eq!("42".parse::<SubjectId>().unwrap(), SubjectId(42));
        assert!("forty two".parse::<SubjectId>().is_err());
    }
}
