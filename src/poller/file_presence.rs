use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::tracking::{GroupId, SubjectId};

use super::presence::{Activity, GroupPresence, PresenceSource, StaticGroup};

/// Layout of the presence file. Groups map members to their current activities:
/// `{ "groups": { "10": { "1": [{ "name": "Chess", "kind": 0 }] } } }`
#[derive(Debug, Deserialize, Default)]
struct PresenceDocument {
    #[serde(default)]
    groups: HashMap<GroupId, HashMap<SubjectId, Vec<Activity>>>,
}

/// [PresenceSource] that reads a JSON document written by some other program. The document is
/// re-read on every tick. A missing file means nobody is present.
pub struct FilePresenceSource {
    path: PathBuf,
    groups: HashMap<GroupId, Arc<StaticGroup>>,
}

impl FilePresenceSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            groups: HashMap::new(),
        }
    }

    fn read_document(&self) -> Result<PresenceDocument> {
        match std::fs::read(&self.path) {
            Ok(data) => serde_json::from_slice(&data)
                .with_context(|| format!("Invalid presence file {:?}", self.path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Presence file {:?} doesn't exist", self.path);
                Ok(PresenceDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl PresenceSource for FilePresenceSource {
    fn refresh(&mut self) -> Result<()> {
        let document = self.read_document()?;
        self.groups = document
            .groups
            .into_iter()
            .map(|(group, members)| (group, Arc::new(StaticGroup::new(members))))
            .collect();
        Ok(())
    }

    fn resolve_group(&self, group: GroupId) -> Option<Arc<dyn GroupPresence>> {
        self.groups
            .get(&group)
            .map(|v| v.clone() as Arc<dyn GroupPresence>)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        poller::presence::PresenceSource,
        tracking::{ActivityKind, GroupId, SubjectId},
    };

    use super::FilePresenceSource;

    #[test]
    fn test_reads_groups_and_members() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("presence.json");
        std::fs::write(
            &path,
            r#"{ "groups": { "10": {
                "1": [{ "name": "Chess", "kind": 0 }, { "name": "Radio", "kind": 2 }],
                "2": []
            } } }"#,
        )?;
        let mut source = FilePresenceSource::new(path);
        source.refresh()?;

        let group = source.resolve_group(GroupId(10)).expect("group should exist");
        let member = group.resolve_subject(SubjectId(1)).expect("member should exist");
        assert_eq!(member.current_activities().len(), 2);
        assert_eq!(&*member.current_activities()[0].name, "Chess");
        assert_eq!(member.current_activities()[1].kind, ActivityKind::LISTENING);
        assert!(group.resolve_subject(SubjectId(2)).is_some());
        assert!(group.resolve_subject(SubjectId(3)).is_none());
        assert!(source.resolve_group(GroupId(11)).is_none());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let mut source = FilePresenceSource::new(dir.path().join("presence.json"));
        source.refresh()?;

        assert!(source.resolve_group(GroupId(10)).is_none());
        Ok(())
    }

    #[test]
    fn test_refresh_replaces_previous_state() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("presence.json");
        std::fs::write(&path, r#"{ "groups": { "10": { "1": [{ "name": "Chess" }] } } }"#)?;
        let mut source = FilePresenceSource::new(path.clone());
        source.refresh()?;
        assert!(source.resolve_group(GroupId(10)).is_some());

        std::fs::write(&path, r#"{ "groups": {} }"#)?;
        source.refresh()?;
        assert!(source.resolve_group(GroupId(10)).is_none());
        Ok(())
    }

    #[test]
    fn test_invalid_file_fails() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("presence.json");
        std::fs::write(&path, "groups: []")?;
        let mut source = FilePresenceSource::new(path);

        assert!(source.refresh().is_err());
        Ok(())
    }
}
