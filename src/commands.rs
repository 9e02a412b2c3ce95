//! The `query [enable|disable|delete|<subject>]` command. Expected domain errors are turned into
//! replies here, anything else is handed back to the caller.

use tracing::debug;

use crate::{
    report::pages::Pages,
    tracking::{
        error::TrackingError, registry::TrackingRegistry, store::ActivityStore, GroupId,
        SubjectId,
    },
};

const TAGGED_NOT_TRACKED: &str = "Tagged person does not have activity tracking enabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAction {
    Show,
    Enable,
    Disable,
    Delete,
    Lookup(SubjectId),
}

impl QueryAction {
    pub fn parse(args: &[String]) -> Result<Self, TrackingError> {
        match args.first().map(String::as_str) {
            None => Ok(QueryAction::Show),
            Some("enable") => Ok(QueryAction::Enable),
            Some("disable") => Ok(QueryAction::Disable),
            Some("delete") => Ok(QueryAction::Delete),
            Some(reference) => parse_reference(reference)
                .map(QueryAction::Lookup)
                .ok_or_else(|| TrackingError::InvalidReference(reference.into())),
        }
    }
}

/// Accepts a plain id or a mention like `<@123>` / `<@!123>`.
fn parse_reference(reference: &str) -> Option<SubjectId> {
    let id = reference
        .strip_prefix("<@")
        .and_then(|v| v.strip_suffix('>'))
        .map(|v| v.trim_start_matches('!'))
        .unwrap_or(reference);
    id.parse().ok()
}

/// Whoever invoked the command.
#[derive(Debug, Clone)]
pub struct Caller {
    pub subject: SubjectId,
    pub name: String,
    /// Group the command was invoked in. `None` for direct conversations.
    pub group: Option<GroupId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    Reply(String),
    Report(Pages),
}

pub struct QueryCommand<S: ActivityStore> {
    registry: TrackingRegistry<S>,
    /// How the command is invoked, used in hints.
    invocation: String,
}

impl<S: ActivityStore> QueryCommand<S> {
    pub fn new(registry: TrackingRegistry<S>, invocation: impl Into<String>) -> Self {
        Self {
            registry,
            invocation: invocation.into(),
        }
    }

    pub async fn execute(
        &self,
        caller: &Caller,
        args: &[String],
    ) -> Result<QueryResponse, TrackingError> {
        let result = match QueryAction::parse(args) {
            Ok(action) => self.run(caller, action).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => Ok(response),
            Err(e) if e.is_domain() => {
                debug!("Query of {} ended with {e}", caller.subject);
                Ok(QueryResponse::Reply(self.explain(caller, &e)))
            }
            Err(e) => Err(e),
        }
    }

    async fn run(
        &self,
        caller: &Caller,
        action: QueryAction,
    ) -> Result<QueryResponse, TrackingError> {
        match action {
            QueryAction::Enable => {
                let group = caller.group.ok_or(TrackingError::NoGroupContext)?;
                self.registry.enable(caller.subject, group).await?;
                Ok(QueryResponse::Reply(format!(
                    "Your activities will now be tracked until you opt out.\n\
                     Use `{0} disable` to opt out or `{0} delete` to opt out and delete all data.",
                    self.invocation
                )))
            }
            QueryAction::Disable | QueryAction::Delete => {
                self.registry
                    .disable(caller.subject, action == QueryAction::Delete)
                    .await?;
                Ok(QueryResponse::Reply("Activity tracking is now disabled".into()))
            }
            QueryAction::Show => self.report(caller.subject, &caller.name).await,
            QueryAction::Lookup(subject) => {
                // A tagged subject is checked before anything else, even when it's the caller.
                if !self.registry.is_tracked(subject).await? {
                    return Ok(QueryResponse::Reply(TAGGED_NOT_TRACKED.into()));
                }
                let name = if subject == caller.subject {
                    caller.name.clone()
                } else {
                    subject.to_string()
                };
                self.report(subject, &name).await
            }
        }
    }

    async fn report(&self, subject: SubjectId, name: &str) -> Result<QueryResponse, TrackingError> {
        if !self.registry.is_tracked(subject).await? {
            return Err(TrackingError::NotTracked(subject));
        }
        let records = self.registry.report(subject).await?;
        Pages::from_records(format!("{name}'s played stats"), &records)
            .map(QueryResponse::Report)
            .ok_or(TrackingError::SubjectHasNoRecords(subject))
    }

    fn explain(&self, caller: &Caller, error: &TrackingError) -> String {
        let is_caller = |subject: &SubjectId| *subject == caller.subject;
        match error {
            TrackingError::NotTracked(subject) if !is_caller(subject) => {
                TAGGED_NOT_TRACKED.into()
            }
            TrackingError::NotTracked(_) if caller.group.is_none() => {
                "You can only enable activity tracking within a group".into()
            }
            TrackingError::NotTracked(_) => format!(
                "I'm currently not tracking your activities, use `{} enable` to enable",
                self.invocation
            ),
            TrackingError::AlreadyTracked(_) => "Your activities are already tracked".into(),
            TrackingError::NoGroupContext => {
                "You can only enable activity tracking within a group".into()
            }
            TrackingError::SubjectHasNoRecords(subject) if is_caller(subject) => {
                "You haven't played anything yet!".into()
            }
            TrackingError::SubjectHasNoRecords(_) => "They haven't played anything yet!".into(),
            TrackingError::InvalidReference(reference) => {
                format!("Can't find anyone matching '{reference}'")
            }
            other => format!("Internal error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::{tempdir, TempDir};

    use crate::{
        commands::{Caller, QueryAction, QueryCommand, QueryResponse},
        tracking::{
            error::TrackingError,
            registry::TrackingRegistry,
            store::{ActivityStore, JsonActivityStore},
            ActivityKind, GroupId, SubjectId,
        },
    };

    const CALLER: SubjectId = SubjectId(1);
    const OTHER: SubjectId = SubjectId(2);
    const GROUP: GroupId = GroupId(10);

    fn caller(group: Option<GroupId>) -> Caller {
        Caller {
            subject: CALLER,
            name: "alice".into(),
            group,
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn command() -> Result<(TempDir, QueryCommand<JsonActivityStore>)> {
        let dir = tempdir()?;
        let store = JsonActivityStore::open(dir.path()).await?;
        Ok((dir, QueryCommand::new(TrackingRegistry::new(store), "query")))
    }

    fn reply(response: QueryResponse) -> String {
        match response {
            QueryResponse::Reply(v) => v,
            QueryResponse::Report(_) => panic!("expected a reply"),
        }
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(QueryAction::parse(&[]).unwrap(), QueryAction::Show);
        assert_eq!(
            QueryAction::parse(&args(&["enable"])).unwrap(),
            QueryAction::Enable
        );
        assert_eq!(
            QueryAction::parse(&args(&["delete", "extra"])).unwrap(),
            QueryAction::Delete
        );
        assert_eq!(
            QueryAction::parse(&args(&["42"])).unwrap(),
            QueryAction::Lookup(SubjectId(42))
        );
        assert_eq!(
            QueryAction::parse(&args(&["<@!42>"])).unwrap(),
            QueryAction::Lookup(SubjectId(42))
        );
        assert!(matches!(
            QueryAction::parse(&args(&["bob"])),
            Err(TrackingError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_untracked_show_explains_enable() -> Result<()> {
        let (_dir, command) = command().await?;

        let text = reply(command.execute(&caller(Some(GROUP)), &[]).await?);
        assert!(text.contains("query enable"));

        let text = reply(command.execute(&caller(None), &[]).await?);
        assert!(text.contains("within a group"));
        Ok(())
    }

    #[tokio::test]
    async fn test_enable_requires_group() -> Result<()> {
        let (_dir, command) = command().await?;

        let text = reply(command.execute(&caller(None), &args(&["enable"])).await?);

        assert!(text.contains("within a group"));
        assert!(command.execute(&caller(None), &[]).await.is_ok());
        assert!(!command.registry.is_tracked(CALLER).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_enable_then_enable_again() -> Result<()> {
        let (_dir, command) = command().await?;

        let text = reply(
            command
                .execute(&caller(Some(GROUP)), &args(&["enable"]))
                .await?,
        );
        assert!(text.contains("query disable"));
        assert!(command.registry.is_tracked(CALLER).await?);

        let text = reply(
            command
                .execute(&caller(Some(GROUP)), &args(&["enable"]))
                .await?,
        );
        assert!(text.contains("already"));
        Ok(())
    }

    #[tokio::test]
    async fn test_disable_keeps_and_delete_purges() -> Result<()> {
        let (dir, command) = command().await?;
        let store = JsonActivityStore::open(dir.path()).await?;
        store.register_subject(CALLER, GROUP).await?;
        store.increment(CALLER, "Chess", ActivityKind::PLAYING).await?;

        reply(command.execute(&caller(Some(GROUP)), &args(&["disable"])).await?);
        assert!(!store.is_tracked(CALLER).await?);
        assert_eq!(store.list_records(CALLER).await?.len(), 1);

        let text = reply(command.execute(&caller(Some(GROUP)), &args(&["delete"])).await?);
        assert!(text.contains("not tracking"));

        store.register_subject(CALLER, GROUP).await?;
        reply(command.execute(&caller(Some(GROUP)), &args(&["delete"])).await?);
        assert!(store.list_records(CALLER).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_of_other_subject() -> Result<()> {
        let (dir, command) = command().await?;
        let store = JsonActivityStore::open(dir.path()).await?;

        let text = reply(command.execute(&caller(Some(GROUP)), &args(&["2"])).await?);
        assert!(text.contains("Tagged person"));

        store.register_subject(OTHER, GROUP).await?;
        let text = reply(command.execute(&caller(Some(GROUP)), &args(&["2"])).await?);
        assert_eq!(text, "They haven't played anything yet!");

        store.increment(OTHER, "Chess", ActivityKind::PLAYING).await?;
        match command.execute(&caller(Some(GROUP)), &args(&["<@2>"])).await? {
            QueryResponse::Report(pages) => {
                assert_eq!(pages.len(), 1);
                assert!(pages.render(0).starts_with("2's played stats\n**Chess**"));
            }
            QueryResponse::Reply(v) => panic!("expected a report, got {v}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_own_report() -> Result<()> {
        let (dir, command) = command().await?;
        let store = JsonActivityStore::open(dir.path()).await?;
        store.register_subject(CALLER, GROUP).await?;

        let text = reply(command.execute(&caller(Some(GROUP)), &[]).await?);
        assert_eq!(text, "You haven't played anything yet!");

        for i in 0..12 {
            store
                .increment(CALLER, &format!("Game {i}"), ActivityKind::PLAYING)
                .await?;
        }
        match command.execute(&caller(Some(GROUP)), &[]).await? {
            QueryResponse::Report(pages) => {
                assert_eq!(pages.len(), 2);
                assert!(pages.render(0).starts_with("alice's played stats"));
            }
            QueryResponse::Reply(v) => panic!("expected a report, got {v}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_of_self_behaves_like_a_tag() -> Result<()> {
        let (dir, command) = command().await?;
        let store = JsonActivityStore::open(dir.path()).await?;

        let text = reply(command.execute(&caller(Some(GROUP)), &args(&["<@1>"])).await?);
        assert_eq!(text, "Tagged person does not have activity tracking enabled");

        store.register_subject(CALLER, GROUP).await?;
        store.increment(CALLER, "Chess", ActivityKind::PLAYING).await?;
        match command.execute(&caller(Some(GROUP)), &args(&["1"])).await? {
            QueryResponse::Report(pages) => {
                assert!(pages.render(0).starts_with("alice's played stats"));
            }
            QueryResponse::Reply(v) => panic!("expected a report, got {v}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_reference_is_a_reply() -> Result<()> {
        let (_dir, command) = command().await?;

        let text = reply(command.execute(&caller(Some(GROUP)), &args(&["bob"])).await?);

        assert!(text.contains("bob"));
        Ok(())
    }
}
