pub mod terminal;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use terminal::TerminalChannel;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    commands::{Caller, QueryCommand, QueryResponse},
    daemon::{start_daemon, DaemonConfig, PRESENCE_FILE},
    poller::PollerConfig,
    report::session::{PaginatedSession, SessionConfig},
    tracking::{registry::TrackingRegistry, store::JsonActivityStore, GroupId, SubjectId},
    utils::{
        dir::{create_application_default_path, create_application_path},
        logging::{enable_logging, CLI_PREFIX, DAEMON_PREFIX},
        runtime::single_thread_runtime,
    },
};

#[derive(Parser, Debug)]
#[command(name = "playtrack", version, long_about = None)]
#[command(about = "Opt-in tracking of how long people spend on their activities", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable trace logging to stdout")]
    log: bool,
    #[arg(long = "log-filter", global = true, help = "Log level, RUST_LOG is used by default")]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Starts the poller that accumulates activity time of tracked subjects")]
    Serve {
        #[arg(long, help = "Presence file. Defaults to presence.json in the application directory")]
        presence: Option<PathBuf>,
        #[arg(long, default_value_t = 60, help = "Seconds between polls")]
        interval: u64,
        #[arg(long, help = "Stay attached to the console")]
        foreground: bool,
    },
    #[command(about = "Runs a query command (show, enable, disable, delete or a subject reference)")]
    Query {
        #[arg(long = "as", help = "Subject invoking the command")]
        subject: SubjectId,
        #[arg(long, help = "Group the command is invoked in")]
        group: Option<GroupId>,
        #[arg(long, help = "Display name of the invoking subject")]
        name: Option<String>,
        #[arg(long, default_value_t = 10, help = "Seconds of inactivity before pages close")]
        timeout: u64,
        args: Vec<String>,
    },
}

pub fn run(args: Args) -> Result<()> {
    let log_filter = match args.log_filter {
        None if args.log => Some(LevelFilter::TRACE),
        v => v,
    };
    let dir = match &args.dir {
        Some(dir) => create_application_path(dir)?,
        None => create_application_default_path()?,
    };

    match args.commands {
        Commands::Serve {
            presence,
            interval,
            foreground,
        } => {
            let presence = presence_path(&dir, presence)?;
            if !foreground {
                #[cfg(unix)]
                if detach()? {
                    return Ok(());
                }
            }

            enable_logging(DAEMON_PREFIX, &dir, log_filter, args.log)?;
            let config = DaemonConfig {
                presence,
                dir,
                poller: PollerConfig {
                    interval: Duration::from_secs(interval.max(1)),
                },
            };
            single_thread_runtime()?.block_on(start_daemon(config))
        }
        Commands::Query {
            subject,
            group,
            name,
            timeout,
            args: query,
        } => {
            enable_logging(CLI_PREFIX, &dir, log_filter, args.log)?;
            let caller = Caller {
                subject,
                name: name.unwrap_or_else(|| subject.to_string()),
                group,
            };
            let config = SessionConfig {
                timeout: Duration::from_secs(timeout),
            };
            single_thread_runtime()?.block_on(run_query(dir, caller, query, config))
        }
    }
}

async fn run_query(
    dir: PathBuf,
    caller: Caller,
    args: Vec<String>,
    config: SessionConfig,
) -> Result<()> {
    let store = JsonActivityStore::open(&dir).await?;
    let command = QueryCommand::new(TrackingRegistry::new(store), "playtrack query");

    match command.execute(&caller, &args).await? {
        QueryResponse::Reply(reply) => println!("{reply}"),
        QueryResponse::Report(pages) => {
            let outcome = PaginatedSession::open(&TerminalChannel, pages, config)
                .await?
                .finished()
                .await?;
            info!("Report closed {outcome:?}");
        }
    }
    Ok(())
}

/// Resolves the presence file before detaching, the daemon runs from `/`.
fn presence_path(dir: &Path, presence: Option<PathBuf>) -> Result<PathBuf> {
    match presence {
        Some(path) => Ok(std::path::absolute(path)?),
        None => Ok(dir.join(PRESENCE_FILE)),
    }
}

/// Forks into the background. Returns `true` on the parent side.
#[cfg(unix)]
fn detach() -> Result<bool> {
    use daemonize::Daemonize;
    use tracing::error;

    let daemonize = Daemonize::new()
        .stdout(daemonize::Stdio::devnull())
        .stderr(daemonize::Stdio::devnull())
        .execute();
    match daemonize {
        daemonize::Outcome::Parent(parent) => {
            parent.inspect_err(|e| error!("Failed to create daemon on parent side {e:?}"))?;
            println!("Created daemon");
            Ok(true)
        }
        daemonize::Outcome::Child(child) => {
            child?;
            Ok(false)
        }
    }
}
