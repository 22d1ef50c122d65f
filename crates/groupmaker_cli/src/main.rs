//! CLI entry point.
//!
//! # Responsibility
//! - Verify `groupmaker_core` linkage and print the core version.
//! - Run one allocation from command-line names against the configured store.

use clap::Parser;
use groupmaker_core::{parse_target, CoreConfig, GroupingMode, GroupingSession};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(version, about = "Split names into random, balanced groups", long_about = None)]
struct Args {
    /// How TARGET is read: `count` groups or `size` members per group
    #[arg(
        long,
        short,
        default_value = "count",
        value_parser = parse_mode,
        env = "GROUPMAKER_MODE"
    )]
    mode: GroupingMode,

    /// Group count or group size depending on --mode, at least 1
    #[arg(long, short, value_parser = parse_target_arg, env = "GROUPMAKER_TARGET")]
    target: Option<usize>,

    /// SQLite database file; an in-memory store is used when omitted
    #[arg(long, env = "GROUPMAKER_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "GROUPMAKER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "GROUPMAKER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Names to add before grouping; one argument may hold several, comma separated
    names: Vec<String>,
}

impl Args {
    fn config(&self) -> CoreConfig {
        let defaults = CoreConfig::default();
        CoreConfig {
            db_path: self.db_path.clone(),
            log_level: self.log_level.clone().unwrap_or(defaults.log_level),
            log_dir: self.log_dir.clone(),
            default_mode: self.mode,
            default_target: self.target.unwrap_or(defaults.default_target),
        }
    }

    /// Nothing to group: no names given and no store that could hold any.
    fn is_version_only(&self) -> bool {
        self.names.is_empty() && self.db_path.is_none()
    }
}

fn parse_mode(value: &str) -> Result<GroupingMode, String> {
    GroupingMode::parse(value).ok_or_else(|| format!("`{value}` is not one of count|size"))
}

fn parse_target_arg(value: &str) -> Result<usize, String> {
    parse_target(value).map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();
    println!("groupmaker_core version={}", groupmaker_core::core_version());
    if args.is_version_only() {
        return ExitCode::SUCCESS;
    }

    match run(&args.config(), &args.names) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CoreConfig, names: &[String]) -> Result<(), String> {
    config.init_logging().map_err(|err| err.to_string())?;

    let mut session = config.open_session().map_err(|err| err.to_string())?;
    if !names.is_empty() {
        session
            .add_members_from_input(&names.join("\n"))
            .map_err(|err| err.to_string())?;
    }
    session
        .allocate(config.default_target)
        .map_err(|err| err.to_string())?;
    print_groups(&session);

    session.flush().map_err(|err| err.to_string())?;
    for event in session.drain_persistence_events() {
        if event.is_failure() {
            eprintln!("warning: group set revision {} was not saved", event.revision());
        }
    }
    Ok(())
}

fn print_groups(session: &GroupingSession) {
    println!(
        "mode={} members={} groups={}",
        session.mode().as_str(),
        session.roster().len(),
        session.group_set().group_count()
    );
    for (index, group) in session.group_set().groups().iter().enumerate() {
        let names: Vec<&str> = group.members().iter().map(|m| m.name.as_str()).collect();
        println!("group {}: {}", index + 1, names.join(", "));
    }
}
