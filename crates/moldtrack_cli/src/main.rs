//! `moldtrack` command-line front end.
//!
//! # Responsibility
//! - Parse commands and global flags, then call into `moldtrack_core`.
//! - Render results as text or JSON.
//!
//! # Invariants
//! - Every failure prints one message to stderr and exits non-zero.
//! - Flags override `MOLDTRACK_*` environment settings.

use clap::{Args, Parser, Subcommand};
use log::info;
use moldtrack_core::catalog::AssetView;
use moldtrack_core::config::resolve_log_dir;
use moldtrack_core::{
    import_dir, init_logging_with, normalize_level, open_db, ActionReceipt, ActionService,
    ActivityRecord, Actor, AssetKey, AssetKind, CoreConfig, FieldFilter, LogSettings,
    LookupService, SearchQuery, SqliteActivityRepository, SqliteTableRepository, TableRepository,
    TeflonStatus,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "moldtrack")]
#[command(version = moldtrack_core::core_version())]
#[command(about = "Mold and cutter inventory lookup")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = "MOLDTRACK_DB")]
    db: Option<PathBuf>,
    /// Directory for rolling log files; logging is off when unset.
    #[arg(long, global = true, env = "MOLDTRACK_LOG_DIR")]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true, env = "MOLDTRACK_LOG_LEVEL")]
    log_level: Option<String>,
    /// Company id of the home warehouse.
    #[arg(long, global = true, env = "MOLDTRACK_HOME_COMPANY")]
    home_company: Option<String>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace reference tables with the CSV sheets in DIR.
    Import { dir: PathBuf },
    /// Search molds and cutters.
    Search {
        #[arg(default_value = "")]
        query: String,
        /// `field=value`, e.g. `company=YSD` or `rack:A3`.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, value_parser = parse_kind)]
        kind: Option<AssetKind>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one asset, e.g. `mold:M-001`.
    Show {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
    },
    /// Move an asset to another rack layer.
    Move {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
        #[arg(long = "to")]
        to_layer: String,
        #[command(flatten)]
        actor: ActorArgs,
    },
    CheckIn {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
        #[command(flatten)]
        actor: ActorArgs,
    },
    CheckOut {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Ship an asset to another company.
    Ship {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
        #[arg(long = "to")]
        to_company: String,
        #[command(flatten)]
        actor: ActorArgs,
    },
    Comment {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
        body: String,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Set the Teflon coating status of a mold.
    Teflon {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
        #[arg(value_parser = parse_teflon)]
        status: TeflonStatus,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Activity history of one asset, newest first.
    History {
        #[arg(value_parser = parse_key)]
        key: AssetKey,
    },
}

#[derive(Args)]
struct ActorArgs {
    #[arg(long, env = "MOLDTRACK_EMPLOYEE")]
    employee: String,
    #[arg(long)]
    note: Option<String>,
    /// Event time in epoch milliseconds; defaults to now.
    #[arg(long)]
    at: Option<i64>,
}

impl ActorArgs {
    fn to_actor(&self) -> Actor {
        let actor = Actor::new(self.employee.clone()).with_note(self.note.clone());
        match self.at {
            Some(at) => actor.at(at),
            None => actor,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        let mut settings = LogSettings::new(config.log_level, log_dir.clone());
        settings.echo_stderr = true;
        init_logging_with(&settings)?;
    }
    info!(
        "event=cli_start module=cli status=ok db={}",
        config.db_path.display()
    );

    let conn = open_db(&config.db_path).map_err(|e| e.to_string())?;
    let tables = SqliteTableRepository::new(&conn);
    let activity = SqliteActivityRepository::new(&conn);
    let actions = ActionService::new(SqliteTableRepository::new(&conn), activity)
        .with_home_company(config.home_company_id.clone());

    match cli.command {
        Commands::Import { dir } => {
            let (_, report) = import_dir(&tables, &dir).map_err(|e| e.to_string())?;
            if cli.json {
                return print_json(&report);
            }
            for file in &report.files {
                let state = if file.present { "ok" } else { "missing" };
                println!(
                    "{:<16} {:<8} rows={} skipped={}",
                    file.file, state, file.rows, file.skipped
                );
            }
            println!(
                "imported rows={} skipped={}",
                report.total_rows(),
                report.total_skipped()
            );
            Ok(())
        }
        Commands::Search {
            query,
            filter,
            kind,
            limit,
        } => {
            let mut lookup = load_lookup(&tables, &config)?;
            let query = SearchQuery::new(query)
                .with_filter(filter.as_deref().and_then(FieldFilter::parse_expr))
                .with_kind(kind)
                .with_limit(limit.or(config.result_limit));
            let results = lookup.search(&query);
            if cli.json {
                for view in &results {
                    print_json(view)?;
                }
                return Ok(());
            }
            for view in &results {
                println!("{}", view_line(view));
            }
            println!("{} result(s)", results.len());
            Ok(())
        }
        Commands::Show { key } => {
            let lookup = load_lookup(&tables, &config)?;
            let view = lookup
                .catalog()
                .get(&key)
                .ok_or_else(|| format!("asset not found: {key}"))?;
            if cli.json {
                return print_json(view);
            }
            print_view(view);
            Ok(())
        }
        Commands::Move {
            key,
            to_layer,
            actor,
        } => finish_action(
            cli.json,
            actions.update_location(&key, &to_layer, &actor.to_actor()),
        ),
        Commands::CheckIn { key, actor } => {
            finish_action(cli.json, actions.check_in(&key, &actor.to_actor()))
        }
        Commands::CheckOut { key, actor } => {
            finish_action(cli.json, actions.check_out(&key, &actor.to_actor()))
        }
        Commands::Ship {
            key,
            to_company,
            actor,
        } => finish_action(
            cli.json,
            actions.ship(&key, &to_company, &actor.to_actor()),
        ),
        Commands::Comment { key, body, actor } => finish_action(
            cli.json,
            actions.add_comment(&key, &body, &actor.to_actor()),
        ),
        Commands::Teflon { key, status, actor } => finish_action(
            cli.json,
            actions.set_teflon(&key, status, &actor.to_actor()),
        ),
        Commands::History { key } => {
            let records = actions.history(&key).map_err(|e| e.to_string())?;
            if cli.json {
                return print_json(&records);
            }
            for record in &records {
                println!("{}", history_line(record));
            }
            Ok(())
        }
    }
}

fn effective_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(resolve_log_dir(dir).map_err(|e| e.to_string())?);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = normalize_level(level)?;
    }
    if let Some(home) = &cli.home_company {
        let home = home.trim();
        config.home_company_id = (!home.is_empty()).then(|| home.to_string());
    }
    Ok(config)
}

fn load_lookup<R: TableRepository>(
    repo: &R,
    config: &CoreConfig,
) -> Result<LookupService, String> {
    let tables = repo.load_tables().map_err(|e| e.to_string())?;
    let mut lookup = LookupService::new(config.join_options())
        .with_debounce(config.search_debounce)
        .with_default_limit(config.result_limit);
    lookup.reload(&tables);
    Ok(lookup)
}

fn finish_action<E: std::fmt::Display>(
    json: bool,
    result: Result<ActionReceipt, E>,
) -> Result<(), String> {
    let receipt = result.map_err(|e| e.to_string())?;
    if json {
        return print_json(&receipt);
    }
    println!(
        "{} {} recorded log_id={} at={}",
        receipt.key,
        receipt.change.as_str(),
        receipt.log_id,
        receipt.occurred_at
    );
    Ok(())
}

/// Prints `value` as one JSON line.
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn view_line(view: &AssetView) -> String {
    format!(
        "{:<16} {:<12} {:<24} {:<18} {:<10} {}",
        view.key.to_string(),
        view.code,
        view.name,
        view.location,
        view.company,
        view.status
    )
}

fn print_view(view: &AssetView) {
    let key = view.key.to_string();
    let related = view
        .related
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let external = if view.is_external { "yes" } else { "no" };
    let rows = [
        ("key", key.as_str()),
        ("code", view.code.as_str()),
        ("name", view.name.as_str()),
        ("dimensions", view.dimensions.as_str()),
        ("location", view.location.as_str()),
        ("company", view.company.as_str()),
        ("external", external),
        ("status", view.status.as_str()),
        ("teflon", view.teflon.as_str()),
        ("design", view.design.as_str()),
        ("drawing", view.drawing_number()),
        ("notes", view.notes()),
        ("related", related.as_str()),
    ];
    for (name, value) in rows {
        println!("{name:<12} {value}");
    }
}

fn history_line(record: &ActivityRecord) -> String {
    format!("{:>15}  {}", record.occurred_at(), record.summary())
}

fn parse_key(value: &str) -> Result<AssetKey, String> {
    AssetKey::parse(value)
        .ok_or_else(|| format!("expected `mold:ID` or `cutter:ID`, got `{value}`"))
}

fn parse_kind(value: &str) -> Result<AssetKind, String> {
    AssetKind::parse(value).ok_or_else(|| format!("expected `mold` or `cutter`, got `{value}`"))
}

fn parse_teflon(value: &str) -> Result<TeflonStatus, String> {
    TeflonStatus::parse(value)
        .ok_or_else(|| format!("expected not_coated|pending|sent|coated, got `{value}`"))
}
