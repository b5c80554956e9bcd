use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use concept_review::clock::{Clock, ClockMode, FixedClock, SystemClock};
use concept_review::models::sm2::PERFECT_RECALL;
use concept_review::models::{Concept, ConceptId, IntervalPolicy, Session};
use concept_review::{Config, ReviewService, SqliteStore, export};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "concepts", about = "Spaced repetition for concepts you learn", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Learner whose concepts are used (overrides the config)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Interval rule (overrides the config)
    #[arg(long, global = true)]
    policy: Option<IntervalPolicy>,

    /// Clock source (overrides the config)
    #[arg(long, global = true)]
    clock: Option<ClockMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a newly learned concept
    Add {
        name: String,
        /// Date the concept was learned, YYYY-MM-DD (defaults to today)
        #[arg(long, value_parser = parse_date)]
        learned: Option<DateTime<Utc>>,
    },

    /// List all concepts
    List,

    /// List concepts due for review, earliest first
    Due,

    /// Record a review of a concept
    Review {
        id: i64,
        /// Recall quality, 0 (blackout) to 5 (perfect)
        #[arg(long, short, default_value_t = PERFECT_RECALL)]
        quality: u8,
    },

    /// Move the simulated current date forward by one day
    NextDay,

    /// Write all concepts to a JSON file
    Export { path: PathBuf },

    /// Add concepts from a JSON file
    Import { path: PathBuf },
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Formats a timestamp as YYYY-MM-DD
fn format_date(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d").to_string()
}

fn print_concepts(concepts: &[Concept]) {
    for concept in concepts {
        println!(
            "{:>4}  {:<30} next {}  every {} day(s)  EF {:.2}",
            concept.id,
            concept.name,
            format_date(concept.state.next_revision_at),
            concept.state.revision_interval,
            concept.state.easiness_factor
        );
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    if let Some(owner) = &cli.owner {
        config.owner = owner.clone();
    }
    if let Some(policy) = cli.policy {
        config.interval_policy = policy;
    }
    if let Some(clock) = cli.clock {
        config.clock = clock;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("failed to open database {}", config.database_path.display())
    })?;
    let clock: Box<dyn Clock> = match config.clock {
        ClockMode::System => Box::new(SystemClock),
        ClockMode::Simulated => Box::new(FixedClock::new(store.current_date()?)),
    };
    let service = ReviewService::from_config(store, clock, &config);
    let session = Session::new(config.owner.clone());

    match cli.command {
        Command::Add { name, learned } => {
            let concept = service.add_concept(&session, &name, learned)?;
            println!(
                "Added concept {} '{}', due {}",
                concept.id,
                concept.name,
                format_date(concept.state.next_revision_at)
            );
        }
        Command::List => {
            let concepts = service.concepts(&session)?;
            println!("{} concept(s), today is {}", concepts.len(), format_date(service.clock().now()));
            print_concepts(&concepts);
        }
        Command::Due => {
            let due = service.due(&session)?;
            if due.is_empty() {
                println!("Nothing to review on {}", format_date(service.clock().now()));
            } else {
                print_concepts(&due);
            }
        }
        Command::Review { id, quality } => {
            let next = service.review(&session, ConceptId(id), quality)?;
            println!("Concept {} reviewed, next revision {}", id, format_date(next));
        }
        Command::NextDay => {
            let today = service.store().advance_day()?;
            println!("Today is {}", format_date(today));
        }
        Command::Export { path } => {
            let exported = service.export(&session)?;
            export::json::export_json_to_path(&exported, &path)?;
            println!("Exported {} concept(s) to {}", exported.concepts.len(), path.display());
        }
        Command::Import { path } => {
            let imported = export::json::import_json(&path)?;
            let stored = service.import(&session, imported)?;
            println!("Imported {} concept(s)", stored.len());
        }
    }

    Ok(())
}
