use chart_signals::{
    config::AppConfig,
    deduplication::DedupStore,
    instruments::{canonical_key, normalize_interval, normalize_symbol},
    reference::ReferenceParser,
    tracker::{Admission, ReferenceTracker},
};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chart-signals",
    version,
    about = "Chart link normalization and processed-entity bookkeeping"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recorded entries in insertion order
    List,
    /// Case-insensitive substring search over recorded entries
    Search { query: String },
    /// Record an entry
    Add { name: String },
    /// Remove a recorded entry
    Remove { name: String },
    /// Delete the whole record
    Clear {
        /// Skip the interactive confirmation
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Show entry count and last update time
    Stats,
    /// Parse a chart link and print the reference as JSON
    Parse { url: String },
    /// Check a chart link against the record without recording it
    Check { url: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chart_signals=info")),
        )
        .with_writer(io::stderr)
        .init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command, AppConfig::from_env()) {
        eprintln!("[error] {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = DedupStore::open(&config.store);
    info!("Store: {}", store.path().display());

    match command {
        Commands::List => {
            let members = store.list_members()?;
            if members.is_empty() {
                println!("No entries recorded.");
            }
            for (i, name) in members.iter().enumerate() {
                println!("{:>4}. {}", i + 1, name);
            }
        }
        Commands::Search { query } => {
            let hits = store.search(&query)?;
            println!("{} match(es) for {:?}", hits.len(), query);
            for name in hits {
                println!("  {}", name);
            }
        }
        Commands::Add { name } => {
            if store.add(&name)? {
                println!("Added {}", name);
            } else {
                println!("{} is already recorded", name);
            }
        }
        Commands::Remove { name } => {
            if store.remove(&name)? {
                println!("Removed {}", name);
            } else {
                println!("{} is not recorded", name);
            }
        }
        Commands::Clear { yes } => {
            let confirmed = yes || confirm(&format!("Delete {}?", store.path().display()))?;
            if store.clear(confirmed)? {
                println!("Cleared");
            } else if confirmed {
                println!("Nothing to clear");
            } else {
                println!("Aborted");
            }
        }
        Commands::Stats => {
            let stats = store.stats()?;
            println!("Total: {}", stats.total_count);
            match stats.last_updated {
                Some(ts) => println!("Last updated: {}", ts.to_rfc3339()),
                None => println!("Last updated: never"),
            }
        }
        Commands::Parse { url } => {
            let parsed = ReferenceParser::new(config.parser).parse(&url);
            let mut out = serde_json::to_value(&parsed)?;
            if let (Some(reference), Some(obj)) = (parsed.reference(), out.as_object_mut()) {
                obj.insert("canonical_symbol".into(), normalize_symbol(&reference.symbol).into());
                obj.insert("canonical_interval".into(), normalize_interval(&reference.interval).into());
                obj.insert("key".into(), canonical_key(reference).into());
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Check { url } => {
            let tracker = ReferenceTracker::new(ReferenceParser::new(config.parser), store);
            match tracker.check(&url)? {
                Admission::Fresh { key, .. } => println!("fresh {}", key),
                Admission::Duplicate { key } => println!("duplicate {}", key),
                Admission::Invalid { error, .. } => println!("invalid: {}", error),
            }
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
