//! poa-csv CLI - Build article records from EJP CSV exports
//!
//! # Commands
//!
//! ```bash
//! poa-csv build 21598 12717          # Build records, JSON array on stdout
//! poa-csv build 21598 -o out.json    # Write records to a file
//! poa-csv columns authors            # Show the column headings of a table
//! poa-csv ids funding                # Show the manuscripts present in a table
//! ```
//!
//! Settings come from `--settings`, or from `POA_CSV_SETTINGS` /
//! `POA_CSV_PATH` (a `.env` file is honoured). Log filtering follows
//! `RUST_LOG`.

use clap::{Parser, Subcommand};
use poa_csv::{build_articles, ManuscriptId, Settings, TableKind, TableStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "poa-csv")]
#[command(about = "Build publish-on-acceptance article records from EJP CSV exports", long_about = None)]
struct Cli {
    /// JSON settings file (default: environment)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build article records for manuscript ids
    Build {
        /// Manuscript ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the column headings of a table
    Columns {
        /// Table name (authors, funding, manuscript, ...)
        table: TableKind,
    },

    /// Show the manuscript ids present in a table
    Ids {
        /// Table name (authors, funding, manuscript, ...)
        table: TableKind,
    },
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_settings(cli.settings.as_deref()).and_then(|settings| {
        let store = TableStore::new(settings);
        match cli.command {
            Commands::Build { ids, output } => cmd_build(&store, ids, output.as_deref()),
            Commands::Columns { table } => cmd_columns(&store, table),
            Commands::Ids { table } => cmd_ids(&store, table),
        }
    });

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, Box<dyn std::error::Error>> {
    let settings = match path {
        Some(p) => Settings::from_file(p)?,
        None => Settings::from_env()?,
    };
    Ok(settings)
}

fn cmd_build(
    store: &TableStore,
    ids: Vec<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading exports from: {}", store.settings().csv_path.display());

    let outcomes = build_articles(store, ids.iter().map(ManuscriptId::from))?;

    let mut articles = Vec::new();
    let mut failed = 0;
    for (id, outcome) in outcomes {
        match outcome.article {
            Some(article) => {
                eprintln!("   ✅ {} ({})", id, article.doi);
                articles.push(article);
            }
            None => {
                failed += 1;
                eprintln!("   ❌ {}: {} failures", id, outcome.error_messages.len());
                for message in &outcome.error_messages {
                    eprintln!("     - {}", message);
                }
            }
        }
    }

    eprintln!("\n📊 Results: {} built, {} discarded", articles.len(), failed);

    let json = serde_json::to_string_pretty(&articles)?;
    write_output(&json, output)?;

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_columns(store: &TableStore, table: TableKind) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📋 Columns of '{}' ({}):", table, store.settings().path_for(table).display());
    for column in store.columns_for(table)? {
        println!("{}", column);
    }
    Ok(())
}

fn cmd_ids(store: &TableStore, table: TableKind) -> Result<(), Box<dyn std::error::Error>> {
    let ids = store.manuscript_ids(table)?;
    eprintln!("📋 {} manuscripts in '{}'", ids.len(), table);
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
