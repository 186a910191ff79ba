//! Statute Book Renderer
//!
//! Prints the book view of one statute as JSON: every node with citations
//! resolved against the statute's annotations, plus the collected footnotes.
//!
//! # Usage
//!
//! ```bash
//! statute-book <statute-id>      # render one statute
//! statute-book --list [search]   # list statutes
//! ```
//!
//! # Environment Variables
//!
//! - `STATUTE_DB_PATH`: database file (default `~/.statute-book/database/statutes.db`)
//! - `RUST_LOG`: logging filter (default `info`)

use anyhow::{bail, Context};
use statute_core::{CoreConfig, DatabaseService, HierarchyService, StatuteService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CoreConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        bail!("usage: statute-book <statute-id> | --list [search]");
    }

    tracing::info!("Database: {}", config.database_path.display());
    let db = Arc::new(
        DatabaseService::new(config.database_path.clone())
            .await
            .with_context(|| format!("opening {}", config.database_path.display()))?,
    );

    let output = if args[0] == "--list" {
        let statutes = StatuteService::new(db)
            .list(args.get(1).map(String::as_str))
            .await?;
        serde_json::to_string_pretty(&statutes)?
    } else {
        let statute_id: i64 = args[0]
            .parse()
            .with_context(|| format!("invalid statute id '{}'", args[0]))?;
        let book = HierarchyService::new(db).book(statute_id).await?;
        serde_json::to_string_pretty(&book)?
    };

    println!("{}", output);
    Ok(())
}
