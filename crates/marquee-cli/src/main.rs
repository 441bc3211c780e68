//! Marquee CLI - hybrid movie search from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Load the dataset into the graph and build the vector index
//! marquee --dataset imdb_top_1000.csv init
//!
//! # Search
//! marquee search "a dark crime thriller"
//! marquee similar "space horror" -n 5 --json
//!
//! # Graph traversals
//! marquee actor-genre --actor "Tom Hanks" --genre Drama
//! marquee director --name "Christopher Nolan" --min-rating 8
//! marquee collaborators --actor "Christian Bale"
//! ```

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{EmbedderChoice, Session};
use marquee_core::config::DEFAULT_MIN_RATING;
use marquee_core::search::IndexKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Marquee movie search CLI.
///
/// Combines a relationship graph of movies, people and genres with a
/// semantic vector index, and reranks semantic hits by genres mentioned
/// in the query.
#[derive(Parser)]
#[command(name = "marquee", version, about)]
struct Cli {
    /// Custom data directory (default: platform standard location)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Movie dataset CSV (default: <data-dir>/imdb_top_1000.csv)
    #[arg(long, global = true, env = "MARQUEE_DATASET")]
    dataset: Option<PathBuf>,

    /// Embedder used for indexing and queries
    #[arg(long, global = true, value_enum, default_value_t = EmbedderChoice::Minilm)]
    embedder: EmbedderChoice,

    /// MiniLM model directory (default: <data-dir>/models/all-MiniLM-L6-v2)
    #[arg(long, global = true, env = "MARQUEE_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clear the graph, ingest the dataset and build the vector index
    Init,

    /// Clear the graph and ingest the dataset
    Ingest,

    /// Build and persist the vector index
    BuildIndex {
        /// Use the approximate HNSW backend instead of exact flat search
        #[arg(long)]
        hnsw: bool,
    },

    /// Vector-only similarity search
    Similar {
        query: String,

        /// Maximum number of results to return
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Hybrid search: semantic similarity reranked by genres in the query
    Search {
        query: String,

        /// Maximum number of results to return
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Movies an actor appeared in within a genre
    ActorGenre {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        genre: String,
    },

    /// A director's movies at or above a rating
    Director {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = DEFAULT_MIN_RATING)]
        min_rating: f32,
    },

    /// An actor's most frequent co-stars
    Collaborators {
        #[arg(long)]
        actor: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session = Session {
        paths: config::Paths::resolve(
            cli.data_dir.as_ref(),
            cli.dataset.as_ref(),
            cli.model_dir.as_ref(),
        )?,
        embedder: cli.embedder,
        json: cli.json,
    };

    match &cli.command {
        Command::Init => commands::init(&session),
        Command::Ingest => commands::ingest(&session),
        Command::BuildIndex { hnsw } => {
            let kind = if *hnsw {
                IndexKind::Hnsw
            } else {
                IndexKind::Flat
            };
            commands::build_index(&session, kind)
        }
        Command::Similar { query, limit } => commands::similar(&session, query, *limit),
        Command::Search { query, limit } => commands::search(&session, query, *limit),
        Command::ActorGenre { actor, genre } => commands::actor_genre(&session, actor, genre),
        Command::Director { name, min_rating } => commands::director(&session, name, *min_rating),
        Command::Collaborators { actor } => commands::collaborators(&session, actor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_globals() {
        let cli = Cli::try_parse_from([
            "marquee",
            "--embedder",
            "hashing",
            "search",
            "war drama",
            "-n",
            "5",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.embedder, EmbedderChoice::Hashing);
        assert!(cli.json);
        match cli.command {
            Command::Search { query, limit } => {
                assert_eq!(query, "war drama");
                assert_eq!(limit, 5);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_director_default_rating() {
        let cli = Cli::try_parse_from(["marquee", "director", "--name", "Ridley Scott"]).unwrap();
        match cli.command {
            Command::Director { name, min_rating } => {
                assert_eq!(name, "Ridley Scott");
                assert_eq!(min_rating, DEFAULT_MIN_RATING);
            }
            _ => panic!("expected director"),
        }
    }

    #[test]
    fn test_build_index_hnsw_flag() {
        let cli = Cli::try_parse_from(["marquee", "build-index", "--hnsw"]).unwrap();
        assert!(matches!(cli.command, Command::BuildIndex { hnsw: true }));
    }
}
