//! Command execution.
//!
//! Each command opens only what it needs: graph commands never touch the
//! embedder, and search commands never open the graph.

use crate::config::Paths;
use crate::output;
use anyhow::{Context, Result};
use marquee_core::catalog::{load_catalog, Catalog};
use marquee_core::embedding::{Embedder, HashingEmbedder, MiniLmEmbedder};
use marquee_core::graph::{
    ActorGenreParams, CollaborationParams, DirectorParams, GraphQuery, GraphRows, GraphStore,
};
use marquee_core::processing::{ingest_catalog_with, BatchReport};
use marquee_core::search::{
    CancelFlag, FusionSearch, IndexKind, IntentExtractor, SearchResult, VectorIndex,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which embedder encodes movies and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EmbedderChoice {
    /// all-MiniLM-L6-v2 sentence embeddings (needs model files)
    Minilm,
    /// Feature hashing; no model files, lexical similarity only
    Hashing,
}

/// Shared state for one invocation.
pub struct Session {
    pub paths: Paths,
    pub embedder: EmbedderChoice,
    pub json: bool,
}

impl Session {
    fn load_catalog(&self) -> Result<Arc<Catalog>> {
        let (catalog, report) = load_catalog(&self.paths.dataset).with_context(|| {
            format!("Failed to load dataset {}", self.paths.dataset.display())
        })?;
        warn_failures("load", &report);
        info!(
            "Loaded {} movies from {}",
            catalog.len(),
            self.paths.dataset.display()
        );
        Ok(Arc::new(catalog))
    }

    fn open_graph(&self) -> Result<GraphStore> {
        self.paths.ensure_data_dir()?;
        let path = self.paths.graph_path();
        GraphStore::open(&path)
            .with_context(|| format!("Failed to open graph database {}", path.display()))
    }

    fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        match self.embedder {
            EmbedderChoice::Minilm => {
                let model = MiniLmEmbedder::from_dir(&self.paths.model_dir).with_context(|| {
                    format!(
                        "Failed to load MiniLM from {} (set --model-dir or use --embedder hashing)",
                        self.paths.model_dir.display()
                    )
                })?;
                Ok(Arc::new(model))
            }
            EmbedderChoice::Hashing => Ok(Arc::new(HashingEmbedder::default())),
        }
    }

    fn vector_index(&self, catalog: Arc<Catalog>) -> Result<VectorIndex> {
        Ok(VectorIndex::new(self.embedder()?, catalog).with_artifact_dir(self.paths.index_dir()))
    }

    /// Index restored from disk, or built and persisted if missing.
    fn ready_index(&self) -> Result<VectorIndex> {
        let catalog = self.load_catalog()?;
        let mut index = self.vector_index(catalog.clone())?;
        let built = index
            .load_or_build(&catalog.embedding_inputs())
            .context("Failed to prepare the vector index")?;
        if built {
            eprintln!("Built a new {} index with {} movies", index.kind(), index.len());
        }
        Ok(index)
    }
}

/// Clears the graph, ingests the catalog and builds the vector index.
pub fn init(ctx: &Session) -> Result<()> {
    ingest(ctx)?;
    build_index(ctx, IndexKind::Flat)
}

/// Clears the graph and ingests the catalog.
pub fn ingest(ctx: &Session) -> Result<()> {
    let catalog = ctx.load_catalog()?;
    let store = ctx.open_graph()?;
    store.clear_all().context("Failed to clear the graph")?;

    let report = ingest_catalog_with(&store, &catalog, |p| {
        if p.processed % 100 == 0 {
            debug!("Ingested {}/{}", p.processed, p.total);
        }
    });
    warn_failures("ingest", &report);

    let stats = store.stats()?;
    println!(
        "Ingested {} movies ({} people, {} genres, {} relationships)",
        stats.movies, stats.persons, stats.genres, stats.relationships
    );
    Ok(())
}

/// Builds and persists the vector index.
pub fn build_index(ctx: &Session, kind: IndexKind) -> Result<()> {
    let catalog = ctx.load_catalog()?;
    let mut index = ctx.vector_index(catalog.clone())?.with_kind(kind);
    let inputs = catalog.embedding_inputs();

    index
        .build_with(&inputs, &CancelFlag::new(), |p| {
            debug!(
                "Encoded {}/{} ({:.0}%)",
                p.encoded,
                p.total,
                p.percent_complete()
            );
        })
        .context("Failed to build the vector index")?;

    println!(
        "Built {} index with {} movies in {}",
        index.kind(),
        index.len(),
        ctx.paths.index_dir().display()
    );
    Ok(())
}

/// Vector-only similarity search.
pub fn similar(ctx: &Session, query: &str, limit: usize) -> Result<()> {
    let index = ctx.ready_index()?;
    let results: Vec<SearchResult> = index
        .query(query, limit)?
        .iter()
        .map(|(movie, score)| SearchResult::from_scored(movie, *score))
        .collect();

    let rendered = if ctx.json {
        output::format_search_json(query, None, &results)
    } else {
        output::format_search_human(query, None, &results)
    };
    println!("{}", rendered);
    Ok(())
}

/// Fusion search with genre intent.
pub fn search(ctx: &Session, query: &str, limit: usize) -> Result<()> {
    let index = ctx.ready_index()?;
    let intent = IntentExtractor::new();
    let fusion = FusionSearch::new(&index, &intent);

    let genres = fusion.detected_genres(query);
    let results = fusion.search(query, limit)?;

    let rendered = if ctx.json {
        output::format_search_json(query, Some(&genres), &results)
    } else {
        output::format_search_human(query, Some(&genres), &results)
    };
    println!("{}", rendered);
    Ok(())
}

pub fn actor_genre(ctx: &Session, actor: &str, genre: &str) -> Result<()> {
    let query = GraphQuery::ActorInGenre(ActorGenreParams {
        actor: actor.to_string(),
        genre: genre.to_string(),
    });
    run_graph_query(ctx, &query, &format!("{} in {}", actor, genre))
}

pub fn director(ctx: &Session, name: &str, min_rating: f32) -> Result<()> {
    let query = GraphQuery::TopRatedByDirector(DirectorParams::new(name).with_min_rating(min_rating));
    run_graph_query(
        ctx,
        &query,
        &format!("{} movies rated {:.1} or higher", name, min_rating),
    )
}

pub fn collaborators(ctx: &Session, actor: &str) -> Result<()> {
    let query = GraphQuery::ActorCollaborations(CollaborationParams {
        actor: actor.to_string(),
    });
    run_graph_query(ctx, &query, actor)
}

fn run_graph_query(ctx: &Session, query: &GraphQuery, label: &str) -> Result<()> {
    let store = ctx.open_graph()?;
    if store.stats()?.movies == 0 {
        warn!("The graph is empty; run `marquee ingest` first");
    }

    let rows = store.execute(query)?;
    let rendered = match (&rows, ctx.json) {
        (GraphRows::Movies(movies), true) => output::format_rows_json(label, movies),
        (GraphRows::Collaborators(collabs), true) => output::format_rows_json(label, collabs),
        (GraphRows::Movies(movies), false) => output::format_movies_human(label, movies),
        (GraphRows::Collaborators(collabs), false) => {
            output::format_collaborators_human(label, collabs)
        }
    };
    println!("{}", rendered);
    Ok(())
}

fn warn_failures(step: &str, report: &BatchReport) {
    if report.is_complete() {
        return;
    }
    eprintln!(
        "{}: {} of {} records failed",
        step,
        report.failure_count(),
        report.total
    );
    for failure in &report.failures {
        let title = failure.title.as_deref().unwrap_or("<untitled>");
        warn!("row {} ({}): {}", failure.row, title, failure.error);
    }
}
