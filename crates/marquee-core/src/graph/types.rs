//! Node, query and result types for the movie graph.

use crate::catalog::MovieRecord;
use crate::config::DEFAULT_MIN_RATING;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Role a person plays in relation to a movie.
///
/// Part of the person's identity: the same name may exist once as a
/// director and once as an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Director,
    Actor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "Director",
            Role::Actor => "Actor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movie node properties. Keyed by title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieNode {
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f32>,
    pub runtime_minutes: u32,
    pub overview: String,
    pub meta_score: Option<f32>,
    pub votes: u64,
    pub gross: String,
    pub certificate: String,
    pub poster_url: String,
}

impl From<&MovieRecord> for MovieNode {
    fn from(record: &MovieRecord) -> Self {
        Self {
            title: record.title.clone(),
            year: record.year,
            rating: record.rating,
            runtime_minutes: record.runtime_minutes,
            overview: record.overview.clone(),
            meta_score: record.meta_score,
            votes: record.votes,
            gross: record.gross.clone(),
            certificate: record.certificate.clone(),
            poster_url: record.poster_url.clone(),
        }
    }
}

/// Person node. Keyed by name and role together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonNode {
    pub name: String,
    pub role: Role,
}

/// Genre node. Keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreNode {
    pub name: String,
}

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ActorGenreParams {
    pub actor: String,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectorParams {
    pub director: String,
    /// Inclusive lower bound on rating, within 0-10
    pub min_rating: f32,
}

impl DirectorParams {
    /// Params with the default rating threshold.
    pub fn new(director: impl Into<String>) -> Self {
        Self {
            director: director.into(),
            min_rating: DEFAULT_MIN_RATING,
        }
    }

    pub fn with_min_rating(mut self, min_rating: f32) -> Self {
        self.min_rating = min_rating;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollaborationParams {
    pub actor: String,
}

/// One of the fixed traversal templates, with its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQuery {
    /// Movies an actor appeared in that carry a given genre
    ActorInGenre(ActorGenreParams),
    /// A director's movies at or above a rating threshold
    TopRatedByDirector(DirectorParams),
    /// Co-stars ranked by number of shared movies
    ActorCollaborations(CollaborationParams),
}

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRow {
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f32>,
}

impl From<MovieNode> for MovieRow {
    fn from(node: MovieNode) -> Self {
        Self {
            title: node.title,
            year: node.year,
            rating: node.rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollaboratorRow {
    pub actor: String,
    pub collaboration_count: usize,
}

/// Rows produced by [`GraphStore::execute`](super::GraphStore::execute).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GraphRows {
    Movies(Vec<MovieRow>),
    Collaborators(Vec<CollaboratorRow>),
}

impl GraphRows {
    pub fn len(&self) -> usize {
        match self {
            GraphRows::Movies(rows) => rows.len(),
            GraphRows::Collaborators(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub movies: u64,
    pub persons: u64,
    pub genres: u64,
    pub relationships: u64,
}

/// Rating descending, unrated last, then title ascending.
pub(crate) fn by_rating_then_title(a: &MovieRow, b: &MovieRow) -> Ordering {
    match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.title.cmp(&b.title))
}
