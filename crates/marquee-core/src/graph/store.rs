//! Redb-backed property graph.
//!
//! Uses [redb](https://github.com/cberner/redb) for both on-disk and
//! in-memory storage. Nodes are JSON values in ordinary tables; each
//! relationship type is a multimap table, which makes edge inserts
//! idempotent for free.
//!
//! # Tables
//!
//! - `movies`: title -> MovieNode (JSON)
//! - `persons`: role + name -> PersonNode (JSON)
//! - `genres`: name -> GenreNode (JSON)
//! - `directed`, `acted_in`: person key -> title
//! - `cast`: title -> person key
//! - `in_genre`: title -> genre
//! - `has_movie`: genre -> title

use super::types::{
    by_rating_then_title, ActorGenreParams, CollaborationParams, CollaboratorRow, DirectorParams,
    GenreNode, GraphQuery, GraphRows, GraphStats, MovieNode, MovieRow, PersonNode, Role,
};
use crate::catalog::MovieRecord;
use crate::config::{MAX_COLLABORATORS, RATING_RANGE};
use crate::error::GraphError;
use redb::backends::InMemoryBackend;
use redb::{
    Database, MultimapTableDefinition, ReadTransaction, ReadableMultimapTable, ReadableTable,
    ReadableTableMetadata, TableDefinition, WriteTransaction,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

const MOVIES: TableDefinition<&str, &[u8]> = TableDefinition::new("movies");
const PERSONS: TableDefinition<&str, &[u8]> = TableDefinition::new("persons");
const GENRES: TableDefinition<&str, &[u8]> = TableDefinition::new("genres");

const DIRECTED: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("directed");
const ACTED_IN: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("acted_in");
const CAST: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("cast");
const IN_GENRE: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("in_genre");
const HAS_MOVIE: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("has_movie");

const NODE_TABLES: [TableDefinition<&str, &[u8]>; 3] = [MOVIES, PERSONS, GENRES];
const EDGE_TABLES: [MultimapTableDefinition<&str, &str>; 5] =
    [DIRECTED, ACTED_IN, CAST, IN_GENRE, HAS_MOVIE];

/// Separates role and name in person keys. Unit separator never appears in names.
const KEY_SEPARATOR: char = '\u{1f}';

fn person_key(role: Role, name: &str) -> String {
    format!("{}{}{}", role.as_str(), KEY_SEPARATOR, name)
}

fn name_from_person_key(key: &str) -> &str {
    key.split_once(KEY_SEPARATOR).map_or(key, |(_, name)| name)
}

/// Movie graph on an embedded transactional store.
///
/// Writes happen one movie per transaction; reads each open their own read
/// transaction. A failed write is aborted and leaves the handle usable.
///
/// # Example
///
/// ```ignore
/// use marquee_core::graph::GraphStore;
///
/// let store = GraphStore::open("./data/graph.redb")?;
/// store.upsert_movie(&record)?;
/// let rows = store.actor_in_genre("Tom Hanks", "Drama")?;
/// ```
pub struct GraphStore {
    db: Database,
}

impl GraphStore {
    /// Opens or creates a graph database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let db = Database::create(path.as_ref()).map_err(|e| {
            GraphError::Database(format!(
                "Failed to open graph at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let store = Self { db };
        store.ensure_tables()?;
        info!("Opened graph store at {}", path.as_ref().display());
        Ok(store)
    }

    /// Creates a store backed by memory only.
    pub fn in_memory() -> Result<Self, GraphError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        let store = Self { db };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> Result<(), GraphError> {
        let txn = self.db.begin_write()?;
        create_tables(&txn)?;
        txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Merges a movie with its director, cast and genres.
    ///
    /// Nodes that already exist keep their original properties. Edges are
    /// set-valued, so repeating the call changes nothing.
    #[instrument(skip_all, fields(title = %record.title))]
    pub fn upsert_movie(&self, record: &MovieRecord) -> Result<(), GraphError> {
        let txn = self.db.begin_write()?;
        match write_movie(&txn, record) {
            Ok(()) => {
                txn.commit()?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    warn!("Failed to abort transaction: {}", abort_err);
                }
                Err(e)
            }
        }
    }

    /// Removes every node and relationship.
    pub fn clear_all(&self) -> Result<(), GraphError> {
        let txn = self.db.begin_write()?;
        for table in NODE_TABLES {
            txn.delete_table(table)?;
        }
        for table in EDGE_TABLES {
            txn.delete_multimap_table(table)?;
        }
        create_tables(&txn)?;
        txn.commit()?;
        info!("Cleared graph store");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Looks up a movie node by exact title.
    pub fn movie(&self, title: &str) -> Result<Option<MovieNode>, GraphError> {
        let txn = self.db.begin_read()?;
        read_movie(&txn, title)
    }

    /// Movies `actor` acted in that are tagged with `genre`.
    ///
    /// Sorted by rating descending (unrated last), then title.
    pub fn actor_in_genre(&self, actor: &str, genre: &str) -> Result<Vec<MovieRow>, GraphError> {
        let (actor, genre) = (actor.trim(), genre.trim());
        if actor.is_empty() || genre.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin_read()?;
        let genre_movies: HashSet<String> = targets(&txn, HAS_MOVIE, genre)?.into_iter().collect();

        let mut rows = Vec::new();
        for title in targets(&txn, ACTED_IN, &person_key(Role::Actor, actor))? {
            if !genre_movies.contains(&title) {
                continue;
            }
            if let Some(node) = read_movie(&txn, &title)? {
                rows.push(MovieRow::from(node));
            }
        }
        rows.sort_by(by_rating_then_title);
        debug!("actor_in_genre({}, {}) -> {} rows", actor, genre, rows.len());
        Ok(rows)
    }

    /// Movies directed by `director` rated at least `min_rating`.
    ///
    /// Unrated movies never qualify. `min_rating` must be finite and within
    /// 0-10.
    pub fn top_rated_by_director(
        &self,
        director: &str,
        min_rating: f32,
    ) -> Result<Vec<MovieRow>, GraphError> {
        if !min_rating.is_finite() || !RATING_RANGE.contains(&min_rating) {
            return Err(GraphError::InvalidQuery(format!(
                "min_rating must be within {}-{}, got {}",
                RATING_RANGE.start(),
                RATING_RANGE.end(),
                min_rating
            )));
        }
        let director = director.trim();
        if director.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin_read()?;
        let mut rows = Vec::new();
        for title in targets(&txn, DIRECTED, &person_key(Role::Director, director))? {
            if let Some(node) = read_movie(&txn, &title)? {
                if node.rating.is_some_and(|r| r >= min_rating) {
                    rows.push(MovieRow::from(node));
                }
            }
        }
        rows.sort_by(by_rating_then_title);
        debug!(
            "top_rated_by_director({}, {}) -> {} rows",
            director,
            min_rating,
            rows.len()
        );
        Ok(rows)
    }

    /// Actors who share at least one movie with `actor`.
    ///
    /// Counted by distinct shared movies, sorted by count descending then
    /// name, at most [`MAX_COLLABORATORS`] rows. Never includes `actor`.
    pub fn actor_collaborations(&self, actor: &str) -> Result<Vec<CollaboratorRow>, GraphError> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin_read()?;
        let own_key = person_key(Role::Actor, actor);
        let mut shared: HashMap<String, usize> = HashMap::new();

        for title in targets(&txn, ACTED_IN, &own_key)? {
            for costar_key in targets(&txn, CAST, &title)? {
                if costar_key != own_key {
                    *shared
                        .entry(name_from_person_key(&costar_key).to_string())
                        .or_default() += 1;
                }
            }
        }

        let mut rows: Vec<CollaboratorRow> = shared
            .into_iter()
            .map(|(actor, collaboration_count)| CollaboratorRow {
                actor,
                collaboration_count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.collaboration_count
                .cmp(&a.collaboration_count)
                .then_with(|| a.actor.cmp(&b.actor))
        });
        rows.truncate(MAX_COLLABORATORS);
        debug!("actor_collaborations({}) -> {} rows", actor, rows.len());
        Ok(rows)
    }

    /// Runs one of the fixed query templates.
    pub fn execute(&self, query: &GraphQuery) -> Result<GraphRows, GraphError> {
        match query {
            GraphQuery::ActorInGenre(ActorGenreParams { actor, genre }) => {
                self.actor_in_genre(actor, genre).map(GraphRows::Movies)
            }
            GraphQuery::TopRatedByDirector(DirectorParams {
                director,
                min_rating,
            }) => self
                .top_rated_by_director(director, *min_rating)
                .map(GraphRows::Movies),
            GraphQuery::ActorCollaborations(CollaborationParams { actor }) => self
                .actor_collaborations(actor)
                .map(GraphRows::Collaborators),
        }
    }

    /// Node and relationship counts.
    pub fn stats(&self) -> Result<GraphStats, GraphError> {
        let txn = self.db.begin_read()?;
        let mut relationships = 0;
        for table in EDGE_TABLES {
            relationships += txn.open_multimap_table(table)?.len()?;
        }
        Ok(GraphStats {
            movies: txn.open_table(MOVIES)?.len()?,
            persons: txn.open_table(PERSONS)?.len()?,
            genres: txn.open_table(GENRES)?.len()?,
            relationships,
        })
    }
}

fn create_tables(txn: &WriteTransaction) -> Result<(), GraphError> {
    for table in NODE_TABLES {
        txn.open_table(table)?;
    }
    for table in EDGE_TABLES {
        txn.open_multimap_table(table)?;
    }
    Ok(())
}

fn write_movie(txn: &WriteTransaction, record: &MovieRecord) -> Result<(), GraphError> {
    let title = record.title.trim();
    if title.is_empty() {
        return Err(GraphError::InvalidQuery(
            "movie title must not be empty".to_string(),
        ));
    }

    {
        let mut movies = txn.open_table(MOVIES)?;
        if movies.get(title)?.is_none() {
            let bytes = serde_json::to_vec(&MovieNode::from(record))?;
            movies.insert(title, bytes.as_slice())?;
        }
    }

    if let Some(director) = record.director.as_deref().map(str::trim) {
        if !director.is_empty() {
            let key = merge_person(txn, Role::Director, director)?;
            txn.open_multimap_table(DIRECTED)?
                .insert(key.as_str(), title)?;
        }
    }

    for name in record.cast.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let key = merge_person(txn, Role::Actor, name)?;
        txn.open_multimap_table(ACTED_IN)?
            .insert(key.as_str(), title)?;
        txn.open_multimap_table(CAST)?.insert(title, key.as_str())?;
    }

    for genre in record.genres.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
        {
            let mut genres = txn.open_table(GENRES)?;
            if genres.get(genre)?.is_none() {
                let bytes = serde_json::to_vec(&GenreNode {
                    name: genre.to_string(),
                })?;
                genres.insert(genre, bytes.as_slice())?;
            }
        }
        txn.open_multimap_table(IN_GENRE)?.insert(title, genre)?;
        txn.open_multimap_table(HAS_MOVIE)?.insert(genre, title)?;
    }

    Ok(())
}

/// Creates the person node if absent and returns its key.
fn merge_person(txn: &WriteTransaction, role: Role, name: &str) -> Result<String, GraphError> {
    let key = person_key(role, name);
    let mut persons = txn.open_table(PERSONS)?;
    if persons.get(key.as_str())?.is_none() {
        let bytes = serde_json::to_vec(&PersonNode {
            name: name.to_string(),
            role,
        })?;
        persons.insert(key.as_str(), bytes.as_slice())?;
    }
    Ok(key)
}

fn read_movie(txn: &ReadTransaction, title: &str) -> Result<Option<MovieNode>, GraphError> {
    let movies = txn.open_table(MOVIES)?;
    let result = match movies.get(title)? {
        Some(guard) => Some(serde_json::from_slice(guard.value())?),
        None => None,
    };
    Ok(result)
}

/// All values stored under `key` in an edge table.
fn targets(
    txn: &ReadTransaction,
    table: MultimapTableDefinition<&str, &str>,
    key: &str,
) -> Result<Vec<String>, GraphError> {
    let table = txn.open_multimap_table(table)?;
    let mut out = Vec::new();
    for value in table.get(key)? {
        out.push(value?.value().to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixture_catalog, movie_with_people};
    use tempfile::TempDir;

    fn seeded_store() -> GraphStore {
        let store = GraphStore::in_memory().unwrap();
        for record in fixture_catalog().iter() {
            store.upsert_movie(record).unwrap();
        }
        store
    }

    #[test]
    fn test_actor_in_genre_sorted_with_nulls_last() {
        let store = seeded_store();
        let rows = store.actor_in_genre("Christian Bale", "Drama").unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["The Dark Knight", "The Prestige", "Untitled Bale Drama"]);
        assert!(rows.last().unwrap().rating.is_none());
    }

    #[test]
    fn test_actor_in_genre_trims_and_handles_blank() {
        let store = seeded_store();
        let trimmed = store.actor_in_genre("  Christian Bale ", " Drama ").unwrap();
        assert_eq!(trimmed.len(), 3);
        assert!(store.actor_in_genre("", "Drama").unwrap().is_empty());
        assert!(store.actor_in_genre("Christian Bale", "   ").unwrap().is_empty());
        assert!(store.actor_in_genre("Nobody", "Drama").unwrap().is_empty());
    }

    #[test]
    fn test_actor_role_is_distinct_from_director_role() {
        let store = seeded_store();
        // Christopher Nolan only directs in the fixture
        assert!(store
            .actor_in_genre("Christopher Nolan", "Drama")
            .unwrap()
            .is_empty());
        assert!(store.actor_collaborations("Christopher Nolan").unwrap().is_empty());
    }

    #[test]
    fn test_top_rated_by_director() {
        let store = seeded_store();
        let rows = store.top_rated_by_director("Christopher Nolan", 8.5).unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["The Dark Knight", "Inception", "The Prestige"]);
        assert!(rows.iter().all(|r| r.rating.unwrap() >= 8.5));

        let all = store.top_rated_by_director("Christopher Nolan", 0.0).unwrap();
        assert!(all.iter().all(|r| r.rating.is_some()));
    }

    #[test]
    fn test_top_rated_rejects_invalid_threshold() {
        let store = seeded_store();
        for bad in [f32::NAN, f32::INFINITY, -0.5, 10.5] {
            let err = store.top_rated_by_director("Christopher Nolan", bad).unwrap_err();
            assert!(matches!(err, GraphError::InvalidQuery(_)));
        }
        // Threshold is validated even for blank names
        assert!(store.top_rated_by_director("", f32::NAN).is_err());
        assert!(store.top_rated_by_director("", 7.0).unwrap().is_empty());
    }

    #[test]
    fn test_collaborations_exclude_self_and_are_symmetric() {
        let store = seeded_store();
        let rows = store.actor_collaborations("Christian Bale").unwrap();
        assert!(rows.iter().all(|r| r.actor != "Christian Bale"));

        let caine = rows.iter().find(|r| r.actor == "Michael Caine").unwrap();
        assert_eq!(caine.collaboration_count, 2);
        assert_eq!(rows[0].actor, "Michael Caine");

        let reverse = store.actor_collaborations("Michael Caine").unwrap();
        let bale = reverse.iter().find(|r| r.actor == "Christian Bale").unwrap();
        assert_eq!(bale.collaboration_count, caine.collaboration_count);
    }

    #[test]
    fn test_collaborations_sorted_and_capped() {
        let store = GraphStore::in_memory().unwrap();
        let costars: Vec<String> = (0..12).map(|i| format!("Costar {:02}", i)).collect();
        for (i, chunk) in costars.chunks(3).enumerate() {
            let mut cast = vec!["Lead".to_string()];
            cast.extend(chunk.iter().cloned());
            store
                .upsert_movie(&movie_with_people(&format!("Film {}", i), None, &cast))
                .unwrap();
        }
        store
            .upsert_movie(&movie_with_people(
                "Reunion",
                None,
                &["Lead".to_string(), "Costar 11".to_string()],
            ))
            .unwrap();

        let rows = store.actor_collaborations("Lead").unwrap();
        assert_eq!(rows.len(), MAX_COLLABORATORS);
        assert_eq!(rows[0].actor, "Costar 11");
        assert_eq!(rows[0].collaboration_count, 2);
        assert_eq!(rows[1].actor, "Costar 00");
        assert_eq!(rows[9].actor, "Costar 08");
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = seeded_store();
        let before = store.stats().unwrap();
        for record in fixture_catalog().iter() {
            store.upsert_movie(record).unwrap();
        }
        assert_eq!(store.stats().unwrap(), before);
    }

    #[test]
    fn test_first_write_wins_for_movie_properties() {
        let store = GraphStore::in_memory().unwrap();
        let mut record = movie_with_people("Heat", Some("Michael Mann"), &[]);
        record.rating = Some(8.3);
        store.upsert_movie(&record).unwrap();

        record.rating = Some(1.0);
        store.upsert_movie(&record).unwrap();
        assert_eq!(store.movie("Heat").unwrap().unwrap().rating, Some(8.3));
    }

    #[test]
    fn test_missing_year_stored_as_null() {
        let store = GraphStore::in_memory().unwrap();
        let mut record = movie_with_people("Undated", None, &[]);
        record.year = None;
        store.upsert_movie(&record).unwrap();
        let node = store.movie("Undated").unwrap().unwrap();
        assert_eq!(node.year, None);
    }

    #[test]
    fn test_blank_names_skipped() {
        let store = GraphStore::in_memory().unwrap();
        let mut record = movie_with_people("Sparse", Some("  "), &[" ".to_string()]);
        record.genres = vec!["".to_string(), "Drama".to_string()];
        store.upsert_movie(&record).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.movies, 1);
        assert_eq!(stats.persons, 0);
        assert_eq!(stats.genres, 1);
        assert_eq!(stats.relationships, 2);
    }

    #[test]
    fn test_blank_title_rejected_without_partial_writes() {
        let store = GraphStore::in_memory().unwrap();
        let cast = vec!["Sigourney Weaver".to_string()];
        let record = movie_with_people("   ", Some("Ridley Scott"), &cast);
        let err = store.upsert_movie(&record).unwrap_err();
        assert!(matches!(err, GraphError::InvalidQuery(_)));
        assert_eq!(store.stats().unwrap(), GraphStats::default());

        store
            .upsert_movie(&movie_with_people("Alien", Some("Ridley Scott"), &[]))
            .unwrap();
        assert_eq!(store.stats().unwrap().movies, 1);
    }

    #[test]
    fn test_execute_dispatch() {
        let store = seeded_store();
        let rows = store
            .execute(&GraphQuery::TopRatedByDirector(DirectorParams::new(
                "Christopher Nolan",
            )))
            .unwrap();
        assert!(matches!(rows, GraphRows::Movies(_)));
        assert!(!rows.is_empty());

        let rows = store
            .execute(&GraphQuery::ActorCollaborations(CollaborationParams {
                actor: "Christian Bale".into(),
            }))
            .unwrap();
        assert!(matches!(rows, GraphRows::Collaborators(_)));
    }

    #[test]
    fn test_clear_all() {
        let store = seeded_store();
        assert!(store.stats().unwrap().movies > 0);
        store.clear_all().unwrap();
        assert_eq!(store.stats().unwrap(), GraphStats::default());
        assert!(store.actor_in_genre("Christian Bale", "Drama").unwrap().is_empty());

        // Still writable after clearing
        store.upsert_movie(&fixture_catalog().records()[0]).unwrap();
        assert_eq!(store.stats().unwrap().movies, 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.redb");
        {
            let store = GraphStore::open(&path).unwrap();
            for record in fixture_catalog().iter() {
                store.upsert_movie(record).unwrap();
            }
        }
        let store = GraphStore::open(&path).unwrap();
        assert_eq!(
            store.stats().unwrap().movies,
            fixture_catalog().len() as u64
        );
    }
}
