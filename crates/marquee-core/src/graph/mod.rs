//! Movie relationship graph.
//!
//! Movie, Person and Genre nodes connected by DIRECTED, ACTED_IN, CAST,
//! IN_GENRE and HAS_MOVIE relationships, stored in redb. Three fixed
//! traversals are exposed directly and through the [`GraphQuery`] enum.

mod store;
mod types;

pub use store::GraphStore;
pub use types::{
    ActorGenreParams, CollaborationParams, CollaboratorRow, DirectorParams, GenreNode,
    GraphQuery, GraphRows, GraphStats, MovieNode, MovieRow, PersonNode, Role,
};
