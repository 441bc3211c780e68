//! Test utilities for marquee-core.
//!
//! A small catalog in the IMDB top-1000 CSV layout plus record builders and
//! a lookup-table embedder. Only compiled when running tests.

use crate::catalog::{load_catalog_from_str, Catalog, MovieRecord};
use crate::embedding::Embedder;
use crate::error::EmbeddingError;
use std::collections::HashMap;

/// Ten movies. Christopher Nolan directs four; Christian Bale and Michael
/// Caine share two; one Bale drama has no year or rating.
pub const FIXTURE_CSV: &str = r#"Poster_Link,Series_Title,Released_Year,Certificate,Runtime,Genre,IMDB_Rating,Overview,Meta_score,Director,Star1,Star2,Star3,Star4,No_of_Votes,Gross
https://example.com/tdk.jpg,The Dark Knight,2008,UA,152 min,"Action, Crime, Drama",9.0,"When the menace known as the Joker wreaks havoc and chaos on the people of Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice.",84,Christopher Nolan,Christian Bale,Heath Ledger,Aaron Eckhart,Michael Caine,2303232,"534,858,444"
https://example.com/inception.jpg,Inception,2010,UA,148 min,"Action, Adventure, Sci-Fi",8.8,"A thief who steals corporate secrets through the use of dream-sharing technology is given the inverse task of planting an idea into the mind of a C.E.O.",74,Christopher Nolan,Leonardo DiCaprio,Joseph Gordon-Levitt,Elliot Page,Ken Watanabe,2067042,"292,576,195"
https://example.com/prestige.jpg,The Prestige,2006,U,130 min,"Drama, Mystery, Sci-Fi",8.5,"After a tragic accident, two stage magicians engage in a battle to create the ultimate illusion while sacrificing everything they have to outwit each other.",66,Christopher Nolan,Christian Bale,Hugh Jackman,Scarlett Johansson,Michael Caine,1190259,"53,089,891"
https://example.com/following.jpg,Following,1998,A,69 min,"Crime, Mystery, Thriller",7.5,A young writer who follows strangers for material meets a thief who takes him under his wing.,60,Christopher Nolan,Jeremy Theobald,Alex Haw,Lucy Russell,John Nolan,90000,"48,482"
,Untitled Bale Drama,,,,Drama,,An unreleased drama starring Christian Bale.,,David O. Russell,Christian Bale,Amy Adams,,,,
https://example.com/toystory.jpg,Toy Story,1995,U,81 min,"Animation, Adventure, Comedy",8.3,A cowboy doll is profoundly threatened and jealous when a new spaceman action figure supplants him as top toy in a boy's bedroom.,95,John Lasseter,Tom Hanks,Tim Allen,Don Rickles,Jim Varney,887429,"191,796,233"
https://example.com/superbad.jpg,Superbad,2007,A,113 min,Comedy,7.6,Two co-dependent high school seniors are forced to deal with separation anxiety after their plan to stage a booze-soaked party goes awry.,76,Greg Mottola,Jonah Hill,Michael Cera,Seth Rogen,Emma Stone,558755,"121,463,226"
https://example.com/alien.jpg,Alien,1979,R,117 min,"Horror, Sci-Fi",8.4,"After a space merchant vessel receives an unknown transmission as a distress call, one of the crew is attacked by a mysterious life form.",89,Ridley Scott,Sigourney Weaver,Tom Skerritt,John Hurt,Veronica Cartwright,787806,"78,900,000"
https://example.com/spr.jpg,Saving Private Ryan,1998,R,169 min,"Drama, War",8.6,"Following the Normandy Landings, a group of U.S. soldiers go behind enemy lines to retrieve a paratrooper whose brothers have been killed in action.",91,Steven Spielberg,Tom Hanks,Matt Damon,Tom Sizemore,Edward Burns,1235804,"216,540,909"
https://example.com/notebook.jpg,The Notebook,2004,U,123 min,"Drama, Romance",7.8,"A poor yet passionate young man falls in love with a rich young woman, giving her a sense of freedom, but they are soon separated because of their social differences.",53,Nick Cassavetes,Gena Rowlands,James Garner,Rachel McAdams,Ryan Gosling,533200,"81,001,787"
"#;

/// The parsed fixture catalog.
///
/// # Panics
///
/// Panics if the fixture does not parse cleanly.
pub fn fixture_catalog() -> Catalog {
    let (catalog, report) = load_catalog_from_str(FIXTURE_CSV).expect("fixture CSV parses");
    assert!(report.is_complete(), "fixture rows failed: {:?}", report.failures);
    catalog
}

/// A minimal record with the given genres and rating.
pub fn movie(title: &str, genres: &[&str], rating: Option<f32>) -> MovieRecord {
    MovieRecord {
        title: title.to_string(),
        year: Some(2000),
        rating,
        runtime_minutes: 100,
        overview: format!("{} overview", title),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        director: None,
        cast: Vec::new(),
        meta_score: None,
        votes: 0,
        gross: String::new(),
        certificate: String::new(),
        poster_url: String::new(),
    }
}

/// A Drama record with the given director and cast.
pub fn movie_with_people(title: &str, director: Option<&str>, cast: &[String]) -> MovieRecord {
    MovieRecord {
        director: director.map(str::to_string),
        cast: cast.to_vec(),
        ..movie(title, &["Drama"], None)
    }
}

/// Embedder backed by a fixed text-to-vector table.
///
/// Unknown texts embed to the zero vector. Vectors are returned as given,
/// so a table entry may deliberately have the wrong length or a NaN.
pub struct FixedEmbedder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: &[f32]) -> Self {
        self.vectors.insert(text.to_string(), vector.to_vec());
        self
    }
}

impl Embedder for FixedEmbedder {
    fn model_id(&self) -> &str {
        "fixed-table"
    }

    fn embedding_dim(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimension]))
    }
}
