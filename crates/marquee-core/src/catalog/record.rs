use crate::config::{META_SCORE_RANGE, RATING_RANGE};
use crate::error::IngestionError;
use serde::{Deserialize, Serialize};

/// Maximum number of principal cast members kept per movie.
pub const MAX_CAST: usize = 4;

/// Immutable catalog entry.
///
/// Every numeric attribute that can be absent or malformed in the source
/// data is an explicit `Option` (or a zero sentinel for counts), so a bad
/// cell never fails the whole row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Unique key across the graph and the vector index
    pub title: String,
    pub year: Option<i32>,
    /// IMDB rating, 0-10
    pub rating: Option<f32>,
    /// Runtime in minutes, 0 when unknown
    pub runtime_minutes: u32,
    pub overview: String,
    /// Genre names in source order
    pub genres: Vec<String>,
    pub director: Option<String>,
    /// Up to [`MAX_CAST`] principal cast names
    pub cast: Vec<String>,
    /// Critic meta score, 0-100
    pub meta_score: Option<f32>,
    /// Vote count, 0 when unknown
    pub votes: u64,
    /// Gross revenue as it appears in the source (e.g. "28,341,469")
    pub gross: String,
    pub certificate: String,
    pub poster_url: String,
}

impl MovieRecord {
    /// Genres joined in their display form ("Crime, Drama").
    pub fn genre_label(&self) -> String {
        self.genres.join(", ")
    }

    /// Returns true if any of this movie's genres equals one of `genres`.
    pub fn has_any_genre(&self, genres: &[String]) -> bool {
        self.genres.iter().any(|g| genres.iter().any(|m| m == g))
    }

    /// Text encoded into the vector index for this movie.
    ///
    /// Title, overview, raw genre string, director and the four star slots,
    /// space-separated. Empty slots still contribute their separator.
    pub fn embedding_text(&self) -> String {
        let star = |i: usize| self.cast.get(i).map(String::as_str).unwrap_or("");
        format!(
            "{} {} {} {} {} {} {} {}",
            self.title,
            self.overview,
            self.genre_label(),
            self.director.as_deref().unwrap_or(""),
            star(0),
            star(1),
            star(2),
            star(3),
        )
    }
}

/// One CSV row exactly as it appears in the IMDB top-1000 layout.
///
/// All cells are read as text; cleaning happens in [`MovieRecord::from_row`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMovieRow {
    #[serde(rename = "Poster_Link", default)]
    pub poster_link: String,
    #[serde(rename = "Series_Title", default)]
    pub series_title: String,
    #[serde(rename = "Released_Year", default)]
    pub released_year: String,
    #[serde(rename = "Certificate", default)]
    pub certificate: String,
    #[serde(rename = "Runtime", default)]
    pub runtime: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "IMDB_Rating", default)]
    pub imdb_rating: String,
    #[serde(rename = "Overview", default)]
    pub overview: String,
    #[serde(rename = "Meta_score", default)]
    pub meta_score: String,
    #[serde(rename = "Director", default)]
    pub director: String,
    #[serde(rename = "Star1", default)]
    pub star1: String,
    #[serde(rename = "Star2", default)]
    pub star2: String,
    #[serde(rename = "Star3", default)]
    pub star3: String,
    #[serde(rename = "Star4", default)]
    pub star4: String,
    #[serde(rename = "No_of_Votes", default)]
    pub votes: String,
    #[serde(rename = "Gross", default)]
    pub gross: String,
}

impl MovieRecord {
    /// Cleans a raw row into a record.
    ///
    /// Only a blank title rejects the row; malformed numbers degrade to
    /// `None` or zero.
    pub fn from_row(row: RawMovieRow, row_number: usize) -> Result<Self, IngestionError> {
        let title = row.series_title.trim().to_string();
        if title.is_empty() {
            return Err(IngestionError::MissingTitle { row: row_number });
        }

        let cast = [row.star1, row.star2, row.star3, row.star4]
            .into_iter()
            .filter_map(non_blank)
            .take(MAX_CAST)
            .collect();

        Ok(Self {
            title,
            year: parse_year(&row.released_year),
            rating: parse_bounded(&row.imdb_rating, RATING_RANGE),
            runtime_minutes: parse_runtime(&row.runtime),
            overview: row.overview.trim().to_string(),
            genres: split_genres(&row.genre),
            director: non_blank(row.director),
            cast,
            meta_score: parse_bounded(&row.meta_score, META_SCORE_RANGE),
            votes: parse_votes(&row.votes),
            gross: row.gross.trim().to_string(),
            certificate: row.certificate.trim().to_string(),
            poster_url: row.poster_link.trim().to_string(),
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits a comma-separated genre cell, trimming and dropping empties.
pub fn split_genres(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a release year. Accepts "1994" and "1994.0"; anything else is `None`.
pub fn parse_year(raw: &str) -> Option<i32> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i32)
}

/// Parses a float and keeps it only if it lies in `range`.
pub fn parse_bounded(raw: &str, range: std::ops::RangeInclusive<f32>) -> Option<f32> {
    let value: f32 = raw.trim().parse().ok()?;
    (value.is_finite() && range.contains(&value)).then_some(value)
}

/// Extracts the first run of digits ("142 min" -> 142). Returns 0 if none.
pub fn parse_runtime(raw: &str) -> u32 {
    raw.chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Parses a vote count, tolerating thousands separators and a trailing ".0".
pub fn parse_votes(raw: &str) -> u64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v.trunc() as u64,
        _ => 0,
    }
}
