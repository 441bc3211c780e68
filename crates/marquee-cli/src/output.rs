//! Output formatting for search results and graph rows.
//!
//! Supports both human-readable terminal output and JSON for scripting.
//! Human output lists at most [`DISPLAY_LIMIT`] rows; JSON carries everything.

use marquee_core::graph::{CollaboratorRow, MovieRow};
use marquee_core::search::SearchResult;
use serde::Serialize;

/// Maximum rows shown in human-readable output
const DISPLAY_LIMIT: usize = 10;

/// Maximum characters of a title shown in graph tables
const TITLE_MAX_LEN: usize = 48;

/// JSON output structure for similarity and fusion search
#[derive(Serialize)]
pub struct JsonSearchOutput<'a> {
    pub query: &'a str,
    /// Genres the query mentioned; absent for vector-only search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_genres: Option<&'a [String]>,
    pub results: &'a [SearchResult],
}

/// JSON output structure for graph traversals
#[derive(Serialize)]
pub struct JsonGraphOutput<'a, T: Serialize> {
    pub query: &'a str,
    pub rows: &'a [T],
}

/// Formats search results as JSON.
pub fn format_search_json(
    query: &str,
    detected_genres: Option<&[String]>,
    results: &[SearchResult],
) -> String {
    let output = JsonSearchOutput {
        query,
        detected_genres,
        results,
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats graph rows as JSON, labelled with a description of the query.
pub fn format_rows_json<T: Serialize>(query: &str, rows: &[T]) -> String {
    let output = JsonGraphOutput { query, rows };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats search results for human-readable terminal output.
pub fn format_search_human(
    query: &str,
    detected_genres: Option<&[String]>,
    results: &[SearchResult],
) -> String {
    let mut output = String::new();

    if let Some(genres) = detected_genres {
        if genres.is_empty() {
            output.push_str("Detected genres: none\n\n");
        } else {
            output.push_str(&format!("Detected genres: {}\n\n", genres.join(", ")));
        }
    }

    if results.is_empty() {
        output.push_str(&format!("No results found for \"{}\"", query));
        return output;
    }

    output.push_str(&format!(
        "Found {} movie{} for \"{}\":\n\n",
        results.len(),
        if results.len() == 1 { "" } else { "s" },
        query
    ));

    for (i, result) in results.iter().take(DISPLAY_LIMIT).enumerate() {
        output.push_str(&format!(
            "{}. {} ({}) (score: {:.3})\n",
            i + 1,
            result.title,
            display_year(result.year),
            result.score
        ));
        if !result.genre.is_empty() {
            output.push_str(&format!("   Genre: {}\n", result.genre));
        }
        output.push_str(&format!("   {}\n\n", result.overview));
    }

    output.trim_end().to_string()
}

/// Formats movie rows (actor-in-genre, director queries) as a table.
pub fn format_movies_human(heading: &str, rows: &[MovieRow]) -> String {
    if rows.is_empty() {
        return format!("{}: no movies found", heading);
    }

    let mut output = format!("{}:\n\n", heading);
    output.push_str(&format!(
        "{:<width$}  {:>4}  {:>6}\n",
        "Title",
        "Year",
        "Rating",
        width = TITLE_MAX_LEN
    ));
    for row in rows.iter().take(DISPLAY_LIMIT) {
        output.push_str(&format!(
            "{:<width$}  {:>4}  {:>6}\n",
            truncate_text(&row.title, TITLE_MAX_LEN),
            display_year(row.year),
            row.rating
                .map(|r| format!("{:.1}", r))
                .unwrap_or_else(|| "-".to_string()),
            width = TITLE_MAX_LEN
        ));
    }
    output.trim_end().to_string()
}

/// Formats collaborator rows as a table.
pub fn format_collaborators_human(actor: &str, rows: &[CollaboratorRow]) -> String {
    if rows.is_empty() {
        return format!("No collaborators found for {}", actor);
    }

    let mut output = format!("Frequent collaborators of {}:\n\n", actor);
    for (i, row) in rows.iter().take(DISPLAY_LIMIT).enumerate() {
        output.push_str(&format!(
            "{:>2}. {} ({} movie{})\n",
            i + 1,
            row.actor,
            row.collaboration_count,
            if row.collaboration_count == 1 { "" } else { "s" }
        ));
    }
    output.trim_end().to_string()
}

fn display_year(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "----".to_string())
}

/// Truncates text to a maximum number of characters, adding an ellipsis
/// at a word boundary if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let keep = max_len.saturating_sub(3);
    let truncated: String = text.chars().take(keep).collect();
    match truncated.rfind(' ') {
        Some(last_space) if last_space > 0 => format!("{}...", &truncated[..last_space]),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, genre: &str, score: f32) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            year: Some(1999),
            genre: genre.to_string(),
            overview: "A short overview...".to_string(),
            score,
        }
    }

    #[test]
    fn test_format_search_human_empty() {
        let output = format_search_human("test query", None, &[]);
        assert!(output.contains("No results found"));
        assert!(!output.contains("Detected genres"));
    }

    #[test]
    fn test_format_search_human_with_genres() {
        let genres = vec!["Comedy".to_string()];
        let results = vec![result("Superbad", "Comedy", 1.05)];
        let output = format_search_human("a comedy", Some(&genres), &results);

        assert!(output.starts_with("Detected genres: Comedy"));
        assert!(output.contains("1 movie for"));
        assert!(output.contains("1. Superbad (1999) (score: 1.050)"));
        assert!(output.contains("Genre: Comedy"));
    }

    #[test]
    fn test_format_search_human_caps_rows() {
        let results: Vec<SearchResult> = (0..15)
            .map(|i| result(&format!("Movie {}", i), "Drama", 0.5))
            .collect();
        let output = format_search_human("drama", None, &results);

        assert!(output.contains("Found 15 movies"));
        assert!(output.contains("10. Movie 9"));
        assert!(!output.contains("11. Movie 10"));
    }

    #[test]
    fn test_format_search_json() {
        let genres = vec!["War".to_string()];
        let results = vec![result("Saving Private Ryan", "Drama, War", 0.9)];
        let output = format_search_json("war", Some(&genres), &results);

        assert!(output.contains("\"query\": \"war\""));
        assert!(output.contains("\"detected_genres\": ["));
        assert!(output.contains("\"title\": \"Saving Private Ryan\""));
        assert!(output.contains("\"score\": 0.9"));

        let plain = format_search_json("war", None, &results);
        assert!(!plain.contains("detected_genres"));
    }

    #[test]
    fn test_format_movies_human() {
        let rows = vec![
            MovieRow {
                title: "The Dark Knight".to_string(),
                year: Some(2008),
                rating: Some(9.0),
            },
            MovieRow {
                title: "Untitled".to_string(),
                year: None,
                rating: None,
            },
        ];
        let output = format_movies_human("Christian Bale in Drama", &rows);

        assert!(output.starts_with("Christian Bale in Drama:"));
        assert!(output.contains("The Dark Knight"));
        assert!(output.contains("9.0"));
        assert!(output.contains("----"));

        let empty = format_movies_human("Nobody in Western", &[]);
        assert_eq!(empty, "Nobody in Western: no movies found");
    }

    #[test]
    fn test_format_collaborators_human() {
        let rows = vec![
            CollaboratorRow {
                actor: "Michael Caine".to_string(),
                collaboration_count: 2,
            },
            CollaboratorRow {
                actor: "Heath Ledger".to_string(),
                collaboration_count: 1,
            },
        ];
        let output = format_collaborators_human("Christian Bale", &rows);

        assert!(output.contains(" 1. Michael Caine (2 movies)"));
        assert!(output.contains(" 2. Heath Ledger (1 movie)"));
    }

    #[test]
    fn test_format_rows_json() {
        let rows = vec![CollaboratorRow {
            actor: "Michael Caine".to_string(),
            collaboration_count: 2,
        }];
        let output = format_rows_json("collaborators of Christian Bale", &rows);
        assert!(output.contains("\"actor\": \"Michael Caine\""));
        assert!(output.contains("\"collaboration_count\": 2"));
    }

    #[test]
    fn test_truncate_text() {
        let short = "Short text";
        assert_eq!(truncate_text(short, 50), short);

        let long = "This is a much longer text that should be truncated at a reasonable point";
        let truncated = truncate_text(long, 30);
        assert!(truncated.ends_with("..."));
        assert!(truncated.chars().count() <= 30);
    }
}
