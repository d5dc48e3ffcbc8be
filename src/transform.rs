//! Payload → [`MovieRow`] normalization.
//!
//! TMDB payloads are treated as untrusted JSON: each field is read by its
//! own parse-with-default function, so a missing or mistyped field yields
//! a typed default instead of an error. [`make_movie_row`] is total and
//! performs no I/O.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::models::{MovieId, MovieRow};

/// Genre whose presence marks a row for emphasis in the report.
pub const ACTION_GENRE: &str = "Action";

/// Build a report row from one TMDB `/movie/{id}` payload.
///
/// The `id` argument is authoritative; any `id` inside the payload is ignored.
///
/// # Example
///
/// ```rust
/// use movie_report::transform::make_movie_row;
/// use serde_json::json;
///
/// let row = make_movie_row(550, &json!({
///     "title": "Fight Club",
///     "vote_average": 8.4,
///     "genres": [{"id": 53, "name": "Thriller"}, {"id": 18, "name": "Drama"}]
/// }));
/// assert_eq!(row.genres, vec!["Drama", "Thriller"]);
/// assert!(!row.is_action);
/// ```
pub fn make_movie_row(id: MovieId, payload: &Value) -> MovieRow {
    let genres = parse_genres(payload);
    let is_action = genres.iter().any(|g| g == ACTION_GENRE);

    MovieRow {
        id,
        title: parse_title(payload),
        vote_average: parse_vote_average(payload),
        genres,
        is_action,
    }
}

/// `title` as text. Numbers and booleans are rendered as text; anything
/// else is `""`.
pub fn parse_title(payload: &Value) -> String {
    match payload.get("title") {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

/// `vote_average` as a finite float, or `0.0`.
///
/// Numeric strings (`"7.5"`) are accepted; anything else falls back.
pub fn parse_vote_average(payload: &Value) -> f64 {
    let parsed = match payload.get("vote_average") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Genre names: trimmed, non-empty, deduplicated, sorted ascending.
///
/// Only objects with a string `name` count; other entries are skipped.
pub fn parse_genres(payload: &Value) -> Vec<String> {
    let Some(entries) = payload.get("genres").and_then(Value::as_array) else {
        return Vec::new();
    };

    let names: BTreeSet<String> = entries
        .iter()
        .filter_map(|g| g.get("name").and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn happy_path() {
        let payload = json!({
            "id": 550,
            "title": "Fight Club",
            "vote_average": 8.4,
            "genres": [{"id": 18, "name": "Drama"}, {"id": 53, "name": "Thriller"}]
        });
        let row = make_movie_row(550, &payload);
        assert_eq!(row.id, 550);
        assert_eq!(row.title, "Fight Club");
        assert_eq!(row.vote_average, 8.4);
        assert_eq!(row.genres, vec!["Drama", "Thriller"]);
        assert!(!row.is_action);
    }

    #[test]
    fn spider_man_payload() {
        let payload = json!({
            "id": 634649,
            "title": "Spider-Man: No Way Home",
            "vote_average": 7.94,
            "genres": [
                {"id": 28, "name": "Action"},
                {"id": 12, "name": "Adventure"},
                {"id": 878, "name": "Science Fiction"}
            ]
        });
        let row = make_movie_row(634649, &payload);
        assert_eq!(
            row,
            MovieRow {
                id: 634649,
                title: "Spider-Man: No Way Home".to_string(),
                vote_average: 7.94,
                genres: vec![
                    "Action".to_string(),
                    "Adventure".to_string(),
                    "Science Fiction".to_string()
                ],
                is_action: true,
            }
        );
    }

    #[test]
    fn action_flag_is_set_regardless_of_input_order() {
        let payload = json!({
            "title": "Avengers: Infinity War",
            "genres": [{"id": 12, "name": "Adventure"}, {"id": 28, "name": "Action"}]
        });
        let row = make_movie_row(299536, &payload);
        assert!(row.is_action);
        assert_eq!(row.genres, vec!["Action", "Adventure"]);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let row = make_movie_row(999, &json!({"id": 999, "title": "Movie with Missing Info"}));
        assert_eq!(row.title, "Movie with Missing Info");
        assert_eq!(row.vote_average, 0.0);
        assert!(row.genres.is_empty());
        assert!(!row.is_action);
    }

    #[test]
    fn non_object_payload_yields_empty_row() {
        for payload in [Value::Null, json!([1, 2, 3]), json!("oops"), json!(42)] {
            let row = make_movie_row(7, &payload);
            assert_eq!(row.id, 7);
            assert_eq!(row.title, "");
            assert_eq!(row.vote_average, 0.0);
            assert!(row.genres.is_empty());
        }
    }

    #[test]
    fn mistyped_fields_use_defaults() {
        let payload = json!({
            "title": 12345,
            "vote_average": {"value": 3},
            "genres": "Action"
        });
        let row = make_movie_row(1, &payload);
        assert_eq!(row.title, "12345");
        assert_eq!(row.vote_average, 0.0);
        assert!(row.genres.is_empty());
        assert!(!row.is_action);
    }

    #[test]
    fn scalar_titles_are_rendered_as_text() {
        assert_eq!(parse_title(&json!({"title": 1917})), "1917");
        assert_eq!(parse_title(&json!({"title": 2.5})), "2.5");
        assert_eq!(parse_title(&json!({"title": true})), "true");
        assert_eq!(parse_title(&json!({"title": null})), "");
        assert_eq!(parse_title(&json!({"title": ["Heat"]})), "");
    }

    #[test]
    fn vote_average_accepts_numeric_strings_and_integers() {
        assert_eq!(parse_vote_average(&json!({"vote_average": " 6.5 "})), 6.5);
        assert_eq!(parse_vote_average(&json!({"vote_average": 7})), 7.0);
        assert_eq!(parse_vote_average(&json!({"vote_average": "NaN"})), 0.0);
        assert_eq!(parse_vote_average(&json!({"vote_average": "high"})), 0.0);
        assert_eq!(parse_vote_average(&json!({"vote_average": null})), 0.0);
    }

    #[test]
    fn genres_skip_malformed_entries_and_dedup() {
        let payload = json!({
            "genres": [
                {"name": "Drama"},
                {"name": "  Action "},
                {"id": 1},
                {"name": ""},
                {"name": 28},
                "Comedy",
                null,
                {"name": "Drama"},
                {"name": "action"}
            ]
        });
        let genres = parse_genres(&payload);
        // Case-sensitive: uppercase sorts before lowercase.
        assert_eq!(genres, vec!["Action", "Drama", "action"]);
        assert!(make_movie_row(1, &payload).is_action);
    }

    #[test]
    fn lowercase_action_does_not_flag() {
        let row = make_movie_row(1, &json!({"genres": [{"name": "action"}]}));
        assert!(!row.is_action);
    }

    #[test]
    fn transform_is_idempotent() {
        let payload = json!({
            "title": "Heat",
            "vote_average": 7.9,
            "genres": [{"name": "Thriller"}, {"name": "Crime"}, {"name": "Action"}]
        });
        let a = make_movie_row(949, &payload);
        let b = make_movie_row(949, &payload);
        assert_eq!(a, b);
        assert_eq!(a.vote_average.to_bits(), b.vote_average.to_bits());
    }
}
