//! In-process stand-in for the TMDB movie-details endpoint.
//!
//! | Id | Response |
//! |----|----------|
//! | 634649 | Spider-Man: No Way Home (Action) |
//! | 404 | 404 |
//! | 500 | 500, every time |
//! | 7777 | 200 after a 3 second delay |
//! | anything else | 200, `Movie {id}`, Drama |
//!
//! Any request without `api_key=test-key` gets 401.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_KEY: &str = "test-key";
pub const SPIDER_MAN: u64 = 634649;
pub const SLOW_ID: u64 = 7777;

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub id: u64,
    pub query: HashMap<String, String>,
}

#[derive(Default)]
pub struct FakeTmdb {
    seen: Mutex<Vec<SeenRequest>>,
}

impl FakeTmdb {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn hits(&self, id: u64) -> usize {
        self.seen.lock().unwrap().iter().filter(|r| r.id == id).count()
    }
}

async fn movie(
    State(state): State<Arc<FakeTmdb>>,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let authorized = query.get("api_key").map(String::as_str) == Some(API_KEY);
    state.seen.lock().unwrap().push(SeenRequest { id, query });

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status_code": 7, "status_message": "Invalid API key"})),
        )
            .into_response();
    }

    match id {
        404 => (
            StatusCode::NOT_FOUND,
            Json(json!({"status_code": 34, "status_message": "not found"})),
        )
            .into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        SPIDER_MAN => Json(json!({
            "id": SPIDER_MAN,
            "title": "Spider-Man: No Way Home",
            "vote_average": 7.94,
            "genres": [
                {"id": 28, "name": "Action"},
                {"id": 12, "name": "Adventure"},
                {"id": 878, "name": "Science Fiction"}
            ]
        }))
        .into_response(),
        SLOW_ID => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"id": id, "title": "Slow"})).into_response()
        }
        _ => Json(json!({
            "id": id,
            "title": format!("Movie {}", id),
            "vote_average": 6.1,
            "genres": [{"id": 18, "name": "Drama"}]
        }))
        .into_response(),
    }
}

pub fn router(state: Arc<FakeTmdb>) -> Router {
    Router::new()
        .route("/movie/{id}", get(movie))
        .with_state(state)
}

/// Serve on the current runtime. Returns the base URL.
pub async fn serve() -> (String, Arc<FakeTmdb>) {
    let state = Arc::new(FakeTmdb::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

/// Serve from a background thread with its own runtime, for tests that
/// drive the binary synchronously.
pub fn serve_in_background() -> (String, Arc<FakeTmdb>) {
    let state = Arc::new(FakeTmdb::default());
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    (format!("http://{}", addr), state)
}
