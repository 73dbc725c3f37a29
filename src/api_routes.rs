use crate::api_state::AppState;
use crate::service::render::render;
use chrono::Utc;
use rocket::http::ContentType;
use rocket::State;

/// GET /metrics - Fresh scan of local and cloud backups in Prometheus text format
#[get("/metrics")]
pub async fn metrics(state: &State<AppState>) -> (ContentType, String) {
    let snapshot = state.collect_snapshot(Utc::now()).await;
    (ContentType::Plain, render(&snapshot))
}

/// Anything else is a bare 404
#[catch(404)]
pub fn not_found() {}
