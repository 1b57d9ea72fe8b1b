use axum::response::{Html, Redirect};
use axum::{routing::get, Router};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::control::TimelineControl;
use crate::data;
use crate::html;
use crate::types::ActivityRecord;

/// Application state shared across requests
pub struct AppState {
    pub control: RwLock<TimelineControl>,
    pub dataset: PathBuf,
}

/// Build the router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/action/{target}", get(action_handler))
        .route("/api/activities", get(activities_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server with dataset watching
pub async fn serve(port: u16, dataset: PathBuf) -> anyhow::Result<()> {
    let records = data::load_or_empty(&dataset);

    let mut control = TimelineControl::init();
    control.update_view(records);

    let state = Arc::new(AppState {
        control: RwLock::new(control),
        dataset: dataset.clone(),
    });

    start_dataset_watcher(state.clone())?;

    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\nServer running at http://{}", addr);
    println!("Watching {} for changes...", dataset.display());
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch the dataset file for changes and push reloads into the control
fn start_dataset_watcher(state: Arc<AppState>) -> anyhow::Result<()> {
    let watch_dir = match state.dataset.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !watch_dir.exists() {
        warn!(dir = %watch_dir.display(), "Dataset directory does not exist, not watching");
        return Ok(());
    }

    let file_name = state.dataset.file_name().map(|n| n.to_os_string());

    // Create a channel to receive events
    let (tx, mut rx) = tokio::sync::mpsc::channel(10);

    // Spawn a blocking task for the file watcher
    std::thread::spawn(move || {
        let tx_clone = tx.clone();
        let mut debouncer = new_debouncer(
            Duration::from_secs(2),
            move |result: DebounceEventResult| {
                if let Ok(events) = result {
                    let dataset_changed = events
                        .iter()
                        .any(|e| e.path.file_name() == file_name.as_deref());

                    if dataset_changed {
                        let _ = tx_clone.blocking_send(());
                    }
                }
            },
        )
        .expect("Failed to create debouncer");

        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .expect("Failed to watch dataset directory");

        // Keep the watcher alive
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    });

    // Spawn a task to handle file change notifications
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            debug!(path = %state.dataset.display(), "Dataset changed, reloading");
            let records = data::load_or_empty(&state.dataset);
            let count = records.len();

            let mut control = state.control.write().await;
            control.update_view(records);

            println!("\nReloaded dataset: {} activities", count);
        }
    });

    Ok(())
}

/// Serve the timeline page
async fn index_handler(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Html<String> {
    let control = state.control.read().await;
    let markup = html::render_page(control.markup());
    Html(markup.into_string())
}

/// Dispatch a timeline interaction, then bounce back to the page
async fn action_handler(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    axum::extract::Path(target): axum::extract::Path<String>,
) -> Redirect {
    let mut control = state.control.write().await;
    if !control.dispatch(&target) {
        debug!(element = %target, "Ignoring unbound interaction target");
    }
    Redirect::to("/")
}

/// Return the current records as JSON
async fn activities_handler(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> axum::Json<Vec<ActivityRecord>> {
    let control = state.control.read().await;
    axum::Json(control.records().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_datetime;

    fn make_record(subject: &str, start: &str) -> ActivityRecord {
        ActivityRecord::new(
            Some(subject.to_string()),
            None,
            parse_datetime(start),
            None,
            0,
        )
    }

    fn test_state(records: Vec<ActivityRecord>) -> Arc<AppState> {
        let mut control = TimelineControl::init();
        control.update_view(records);
        Arc::new(AppState {
            control: RwLock::new(control),
            dataset: PathBuf::from("activities.json"),
        })
    }

    #[test]
    fn test_router_builds() {
        // Router::route panics on malformed path patterns
        let _router = build_router(test_state(vec![]));
    }

    #[tokio::test]
    async fn test_index_serves_timeline_page() {
        let state = test_state(vec![make_record("Kickoff meeting", "2024-01-15 09:00")]);

        let Html(page) = index_handler(axum::extract::State(state)).await;

        assert!(page.contains("<!DOCTYPE html>"));
        assert!(page.contains("Kickoff meeting"));
    }

    #[tokio::test]
    async fn test_index_renders_placeholder_when_empty() {
        let state = test_state(vec![]);

        let Html(page) = index_handler(axum::extract::State(state)).await;

        assert!(page.contains("No activities found"));
    }

    #[tokio::test]
    async fn test_action_switches_view() {
        let state = test_state(vec![make_record("Kickoff meeting", "2024-01-15 09:00")]);

        action_handler(
            axum::extract::State(state.clone()),
            axum::extract::Path("view-daily".to_string()),
        )
        .await;

        let control = state.control.read().await;
        assert!(control
            .markup()
            .contains(r#"id="view-daily" data-action="view-daily" aria-pressed="true""#));
    }

    #[tokio::test]
    async fn test_action_redirects_to_index() {
        use axum::response::IntoResponse;

        let state = test_state(vec![make_record("Kickoff meeting", "2024-01-15 09:00")]);

        let response = action_handler(
            axum::extract::State(state),
            axum::extract::Path("view-weekly".to_string()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .unwrap(),
            "/"
        );
    }

    #[tokio::test]
    async fn test_action_unknown_target_keeps_markup() {
        let state = test_state(vec![make_record("Kickoff meeting", "2024-01-15 09:00")]);
        let before = state.control.read().await.markup().to_string();

        action_handler(
            axum::extract::State(state.clone()),
            axum::extract::Path("no-such-target".to_string()),
        )
        .await;

        assert_eq!(state.control.read().await.markup(), before);
    }

    #[tokio::test]
    async fn test_activities_returns_records() {
        let records = vec![
            make_record("Kickoff meeting", "2024-01-15 09:00"),
            make_record("Send proposal", "2024-01-16 14:00"),
        ];
        let state = test_state(records.clone());

        let axum::Json(returned) = activities_handler(axum::extract::State(state)).await;

        assert_eq!(returned, records);
    }
}
