//! HTTP endpoint handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use super::{
    responses::{format_uptime, ErrorResponse, HealthResponse},
    ApiState,
};
use crate::{
    controller::ControllerError,
    protocol::{RuntimeMessage, SettingsSnapshot, UpdateAck},
    state::{Badge, Settings},
};

fn controller_error(e: ControllerError) -> Response {
    let status = match e {
        ControllerError::InvalidInterval(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ControllerError::Unavailable => {
            error!("Controller is not running");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(ErrorResponse::new(e.to_string()))).into_response()
}

/// Handle GET /settings - `getSettings`
pub async fn get_settings_handler(
    State(state): State<ApiState>,
) -> Result<Json<SettingsSnapshot>, Response> {
    state
        .controller
        .get_settings()
        .await
        .map(Json)
        .map_err(controller_error)
}

/// Handle POST /settings - `updateSettings`
pub async fn update_settings_handler(
    State(state): State<ApiState>,
    Json(settings): Json<Settings>,
) -> Result<Json<UpdateAck>, Response> {
    info!(
        "Settings update requested: enabled={}, interval={}min",
        settings.enabled, settings.interval_minutes
    );
    state
        .controller
        .update_settings(settings.enabled, settings.interval_minutes)
        .await
        .map(Json)
        .map_err(controller_error)
}

/// Handle POST /message - runtime message in its tagged wire form
pub async fn message_handler(
    State(state): State<ApiState>,
    Json(message): Json<RuntimeMessage>,
) -> Response {
    match message {
        RuntimeMessage::UpdateSettings {
            is_enabled,
            interval,
        } => match state.controller.update_settings(is_enabled, interval).await {
            Ok(ack) => Json(ack).into_response(),
            Err(e) => controller_error(e),
        },
        RuntimeMessage::GetSettings => match state.controller.get_settings().await {
            Ok(snapshot) => Json(snapshot).into_response(),
            Err(e) => controller_error(e),
        },
        other => {
            warn!("Controller does not handle {:?}", other);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("action is not handled by the controller")),
            )
                .into_response()
        }
    }
}

/// Handle GET /badge - current badge
pub async fn badge_handler(State(state): State<ApiState>) -> Json<Badge> {
    Json(state.controller.badge())
}

/// Handle GET /events - `timerUpdate` broadcasts as server-sent events
pub async fn events_handler(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let updates = state.controller.subscribe_timer();

    let stream = stream::unfold(updates, |mut updates| async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    let event = Event::default()
                        .event("timerUpdate")
                        .json_data(RuntimeMessage::from(update));
                    return Some((event, updates));
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!("Event stream skipped {} timer updates", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(format_uptime(
        state.start_time.elapsed().as_secs(),
    )))
}

#[cfg(test)]
mod tests {
    use crate::{
        agent::PageDirectory,
        api::{create_router, ApiState},
        controller::Controller,
        state::Settings,
        storage::MemoryStore,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(settings: Settings) -> Router {
        let controller = Controller::spawn(
            Arc::new(MemoryStore::with_settings(settings)),
            PageDirectory::new(),
        );
        create_router(ApiState::new(controller))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn get_settings_returns_snapshot() {
        let (status, body) = send(app(Settings::new(true, 2)), get("/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "isEnabled": true, "interval": 2, "remainingSeconds": 120 })
        );
    }

    #[tokio::test]
    async fn post_settings_acknowledges() {
        let app = app(Settings::default());
        let (status, body) = send(
            app.clone(),
            post_json("/settings", json!({ "isEnabled": true, "interval": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (_, badge) = send(app, get("/badge")).await;
        assert_eq!(badge["text"], "5:00");
        assert_eq!(badge["background"], "#00FF00");
    }

    #[tokio::test]
    async fn zero_interval_is_unprocessable() {
        let (status, body) = send(
            app(Settings::default()),
            post_json("/settings", json!({ "isEnabled": true, "interval": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn message_endpoint_speaks_the_runtime_protocol() {
        let app = app(Settings::default());
        let (status, body) = send(
            app.clone(),
            post_json(
                "/message",
                json!({ "action": "updateSettings", "isEnabled": false, "interval": 3 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (_, body) = send(
            app.clone(),
            post_json("/message", json!({ "action": "getSettings" })),
        )
        .await;
        assert_eq!(
            body,
            json!({ "isEnabled": false, "interval": 3, "remainingSeconds": 0 })
        );

        let (status, _) = send(app, post_json("/message", json!({ "action": "autoSave" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn disabled_badge_is_blank() {
        let (_, badge) = send(app(Settings::default()), get("/badge")).await;
        assert_eq!(badge["text"], "");
        assert_eq!(badge["tier"], Value::Null);
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (status, body) = send(app(Settings::default()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["uptime"].is_string());
    }
}
