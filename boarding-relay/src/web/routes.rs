//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::arrivals::filter_by_station;
use crate::feed::FeedError;
use crate::slack::{
    AuthError, FormatError, NotificationMessage, RequestVerifier, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/find-arrival", post(find_arrival))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Slash command: list the trains currently reported at a station.
///
/// Answers `{"blocks": [...]}` with one block per matching train. A station
/// with no trains, or an unknown station, gets an empty block list.
async fn find_arrival(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if let Some(verifier) = &state.verifier {
        authenticate(verifier, &headers, &body)?;
    }

    let request = parse_command(&headers, &body)?;
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest {
            message: "usage: /find-arrival <station name>".to_string(),
        });
    }
    if let Some(response_url) = &request.response_url {
        debug!(%response_url, "replying inline; response_url unused");
    }

    let trains = state.feed.fetch_trains().await?;
    let matching = filter_by_station(&trains, &request.text);
    debug!(
        station = %request.text,
        fetched = trains.len(),
        matched = matching.len(),
        "answered arrival query"
    );

    let json = NotificationMessage::arrivals(&matching).to_json()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

/// Check the Slack signature headers against the raw body.
fn authenticate(
    verifier: &RequestVerifier,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), AuthError> {
    let timestamp = header_str(headers, TIMESTAMP_HEADER)
        .ok_or(AuthError::MissingHeader(TIMESTAMP_HEADER))?;
    let signature = header_str(headers, SIGNATURE_HEADER)
        .ok_or(AuthError::MissingHeader(SIGNATURE_HEADER))?;

    verifier.verify(body, timestamp, signature)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Decode the body as JSON when the content type says so, form otherwise.
fn parse_command(headers: &HeaderMap, body: &[u8]) -> Result<CommandRequest, AppError> {
    let is_json = header_str(headers, header::CONTENT_TYPE.as_str())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        CommandRequest::from_json(body).map_err(|e| AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        })
    } else {
        Ok(CommandRequest::from_form(body))
    }
}

/// Application error type.
///
/// Error messages are returned to the caller verbatim. This endpoint is
/// meant for a trusted Slack workspace, not the open internet.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Unauthorized { message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized {
            message: e.to_string(),
        }
    }
}

impl From<FeedError> for AppError {
    fn from(e: FeedError) -> Self {
        AppError::BadGateway {
            message: format!("transit feed unavailable: {e}"),
        }
    }
}

impl From<FormatError> for AppError {
    fn from(e: FormatError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::feed::{MockFeed, Train, TrainFeed};

    const SECRET: &str = "test-signing-secret";

    struct FailingFeed;

    #[async_trait]
    impl TrainFeed for FailingFeed {
        async fn fetch_trains(&self) -> Result<Vec<Train>, FeedError> {
            Err(FeedError::Api {
                status: 503,
                message: "maintenance".into(),
            })
        }
    }

    fn trains() -> Vec<Train> {
        vec![
            Train::new("East Lake", "E", "Boarding"),
            Train::new("Lindbergh Center", "S", "6 min"),
            Train::new("East Lake", "W", "4 min"),
        ]
    }

    fn signed_router() -> Router {
        let feed = Arc::new(MockFeed::from_trains(trains()));
        create_router(AppState::new(feed, RequestVerifier::new(SECRET)))
    }

    fn open_router(feed: Arc<dyn TrainFeed>) -> Router {
        create_router(AppState::unauthenticated(feed))
    }

    fn form_request() -> axum::http::request::Builder {
        Request::builder()
            .method("POST")
            .uri("/find-arrival")
            .header("content-type", "application/x-www-form-urlencoded")
    }

    fn signed_request(body: &'static str, timestamp: i64) -> Request<Body> {
        let ts = timestamp.to_string();
        let signature = RequestVerifier::new(SECRET).sign(body.as_bytes(), &ts);
        form_request()
            .header(TIMESTAMP_HEADER, ts)
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .unwrap()
    }

    async fn read_body(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_check() {
        let response = signed_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let (status, body) = read_body(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn signed_request_returns_matching_blocks() {
        let request = signed_request("command=%2Ffind-arrival&text=East+Lake", Utc::now().timestamp());

        let response = signed_router().oneshot(request).await.unwrap();
        let (status, body) = read_body(response).await;

        assert_eq!(status, StatusCode::OK);
        let message: NotificationMessage = serde_json::from_str(&body).unwrap();
        let texts: Vec<_> = message.blocks.iter().map(|b| b.text.text.as_str()).collect();
        assert_eq!(texts, ["*East Lake* E: boarding now", "*East Lake* W: 4 min"]);
    }

    #[tokio::test]
    async fn unknown_station_returns_empty_blocks() {
        let request = signed_request("text=Doraville", Utc::now().timestamp());

        let response = signed_router().oneshot(request).await.unwrap();
        let (status, body) = read_body(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"blocks":[]}"#);
    }

    #[tokio::test]
    async fn bad_signature_is_unauthorized() {
        let body = "text=East+Lake";
        let request = form_request()
            .header(TIMESTAMP_HEADER, Utc::now().timestamp().to_string())
            .header(SIGNATURE_HEADER, format!("v0={}", "0".repeat(64)))
            .body(Body::from(body))
            .unwrap();

        let response = signed_router().oneshot(request).await.unwrap();
        let (status, body) = read_body(response).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("signature mismatch"));
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let request = form_request()
            .body(Body::from("text=East+Lake"))
            .unwrap();

        let response = signed_router().oneshot(request).await.unwrap();
        let (status, body) = read_body(response).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(TIMESTAMP_HEADER));
    }

    #[tokio::test]
    async fn replayed_request_is_unauthorized() {
        let stale = Utc::now().timestamp() - 10 * 60;
        let request = signed_request("text=East+Lake", stale);

        let response = signed_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn extreme_timestamp_is_unauthorized() {
        let request = form_request()
            .header(TIMESTAMP_HEADER, "-9223372036854775800")
            .header(SIGNATURE_HEADER, format!("v0={}", "0".repeat(64)))
            .body(Body::from("text=East+Lake"))
            .unwrap();

        let response = signed_router().oneshot(request).await.unwrap();
        let (status, body) = read_body(response).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("outside the allowed window"), "{body}");
    }

    #[tokio::test]
    async fn unauthenticated_mode_accepts_json() {
        let feed = Arc::new(MockFeed::from_trains(trains()));
        let request = Request::post("/find-arrival")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "Lindbergh Center"}"#))
            .unwrap();

        let response = open_router(feed).oneshot(request).await.unwrap();
        let (status, body) = read_body(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&body).unwrap(),
            serde_json::json!({
                "blocks": [{
                    "type": "section",
                    "text": {"type": "mrkdwn", "text": "*Lindbergh Center* S: 6 min"}
                }]
            })
        );
    }

    #[tokio::test]
    async fn empty_text_is_bad_request() {
        let feed = Arc::new(MockFeed::from_trains(trains()));
        let request = form_request()
            .body(Body::from("text=+"))
            .unwrap();

        let response = open_router(feed).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let feed = Arc::new(MockFeed::from_trains(trains()));
        let request = Request::post("/find-arrival")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();

        let response = open_router(feed).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn feed_failure_is_bad_gateway() {
        let request = form_request()
            .body(Body::from("text=East+Lake"))
            .unwrap();

        let response = open_router(Arc::new(FailingFeed)).oneshot(request).await.unwrap();
        let (status, body) = read_body(response).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("maintenance"));
    }
}
