//! Outbound Slack incoming-webhook delivery.
//!
//! One POST per message, no retries. A failed delivery is reported to the
//! caller, which decides whether to log and move on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use super::message::{FormatError, NotificationMessage};

/// Errors delivering a message to a webhook.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook answered with a non-success status
    #[error("webhook rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Something that can deliver a message to the team channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &NotificationMessage) -> Result<(), DispatchError>;
}

/// Delivers messages to a Slack incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    http: reqwest::Client,
    webhook_url: Url,
}

impl WebhookDispatcher {
    /// Create a dispatcher posting to `webhook_url`, giving up on any
    /// single request after `timeout`.
    pub fn new(webhook_url: Url, timeout: Duration) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, webhook_url })
    }

    /// POST `message` as JSON to `webhook_url`.
    pub async fn send(
        &self,
        webhook_url: &Url,
        message: &NotificationMessage,
    ) -> Result<(), DispatchError> {
        let body = message.to_json()?;
        debug!(
            origin = %log_target(webhook_url),
            blocks = message.blocks.len(),
            "posting to webhook"
        );

        let response = self
            .http
            .post(webhook_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Scheme, host and port of `url`. Webhook paths carry the credential and
/// must stay out of the logs.
fn log_target(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[async_trait]
impl Notifier for WebhookDispatcher {
    async fn notify(&self, message: &NotificationMessage) -> Result<(), DispatchError> {
        self.send(&self.webhook_url, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Train;
    use httpmock::prelude::*;

    fn dispatcher_for(server: &MockServer) -> WebhookDispatcher {
        let url = Url::parse(&server.url("/services/T000/B000/XXXX")).unwrap();
        WebhookDispatcher::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn posts_blocks_as_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/services/T000/B000/XXXX")
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "blocks": [{
                            "type": "section",
                            "text": {"type": "mrkdwn", "text": "Five Points N is now boarding"}
                        }]
                    }));
                then.status(200).body("ok");
            })
            .await;

        let message = NotificationMessage::boarding_alert(&Train::new("Five Points", "N", "Boarding"));
        dispatcher_for(&server).notify(&message).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_rejected_without_retry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(404).body("no_service");
            })
            .await;

        let err = dispatcher_for(&server)
            .notify(&NotificationMessage::default())
            .await
            .unwrap_err();

        match err {
            DispatchError::Rejected { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no_service");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn send_targets_given_url() {
        let server = MockServer::start_async().await;
        let other = server
            .mock_async(|when, then| {
                when.method(POST).path("/other");
                then.status(200);
            })
            .await;

        let dispatcher = dispatcher_for(&server);
        let url = Url::parse(&server.url("/other")).unwrap();
        dispatcher
            .send(&url, &NotificationMessage::default())
            .await
            .unwrap();

        other.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_webhook_is_http_error() {
        let url = Url::parse("http://127.0.0.1:1/hook").unwrap();
        let dispatcher = WebhookDispatcher::new(url, Duration::from_secs(2)).unwrap();

        let err = dispatcher
            .notify(&NotificationMessage::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Http(_)));
        assert!(!err.to_string().contains("/hook"), "{err}");
    }

    #[tokio::test]
    async fn stalled_webhook_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).delay(Duration::from_secs(3));
            })
            .await;

        let url = Url::parse(&server.url("/services/T000/B000/XXXX")).unwrap();
        let dispatcher = WebhookDispatcher::new(url, Duration::from_secs(1)).unwrap();

        let err = dispatcher
            .notify(&NotificationMessage::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, DispatchError::Http(ref e) if e.is_timeout()),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn log_target_omits_credential_path() {
        let url = Url::parse("https://hooks.slack.com/services/T000/B000/XXXX?token=abc").unwrap();
        let target = log_target(&url);

        assert_eq!(target, "https://hooks.slack.com");
        assert!(!target.contains("XXXX"));
        assert!(!target.contains("token"));

        let local = Url::parse("http://127.0.0.1:8080/hook").unwrap();
        assert_eq!(log_target(&local), "http://127.0.0.1:8080");
    }
}
