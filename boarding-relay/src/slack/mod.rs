//! Slack integration: request verification, message formatting and
//! webhook delivery.

pub mod message;
mod verifier;
mod webhook;

pub use message::{FormatError, NotificationBlock, NotificationMessage};
pub use verifier::{
    AuthError, DEFAULT_VERSION, MAX_SIGNATURE_AGE, RequestVerifier, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
pub use webhook::{DispatchError, Notifier, WebhookDispatcher};
