//! Slack message payloads and formatting.
//!
//! Both delivery paths (webhook alerts and slash-command replies) use the
//! Block Kit form:
//!
//! ```json
//! {"blocks": [{"type": "section", "text": {"type": "mrkdwn", "text": "..."}}]}
//! ```
//!
//! Station and direction come from an external feed, so they are escaped
//! before being interpolated into mrkdwn.

use serde::{Deserialize, Serialize};

use crate::feed::Train;

/// Error serializing a message.
///
/// Not expected for messages built by this module.
#[derive(Debug, thiserror::Error)]
#[error("failed to serialize message: {0}")]
pub struct FormatError(#[from] serde_json::Error);

/// Block type. Only sections are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Section,
}

/// Text object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Mrkdwn,
}

/// Text content of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
}

/// One line of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub text: TextObject,
}

impl NotificationBlock {
    /// A section block holding already-escaped mrkdwn.
    pub fn section(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Section,
            text: TextObject {
                kind: TextKind::Mrkdwn,
                text: text.into(),
            },
        }
    }
}

/// An ordered list of blocks.
///
/// `blocks` is always serialized, so an empty message is `{"blocks":[]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub blocks: Vec<NotificationBlock>,
}

impl NotificationMessage {
    /// One block per train.
    pub fn arrivals(trains: &[Train]) -> Self {
        Self {
            blocks: build_blocks(trains),
        }
    }

    /// Single-block alert for a boarding train.
    pub fn boarding_alert(train: &Train) -> Self {
        Self {
            blocks: vec![NotificationBlock::section(build_boarding_alert(train))],
        }
    }

    /// Serialize to the JSON body Slack expects.
    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One arrival line per train: station, direction, then wait or boarding status.
pub fn build_blocks(trains: &[Train]) -> Vec<NotificationBlock> {
    trains
        .iter()
        .map(|t| NotificationBlock::section(arrival_line(t)))
        .collect()
}

/// Alert text sent when a train starts boarding.
pub fn build_boarding_alert(train: &Train) -> String {
    format!(
        "{} {} is now boarding",
        escape_mrkdwn(&train.station),
        escape_mrkdwn(&train.direction)
    )
}

fn arrival_line(train: &Train) -> String {
    let status = if train.is_boarding() {
        "boarding now".to_string()
    } else {
        escape_mrkdwn(&train.waiting_time)
    };

    format!(
        "*{}* {}: {}",
        escape_mrkdwn(&train.station),
        escape_mrkdwn(&train.direction),
        status
    )
}

/// Make feed text safe to embed in mrkdwn.
///
/// Slack only requires `&`, `<` and `>` to be escaped. Control characters
/// are also removed; line breaks and tabs become a single space so a value
/// cannot spill onto a new line.
pub fn escape_mrkdwn(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' | '\r' | '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
