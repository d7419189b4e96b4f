use std::sync::mpsc;

use serde::Serialize;
use tracing::Level;

/// What a status event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    LinkOpened,
    FrameStarted,
    ShortRead,
    PayloadReceived,
    IdentifierReceived,
    PayloadTimeout,
    OversizedLength,
    IdentifierDecodeError,
    QueueFull,
    DecodeComplete,
    DecodeFailure,
    RecordStored,
    DuplicateRecord,
    StoreFailure,
    LinkClosed,
    LinkFailure,
}

impl StatusKind {
    /// Log level the event is traced at.
    pub fn level(self) -> Level {
        match self {
            Self::LinkFailure => Level::ERROR,
            Self::PayloadTimeout
            | Self::OversizedLength
            | Self::IdentifierDecodeError
            | Self::QueueFull
            | Self::DecodeFailure
            | Self::StoreFailure => Level::WARN,
            Self::FrameStarted | Self::ShortRead => Level::DEBUG,
            _ => Level::INFO,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinkOpened => "link_opened",
            Self::FrameStarted => "frame_started",
            Self::ShortRead => "short_read",
            Self::PayloadReceived => "payload_received",
            Self::IdentifierReceived => "identifier_received",
            Self::PayloadTimeout => "payload_timeout",
            Self::OversizedLength => "oversized_length",
            Self::IdentifierDecodeError => "identifier_decode_error",
            Self::QueueFull => "queue_full",
            Self::DecodeComplete => "decode_complete",
            Self::DecodeFailure => "decode_failure",
            Self::RecordStored => "record_stored",
            Self::DuplicateRecord => "duplicate_record",
            Self::StoreFailure => "store_failure",
            Self::LinkClosed => "link_closed",
            Self::LinkFailure => "link_failure",
        }
    }
}

/// A status change surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub message: String,
}

/// The single status channel every receiver-side component reports into.
///
/// Events are always traced. They are also forwarded to a listener when one
/// was attached; a listener that went away is ignored.
#[derive(Debug, Clone, Default)]
pub struct StatusSink {
    tx: Option<mpsc::Sender<StatusEvent>>,
}

impl StatusSink {
    /// A sink plus the receiving end of its event channel.
    pub fn channel() -> (Self, mpsc::Receiver<StatusEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that only traces.
    pub fn log_only() -> Self {
        Self::default()
    }

    pub fn emit(&self, kind: StatusKind, message: impl Into<String>) {
        let message = message.into();
        let name = kind.as_str();
        let level = kind.level();
        if level == Level::ERROR {
            tracing::error!(kind = name, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(kind = name, "{message}");
        } else if level == Level::INFO {
            tracing::info!(kind = name, "{message}");
        } else {
            tracing::debug!(kind = name, "{message}");
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(StatusEvent { kind, message });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_the_listener() {
        let (sink, rx) = StatusSink::channel();
        sink.emit(StatusKind::PayloadReceived, "received image: 1000 bytes");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, StatusKind::PayloadReceived);
        assert_eq!(event.message, "received image: 1000 bytes");
    }

    #[test]
    fn dropped_listener_is_ignored() {
        let (sink, rx) = StatusSink::channel();
        drop(rx);
        sink.emit(StatusKind::LinkClosed, "closed");
        StatusSink::log_only().emit(StatusKind::LinkClosed, "closed");
    }

    #[test]
    fn timeouts_are_warnings() {
        assert_eq!(StatusKind::PayloadTimeout.level(), Level::WARN);
        assert_eq!(StatusKind::IdentifierDecodeError.level(), Level::WARN);
        assert_eq!(StatusKind::LinkFailure.level(), Level::ERROR);
        assert_eq!(StatusKind::RecordStored.level(), Level::INFO);
    }

    #[test]
    fn serializes_as_kind_and_message() {
        let event = StatusEvent {
            kind: StatusKind::PayloadTimeout,
            message: "payload timed out".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"payload_timeout","message":"payload timed out"}"#
        );
    }
}
