//! Decode notification / diagnostic system.
//!
//! Non-fatal issues encountered while decoding a stream (unknown opcodes,
//! dropped primitives, state-stack underflow) are collected as
//! `Notification` items rather than being silently dropped or causing hard
//! errors.
//!
//! After a read the caller can inspect
//! [`SceneDocument::notifications`](crate::scene::SceneDocument) to see
//! what was encountered.

use std::fmt;

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A structurally valid record whose identity is not in the opcode table.
    UnknownOpcode,
    /// A geometry record whose coordinate resolution failed; the primitive
    /// was dropped and decoding continued.
    DroppedPrimitive,
    /// A restore with no matching save.
    StackUnderflow,
    /// Decoding stopped early on a cooperative cancellation signal.
    Cancelled,
    /// A structural stream error that terminated decoding (failsafe mode).
    StreamError,
    /// Non-fatal warning (e.g., odd but tolerable payload content).
    Warning,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode => write!(f, "UnknownOpcode"),
            Self::DroppedPrimitive => write!(f, "DroppedPrimitive"),
            Self::StackUnderflow => write!(f, "StackUnderflow"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::StreamError => write!(f, "StreamError"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}

/// A single notification produced while decoding.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The category of issue.
    pub kind: NotificationKind,
    /// A human-readable description.
    pub message: String,
    /// Byte offset of the record that produced this notification, when
    /// one is attributable.
    pub offset: Option<u64>,
}

impl Notification {
    /// Create a new notification with a source offset.
    pub fn at(kind: NotificationKind, offset: u64, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Create a notification with no attributable offset.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(off) => write!(f, "[{}] {:#X}: {}", self.kind, off, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Collects notifications during a decode.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
}

impl NotificationCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a notification attributed to a byte offset.
    pub fn notify_at(&mut self, kind: NotificationKind, offset: u64, message: impl Into<String>) {
        self.items.push(Notification::at(kind, offset, message));
    }

    /// Record a notification with no attributable offset.
    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.items.push(Notification::new(kind, message));
    }

    /// Check if there are any notifications.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over all notifications.
    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    /// Get all notifications of a specific kind.
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.kind == kind).collect()
    }

    /// Check whether any notification of the given kind exists.
    pub fn has_kind(&self, kind: NotificationKind) -> bool {
        self.items.iter().any(|n| n.kind == kind)
    }
}
