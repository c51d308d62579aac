//! One-directional notifications from the engine to the host.
//!
//! Subscribers receive events over broadcast channels; nothing in this
//! module calls back into the engine.

use crate::revision::Revision;
use core::fmt;
use log::trace;
use tokio::sync::broadcast;

/// Recoverable problems reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    StyleSheetNotFound,
    ParsingStyleSheetFailed,
    LoadingStyleSheetFailed,
    FontWasNotLoaded,
    PropertyNotFound,
    EngineAlreadyAttached,
}

impl ExceptionKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::StyleSheetNotFound => "styleSheetNotFound",
            Self::ParsingStyleSheetFailed => "parsingStyleSheetFailed",
            Self::LoadingStyleSheetFailed => "loadingStyleSheetFailed",
            Self::FontWasNotLoaded => "fontWasNotLoaded",
            Self::PropertyNotFound => "propertyNotFound",
            Self::EngineAlreadyAttached => "engineAlreadyAttached",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Exception { kind: ExceptionKind, message: String },
    /// A new generation was installed.
    StyleChanged { revision: Revision },
}

impl EngineEvent {
    pub fn exception(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self::Exception {
            kind,
            message: message.into(),
        }
    }
}

/// Per-binding notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingEvent {
    /// The binding now reads from `revision`.
    PropertiesChanged { revision: Revision },
    /// The engine is gone; the binding reads as empty from now on.
    Invalidated,
}

/// Capacity of each bus. A receiver that falls further behind than this
/// sees [`broadcast::error::TryRecvError::Lagged`] and skips ahead.
const CAPACITY: usize = 256;

/// Fan-out to any number of broadcast subscribers. Publishing with nobody
/// listening is not an error.
#[derive(Debug)]
pub struct EventBus<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: &T) {
        if self.sender.send(event.clone()).is_err() {
            trace!("event dropped, no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
