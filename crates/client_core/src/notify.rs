//! Transient user-facing notifications ("flashes").

use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    fn default_heading(self) -> &'static str {
        match self {
            FlashLevel::Success => "Success",
            FlashLevel::Info => "Info",
            FlashLevel::Warning => "Warning",
            FlashLevel::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub heading: String,
    pub message: String,
    pub closable: bool,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            heading: level.default_heading().to_string(),
            message: message.into(),
            closable: true,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }
}

pub trait NotificationSink: Send + Sync {
    fn send_flash(&self, flash: Flash);
}

/// In-memory flash queue; keeps the undismissed flashes and fans every new
/// one out to subscribers.
pub struct FlashQueue {
    pending: Mutex<Vec<Flash>>,
    events: broadcast::Sender<Flash>,
}

impl Default for FlashQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashQueue {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            pending: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Flash> {
        self.events.subscribe()
    }

    pub fn pending(&self) -> Vec<Flash> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn dismiss(&self, index: usize) -> Option<Flash> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if index < pending.len() && pending[index].closable {
            Some(pending.remove(index))
        } else {
            None
        }
    }

    pub fn drain(&self) -> Vec<Flash> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NotificationSink for FlashQueue {
    fn send_flash(&self, flash: Flash) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(flash.clone());
        let _ = self.events.send(flash);
    }
}

#[cfg(test)]
#[path = "tests/notify_tests.rs"]
mod tests;
