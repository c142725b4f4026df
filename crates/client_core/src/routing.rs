use std::sync::{Mutex, PoisonError};

use tracing::debug;

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

pub fn report_list_path() -> String {
    "/report".to_string()
}

/// Navigator that only records where the views asked to go.
#[derive(Default)]
pub struct HistoryNavigator {
    stack: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        debug!("routing: navigate path={path}");
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
