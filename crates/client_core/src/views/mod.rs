//! Per-page view controllers: fetch on load, reconcile, render from state.

use std::sync::Arc;

use shared::domain::{BanType, PermissionLevel, ReportStatus};

use crate::{
    api::ApiGateway,
    error::ViewError,
    markdown::MarkdownRenderer,
    notify::{Flash, NotificationSink},
    routing::Navigator,
    session::Session,
};

pub mod ban;
pub mod login;
pub mod profile;
pub mod report;
pub mod servers;
pub mod wiki;

/// Collaborators every controller is constructed with.
#[derive(Clone)]
pub struct ViewContext {
    pub api: Arc<dyn ApiGateway>,
    pub session: Arc<Session>,
    pub notifications: Arc<dyn NotificationSink>,
    pub navigator: Arc<dyn Navigator>,
    pub markdown: Arc<dyn MarkdownRenderer>,
}

impl ViewContext {
    pub fn require(&self, required: PermissionLevel) -> Result<(), ViewError> {
        if self.session.has_permission(required) {
            Ok(())
        } else {
            Err(ViewError::Forbidden { required })
        }
    }

    pub fn flash(&self, flash: Flash) {
        self.notifications.send_flash(flash);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started before this one resolved; its result was dropped.
    Stale,
    Failed,
    /// Nothing to fetch for the given parameter.
    Skipped,
}

/// Semantic colour of a label; front ends map it onto their palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub tone: Tone,
}

impl Badge {
    pub fn new(label: impl Into<String>, tone: Tone) -> Self {
        Self {
            label: label.into(),
            tone,
        }
    }
}

pub fn report_status_badge(status: ReportStatus) -> Badge {
    let tone = match status {
        ReportStatus::Opened => Tone::Info,
        ReportStatus::NeedMoreInfo => Tone::Warning,
        ReportStatus::ClosedWithoutAction => Tone::Error,
        ReportStatus::ClosedWithAction => Tone::Success,
    };
    Badge::new(status.label(), tone)
}

/// Heading shown over a subject with an active ban.
pub fn ban_heading(ban_type: BanType) -> Badge {
    match ban_type {
        BanType::Banned => Badge::new("Banned", Tone::Error),
        _ => Badge::new("Muted", Tone::Warning),
    }
}
