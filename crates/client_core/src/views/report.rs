use shared::{
    domain::{BanReason, BanType, PermissionLevel, ReportId, ReportStatus, SteamId},
    protocol::{Ban, BanPayload, BansQueryFilter, ReportWithAuthor},
};
use tracing::{error, info, warn};

use crate::{
    bans::BanHistory,
    error::ViewError,
    generation::{Loading, Ticket, ViewCell},
    notify::Flash,
    routing::report_list_path,
    session::Session,
    views::{ban_heading, report_status_badge, Badge, LoadOutcome, ViewContext},
};

pub const REPORT_ACCESS_DENIED: &str =
    "Permission denied. Only report authors, subjects and mods can view reports";
const REPORT_BAN_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct ReportState {
    pub report_id: Option<ReportId>,
    pub loading: bool,
    pub report: Option<ReportWithAuthor>,
    /// State the moderator intends to move the report to.
    pub pending_status: ReportStatus,
    pub bans: BanHistory,
}

impl Loading for ReportState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

/// Moderator input for banning the reported player.
#[derive(Debug, Clone)]
pub struct BanDraft {
    pub duration: String,
    pub ban_type: BanType,
    pub reason: BanReason,
    pub reason_text: String,
    pub note: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectCard {
    pub steam_id: SteamId,
    pub name: String,
    pub avatar: String,
    pub ban: Option<Badge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDetails {
    pub author_id: SteamId,
    pub author_name: String,
    pub reason: Option<&'static str>,
    pub custom_reason: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvePanel {
    pub selected: ReportStatus,
    pub options: [ReportStatus; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRow {
    pub ban_type: Badge,
    pub reason: Option<&'static str>,
    pub deleted: bool,
    pub valid_until: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportScreen {
    pub loading: bool,
    /// `None` while the subject is still loading.
    pub subject: Option<SubjectCard>,
    pub status: Badge,
    pub details: Option<ReportDetails>,
    pub resolve: Option<ResolvePanel>,
    pub ban_history: Vec<BanRow>,
}

pub fn render_report(state: &ReportState, session: &Session) -> ReportScreen {
    let report = state.report.as_ref();
    let status = report
        .map(|r| r.report.report_status)
        .unwrap_or(ReportStatus::Opened);

    let subject = report
        .filter(|r| !r.subject.steam_id.is_unset())
        .map(|r| SubjectCard {
            steam_id: r.subject.steam_id,
            name: r.subject.personaname.clone(),
            avatar: r.subject.avatarfull.clone(),
            ban: state.bans.current().map(|entry| ban_heading(entry.ban.ban_type)),
        });

    let details = report.map(|r| ReportDetails {
        author_id: r.author.steam_id,
        author_name: r.author.personaname.clone(),
        reason: r.report.reason.map(BanReason::label),
        custom_reason: r
            .report
            .reason
            .filter(|_| !r.report.reason_text.is_empty())
            .map(|_| r.report.reason_text.clone()),
        description: r.report.description.clone(),
    });

    let resolve = session.can_moderate().then_some(ResolvePanel {
        selected: state.pending_status,
        options: ReportStatus::ALL,
    });

    let ban_history = state
        .bans
        .entries()
        .iter()
        .map(|entry| BanRow {
            ban_type: ban_heading(entry.ban.ban_type),
            reason: entry.ban.reason.map(BanReason::label),
            deleted: entry.ban.deleted,
            valid_until: entry.ban.valid_until.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    ReportScreen {
        loading: state.loading,
        subject,
        status: report_status_badge(status),
        details,
        resolve,
        ban_history,
    }
}

pub struct ReportController {
    ctx: ViewContext,
    cell: ViewCell<ReportState>,
}

impl ReportController {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            cell: ViewCell::new(ReportState::default()),
        }
    }

    /// Loads the report and then the subject's full ban history.
    pub async fn load(&self, report_id: ReportId) -> LoadOutcome {
        let (ticket, _loading) = self.cell.begin_load(|state| {
            if state.report_id != Some(report_id) {
                state.report = None;
                state.bans = BanHistory::default();
                state.pending_status = ReportStatus::Opened;
            }
            state.report_id = Some(report_id);
        });

        let report = match self.ctx.api.get_report(report_id).await {
            Ok(report) => report,
            Err(err) => {
                if !self.cell.is_current(ticket) {
                    return LoadOutcome::Stale;
                }
                error!("report: load failed report_id={report_id} err={err}");
                if err.is_permission_denied() {
                    self.ctx.flash(Flash::error(REPORT_ACCESS_DENIED));
                    self.ctx.navigator.navigate(&report_list_path());
                } else {
                    self.ctx
                        .flash(Flash::error(format!("Failed to load report: {err}")));
                }
                return LoadOutcome::Failed;
            }
        };

        let subject = report.report.reported_id;
        let applied = self.cell.commit(ticket, |state| {
            state.pending_status = report.report.report_status;
            state.report = Some(report);
        });
        if !applied {
            return LoadOutcome::Stale;
        }

        self.load_bans(ticket, subject).await;
        LoadOutcome::Applied
    }

    async fn load_bans(&self, ticket: Ticket, subject: SteamId) {
        if subject.is_unset() {
            return;
        }
        let filter = BansQueryFilter::history_for(subject, REPORT_BAN_HISTORY_LIMIT);
        match self.ctx.api.list_bans(&filter).await {
            Ok(history) => {
                self.cell.commit(ticket, |state| {
                    state.bans = BanHistory::new(history);
                });
            }
            Err(err) => {
                if self.cell.is_current(ticket) {
                    warn!("report: ban history failed subject={subject} err={err}");
                    self.ctx
                        .flash(Flash::error(format!("Failed to load ban history: {err}")));
                }
            }
        }
    }

    pub async fn reload_bans(&self) {
        let ticket = self.cell.ticket();
        let subject = self.cell.read(|state| {
            state
                .report
                .as_ref()
                .map(|r| r.report.reported_id)
                .unwrap_or_default()
        });
        self.load_bans(ticket, subject).await;
    }

    pub fn select_state(&self, status: ReportStatus) {
        self.cell.update(|state| state.pending_status = status);
    }

    /// Moves the report to the selected state. Moderator only.
    pub async fn apply_state(&self) -> Result<(), ViewError> {
        self.ctx.require(PermissionLevel::Moderator)?;
        let ticket = self.cell.ticket();
        let (report_id, previous, next) = self
            .cell
            .read(|state| {
                state
                    .report
                    .as_ref()
                    .map(|r| (r.report.report_id, r.report.report_status, state.pending_status))
            })
            .ok_or(ViewError::NotLoaded)?;

        match self.ctx.api.set_report_state(report_id, next).await {
            Ok(()) => {
                info!(
                    "report: state changed report_id={report_id} from={:?} to={:?}",
                    previous, next
                );
                self.ctx.flash(Flash::success(format!(
                    "State changed from {} => {}",
                    previous.label(),
                    next.label()
                )));
                self.cell.commit(ticket, |state| {
                    if let Some(report) = state.report.as_mut() {
                        report.report.report_status = next;
                    }
                });
                Ok(())
            }
            Err(err) => {
                self.ctx
                    .flash(Flash::error(format!("Failed to set report state: {err}")));
                Err(err.into())
            }
        }
    }

    /// Bans the reported player, linking the ban to this report. Moderator only.
    pub async fn ban_subject(&self, draft: BanDraft) -> Result<Ban, ViewError> {
        self.ctx.require(PermissionLevel::Moderator)?;
        let (report_id, subject) = self
            .cell
            .read(|state| {
                state
                    .report
                    .as_ref()
                    .map(|r| (r.report.report_id, r.report.reported_id))
            })
            .ok_or(ViewError::NotLoaded)?;
        if draft.duration.trim().is_empty() {
            return Err(ViewError::Invalid("ban duration is required".into()));
        }

        let payload = BanPayload {
            steam_id: subject,
            duration: draft.duration,
            ban_type: draft.ban_type,
            reason: draft.reason,
            reason_text: draft.reason_text,
            note: draft.note,
            network: draft.network,
            report_id: Some(report_id),
        };
        match self.ctx.api.create_ban(&payload).await {
            Ok(ban) => {
                info!("report: subject banned report_id={report_id} ban_id={}", ban.ban_id);
                self.ctx
                    .flash(Flash::success(format!("Ban created for {subject}")));
                self.reload_bans().await;
                Ok(ban)
            }
            Err(err) => {
                self.ctx
                    .flash(Flash::error(format!("Failed to create ban: {err}")));
                Err(err.into())
            }
        }
    }

    pub fn snapshot(&self) -> ReportState {
        self.cell.snapshot()
    }

    pub fn render(&self) -> ReportScreen {
        self.cell.read(|state| render_report(state, &self.ctx.session))
    }
}

#[cfg(test)]
#[path = "../tests/report_tests.rs"]
mod tests;
