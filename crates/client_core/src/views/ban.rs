use shared::{
    domain::{BanId, BanMessageId, BanReason, PermissionLevel, SteamId},
    protocol::{AuthorMessage, BannedPerson, CreateBanMessage, UnbanPayload, UpdateBanMessage},
};
use tracing::{error, info, warn};

use crate::{
    error::ViewError,
    generation::{Loading, Ticket, ViewCell},
    markdown::MarkdownRenderer,
    notify::Flash,
    session::Session,
    views::{ban_heading, Badge, LoadOutcome, ViewContext},
};

#[derive(Debug, Clone, Default)]
pub struct BanState {
    pub ban_id: Option<BanId>,
    pub loading: bool,
    pub ban: Option<BannedPerson>,
    pub messages: Vec<AuthorMessage>,
}

impl Loading for BanState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub message_id: BanMessageId,
    pub author_id: SteamId,
    pub author_name: String,
    pub html: String,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanSummary {
    pub ban_id: BanId,
    pub subject_id: SteamId,
    pub subject_name: String,
    pub heading: Badge,
    pub reason: Option<&'static str>,
    pub reason_text: String,
    pub valid_until: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanScreen {
    pub loading: bool,
    pub summary: Option<BanSummary>,
    pub messages: Vec<MessageRow>,
    pub can_unban: bool,
}

pub fn render_ban(state: &BanState, session: &Session, markdown: &dyn MarkdownRenderer) -> BanScreen {
    let me = session.user().steam_id;
    let moderator = session.can_moderate();
    let summary = state.ban.as_ref().map(|entry| BanSummary {
        ban_id: entry.ban.ban_id,
        subject_id: entry.person.steam_id,
        subject_name: entry.person.personaname.clone(),
        heading: ban_heading(entry.ban.ban_type),
        reason: entry.ban.reason.map(BanReason::label),
        reason_text: entry.ban.reason_text.clone(),
        valid_until: entry.ban.valid_until.format("%Y-%m-%d %H:%M").to_string(),
        deleted: entry.ban.deleted,
    });
    let messages = state
        .messages
        .iter()
        .filter(|m| !m.message.deleted)
        .map(|m| MessageRow {
            message_id: m.message.message_id,
            author_id: m.message.author_id,
            author_name: m.author.personaname.clone(),
            html: markdown.render(&m.message.message),
            editable: moderator || (!me.is_unset() && m.message.author_id == me),
        })
        .collect();
    BanScreen {
        loading: state.loading,
        can_unban: moderator && summary.as_ref().is_some_and(|s| !s.deleted),
        summary,
        messages,
    }
}

pub struct BanController {
    ctx: ViewContext,
    cell: ViewCell<BanState>,
}

impl BanController {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            cell: ViewCell::new(BanState::default()),
        }
    }

    /// Fetches the ban and its message thread concurrently.
    pub async fn load(&self, ban_id: BanId) -> LoadOutcome {
        let (ticket, _loading) = self.cell.begin_load(|state| {
            if state.ban_id != Some(ban_id) {
                state.ban = None;
                state.messages.clear();
            }
            state.ban_id = Some(ban_id);
        });

        let (ban, messages) = futures::join!(
            self.ctx.api.get_ban(ban_id),
            self.ctx.api.list_ban_messages(ban_id)
        );

        match ban {
            Ok(ban) => {
                let messages = messages.unwrap_or_else(|err| {
                    warn!("ban: messages unavailable ban_id={ban_id} err={err}");
                    Vec::new()
                });
                let applied = self.cell.commit(ticket, |state| {
                    state.ban = Some(ban);
                    state.messages = messages;
                });
                if applied {
                    LoadOutcome::Applied
                } else {
                    LoadOutcome::Stale
                }
            }
            Err(err) => {
                if !self.cell.is_current(ticket) {
                    return LoadOutcome::Stale;
                }
                error!("ban: load failed ban_id={ban_id} err={err}");
                self.ctx
                    .flash(Flash::error(format!("Failed to load ban: {err}")));
                LoadOutcome::Failed
            }
        }
    }

    fn loaded_ban_id(&self) -> Result<BanId, ViewError> {
        self.cell
            .read(|state| state.ban.as_ref().map(|entry| entry.ban.ban_id))
            .ok_or(ViewError::NotLoaded)
    }

    async fn reload_messages(&self, ticket: Ticket, ban_id: BanId) {
        match self.ctx.api.list_ban_messages(ban_id).await {
            Ok(messages) => {
                self.cell.commit(ticket, |state| state.messages = messages);
            }
            Err(err) => {
                warn!("ban: message reload failed ban_id={ban_id} err={err}");
            }
        }
    }

    pub async fn post_message(&self, body: &str) -> Result<(), ViewError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ViewError::Invalid("message cannot be empty".into()));
        }
        let ban_id = self.loaded_ban_id()?;
        let ticket = self.cell.ticket();
        let payload = CreateBanMessage {
            message: body.to_string(),
        };
        if let Err(err) = self.ctx.api.create_ban_message(ban_id, &payload).await {
            self.ctx
                .flash(Flash::error(format!("Failed to create message: {err}")));
            return Err(err.into());
        }
        self.reload_messages(ticket, ban_id).await;
        Ok(())
    }

    pub async fn edit_message(&self, message_id: BanMessageId, body: &str) -> Result<(), ViewError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ViewError::Invalid("message cannot be empty".into()));
        }
        let ban_id = self.loaded_ban_id()?;
        let ticket = self.cell.ticket();
        let payload = UpdateBanMessage {
            body_md: body.to_string(),
        };
        if let Err(err) = self.ctx.api.update_ban_message(message_id, &payload).await {
            self.ctx
                .flash(Flash::error(format!("Failed to update message: {err}")));
            return Err(err.into());
        }
        self.reload_messages(ticket, ban_id).await;
        Ok(())
    }

    pub async fn delete_message(&self, message_id: BanMessageId) -> Result<(), ViewError> {
        let ban_id = self.loaded_ban_id()?;
        let ticket = self.cell.ticket();
        if let Err(err) = self.ctx.api.delete_ban_message(message_id).await {
            self.ctx
                .flash(Flash::error(format!("Failed to delete message: {err}")));
            return Err(err.into());
        }
        self.reload_messages(ticket, ban_id).await;
        Ok(())
    }

    /// Lifts the ban with the given reason, then reloads it. Moderator only.
    pub async fn unban(&self, reason: &str) -> Result<(), ViewError> {
        self.ctx.require(PermissionLevel::Moderator)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ViewError::Invalid("unban reason is required".into()));
        }
        let ban_id = self.loaded_ban_id()?;
        let payload = UnbanPayload {
            unban_reason_text: reason.to_string(),
        };
        match self.ctx.api.delete_ban(ban_id, &payload).await {
            Ok(()) => {
                info!("ban: unbanned ban_id={ban_id}");
                self.ctx.flash(Flash::success("Player unbanned"));
                self.load(ban_id).await;
                Ok(())
            }
            Err(err) => {
                self.ctx
                    .flash(Flash::error(format!("Failed to unban: {err}")));
                Err(err.into())
            }
        }
    }

    pub fn snapshot(&self) -> BanState {
        self.cell.snapshot()
    }

    pub fn render(&self) -> BanScreen {
        self.cell
            .read(|state| render_ban(state, &self.ctx.session, self.ctx.markdown.as_ref()))
    }
}

#[cfg(test)]
#[path = "../tests/ban_tests.rs"]
mod tests;
