use shared::{domain::PermissionLevel, protocol::WikiPage};
use tracing::{error, info};

use crate::{
    error::ViewError,
    generation::{Loading, ViewCell},
    markdown::MarkdownRenderer,
    notify::Flash,
    session::Session,
    views::{LoadOutcome, ViewContext},
};

pub const DEFAULT_SLUG: &str = "home";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiMode {
    Loading,
    NotFound,
    Viewing,
    Editing,
}

#[derive(Debug, Clone, Default)]
pub struct WikiState {
    /// Slug of the active route.
    pub slug: String,
    pub page: Option<WikiPage>,
    pub loading: bool,
    pub editing: bool,
    pub draft: String,
    pub saving: bool,
}

impl WikiState {
    pub fn mode(&self) -> WikiMode {
        if self.editing {
            return WikiMode::Editing;
        }
        if self.loading {
            return WikiMode::Loading;
        }
        match &self.page {
            Some(page) if page.exists() => WikiMode::Viewing,
            _ => WikiMode::NotFound,
        }
    }
}

impl Loading for WikiState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiScreen {
    Loading,
    NotFound {
        slug: String,
        can_create: bool,
    },
    Viewing {
        title: String,
        html: String,
        can_edit: bool,
    },
    Editing {
        slug: String,
        draft: String,
        saving: bool,
    },
}

pub fn render_wiki(state: &WikiState, session: &Session, markdown: &dyn MarkdownRenderer) -> WikiScreen {
    let can_moderate = session.can_moderate();
    match (state.mode(), state.page.as_ref()) {
        (WikiMode::Editing, _) => WikiScreen::Editing {
            slug: state.slug.clone(),
            draft: state.draft.clone(),
            saving: state.saving,
        },
        (WikiMode::Viewing, Some(page)) => WikiScreen::Viewing {
            title: page.title.clone(),
            html: if page.body_md.is_empty() {
                String::new()
            } else {
                markdown.render(&page.body_md)
            },
            can_edit: can_moderate,
        },
        (WikiMode::NotFound, _) => WikiScreen::NotFound {
            slug: state.slug.clone(),
            can_create: can_moderate,
        },
        _ => WikiScreen::Loading,
    }
}

pub struct WikiController {
    ctx: ViewContext,
    cell: ViewCell<WikiState>,
}

impl WikiController {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            cell: ViewCell::new(WikiState::default()),
        }
    }

    /// Loads the page for `slug`, or `home` when the route carries none.
    /// A missing page resolves to a revision 0 placeholder.
    pub async fn load(&self, slug: Option<&str>) -> LoadOutcome {
        let slug = slug
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SLUG)
            .to_string();
        let (ticket, _loading) = self.cell.begin_load(|state| {
            if state.slug != slug {
                state.page = None;
                state.editing = false;
                state.draft.clear();
            }
            state.slug = slug.clone();
        });

        let page = match self.ctx.api.get_wiki_page(&slug).await {
            Ok(page) => page,
            Err(err) if err.is_not_found() => WikiPage::placeholder(&slug),
            Err(err) => {
                if !self.cell.is_current(ticket) {
                    return LoadOutcome::Stale;
                }
                error!("wiki: load failed slug={slug} err={err}");
                self.ctx
                    .flash(Flash::error(format!("Failed to load wiki page: {err}")));
                // keep what was shown before; a fresh slug falls back to the empty page
                self.cell.commit(ticket, |state| {
                    state
                        .page
                        .get_or_insert_with(|| WikiPage::placeholder(&slug));
                });
                return LoadOutcome::Failed;
            }
        };

        if self.cell.commit(ticket, |state| state.page = Some(page)) {
            LoadOutcome::Applied
        } else {
            LoadOutcome::Stale
        }
    }

    /// Enters edit mode seeded with the current body. Moderator only.
    pub fn begin_edit(&self) -> Result<(), ViewError> {
        self.ctx.require(PermissionLevel::Moderator)?;
        self.cell.update(|state| {
            let body = match (&state.page, state.loading) {
                (Some(page), false) => page.body_md.clone(),
                _ => return Err(ViewError::NotLoaded),
            };
            state.draft = body;
            state.editing = true;
            Ok(())
        })
    }

    pub fn update_draft(&self, body: impl Into<String>) {
        let body = body.into();
        self.cell.update(|state| {
            if state.editing {
                state.draft = body;
            }
        });
    }

    pub fn cancel_edit(&self) {
        self.cell.update(|state| {
            state.editing = false;
            state.draft.clear();
        });
    }

    /// Saves `body` under the active route slug. On failure edit mode and the
    /// draft are kept. Moderator only.
    pub async fn save(&self, body: impl Into<String>) -> Result<WikiPage, ViewError> {
        self.ctx.require(PermissionLevel::Moderator)?;
        let body = body.into();
        let ticket = self.cell.ticket();
        let page = self.cell.update(|state| {
            let mut page = state.page.clone()?;
            page.slug = state.slug.clone();
            page.body_md = body.clone();
            state.draft = body;
            state.saving = true;
            Some(page)
        });
        let page = page.ok_or(ViewError::NotLoaded)?;

        let result = self.ctx.api.save_wiki_page(&page).await;
        self.cell.update(|state| state.saving = false);
        match result {
            Ok(saved) => {
                info!("wiki: page saved slug={} revision={}", page.slug, saved.revision);
                self.cell.commit(ticket, |state| {
                    state.page = Some(saved.clone());
                    state.editing = false;
                    state.draft.clear();
                });
                self.ctx.flash(
                    Flash::success(format!("Slug {} updated", page.slug))
                        .with_heading("Saved wiki page"),
                );
                Ok(saved)
            }
            Err(err) => {
                error!("wiki: save failed slug={} err={err}", page.slug);
                Err(err.into())
            }
        }
    }

    pub fn snapshot(&self) -> WikiState {
        self.cell.snapshot()
    }

    pub fn mode(&self) -> WikiMode {
        self.cell.read(WikiState::mode)
    }

    pub fn render(&self) -> WikiScreen {
        self.cell
            .read(|state| render_wiki(state, &self.ctx.session, self.ctx.markdown.as_ref()))
    }
}

#[cfg(test)]
#[path = "../tests/wiki_tests.rs"]
mod tests;
