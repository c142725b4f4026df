//! Headless client core of the moderation panel: a typed API gateway, the
//! collaborators views are built from, and one controller per page.

pub mod api;
pub mod bans;
pub mod error;
pub mod generation;
pub mod markdown;
pub mod notify;
pub mod routing;
pub mod session;
pub mod views;

pub use api::{ApiGateway, GatewayResult, HttpApiGateway};
pub use error::{GatewayError, ViewError};
pub use markdown::{CmarkRenderer, MarkdownRenderer};
pub use notify::{Flash, FlashLevel, FlashQueue, NotificationSink};
pub use routing::{HistoryNavigator, Navigator};
pub use session::{CurrentUser, Session};
pub use views::{
    ban::BanController, login::LoginView, profile::ProfileController, report::ReportController,
    servers::ServerBrowser, wiki::WikiController, LoadOutcome, ViewContext,
};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
