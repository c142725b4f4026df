use url::Url;

use crate::session::Session;

pub const DEFAULT_HEADING: &str = "Permission Denied";
pub const INSUFFICIENT_PERMISSION: &str = "Insufficient permission to access this page.";
const STEAM_OPENID_URL: &str = "https://steamcommunity.com/openid/login";
const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";
const OPENID_IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginBody {
    InsufficientPermission(&'static str),
    SignIn { prompt: String, login_url: Url },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginScreen {
    pub heading: String,
    pub body: LoginBody,
}

/// Steam OpenID sign-in URL that returns to `{return_base}/auth/callback`
/// carrying `current_path` as `return_url`.
pub fn steam_login_url(return_base: &Url, current_path: &str) -> Url {
    let mut callback = return_base.clone();
    callback.set_path("/auth/callback");
    callback.set_query(None);
    callback
        .query_pairs_mut()
        .append_pair("return_url", current_path);

    let mut realm = return_base.clone();
    realm.set_path("/");
    realm.set_query(None);

    let mut url = Url::parse(STEAM_OPENID_URL).unwrap_or_else(|_| callback.clone());
    url.query_pairs_mut()
        .append_pair("openid.ns", OPENID_NS)
        .append_pair("openid.mode", "checkid_setup")
        .append_pair("openid.return_to", callback.as_str())
        .append_pair("openid.realm", realm.as_str())
        .append_pair("openid.identity", OPENID_IDENTIFIER_SELECT)
        .append_pair("openid.claimed_id", OPENID_IDENTIFIER_SELECT);
    url
}

/// Gate shown in place of a page the session may not view.
pub struct LoginView {
    return_base: Url,
}

impl LoginView {
    pub fn new(return_base: Url) -> Self {
        Self { return_base }
    }

    pub fn render(&self, session: &Session, message: Option<&str>, current_path: &str) -> LoginScreen {
        let heading = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_HEADING)
            .to_string();
        let body = if session.is_logged_in() {
            LoginBody::InsufficientPermission(INSUFFICIENT_PERMISSION)
        } else {
            LoginBody::SignIn {
                prompt: "To access this page, please login using your steam account below."
                    .to_string(),
                login_url: steam_login_url(&self.return_base, current_path),
            }
        };
        LoginScreen { heading, body }
    }
}

#[cfg(test)]
#[path = "../tests/login_tests.rs"]
mod tests;
