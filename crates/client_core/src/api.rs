//! Typed gateway over the moderation backend's JSON API.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{BanId, BanMessageId, ReportId, ReportStatus, SteamId},
    error::{ApiError, ErrorCode},
    protocol::{
        ApiEnvelope, AuthorMessage, Ban, BanPayload, BannedPerson, BansQueryFilter,
        CreateBanMessage, Person, PlayerProfile, ReportStatePayload, ReportWithAuthor,
        ServerState, UnbanPayload, UpdateBanMessage, UserMessage, WikiPage,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::GatewayError;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn current_profile(&self) -> GatewayResult<Person>;
    async fn get_profile(&self, steam_id: SteamId) -> GatewayResult<PlayerProfile>;
    async fn list_bans(&self, filter: &BansQueryFilter) -> GatewayResult<Vec<BannedPerson>>;
    async fn get_ban(&self, ban_id: BanId) -> GatewayResult<BannedPerson>;
    async fn create_ban(&self, payload: &BanPayload) -> GatewayResult<Ban>;
    async fn delete_ban(&self, ban_id: BanId, payload: &UnbanPayload) -> GatewayResult<()>;
    async fn list_ban_messages(&self, ban_id: BanId) -> GatewayResult<Vec<AuthorMessage>>;
    async fn create_ban_message(
        &self,
        ban_id: BanId,
        payload: &CreateBanMessage,
    ) -> GatewayResult<UserMessage>;
    async fn update_ban_message(
        &self,
        message_id: BanMessageId,
        payload: &UpdateBanMessage,
    ) -> GatewayResult<()>;
    async fn delete_ban_message(&self, message_id: BanMessageId) -> GatewayResult<()>;
    async fn get_report(&self, report_id: ReportId) -> GatewayResult<ReportWithAuthor>;
    async fn set_report_state(&self, report_id: ReportId, status: ReportStatus)
        -> GatewayResult<()>;
    async fn list_servers(&self) -> GatewayResult<Vec<ServerState>>;
    async fn get_wiki_page(&self, slug: &str) -> GatewayResult<WikiPage>;
    async fn save_wiki_page(&self, page: &WikiPage) -> GatewayResult<WikiPage>;
}

/// Gateway speaking HTTP+JSON to the backend with an optional bearer token.
pub struct HttpApiGateway {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpApiGateway {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid api base url: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("api base url cannot be a base: {base_url}"));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    async fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> GatewayResult<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!("api: request method={method} url={url}");
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|err| {
            warn!("api: transport failure method={method} url={url} err={err}");
            GatewayError::from(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = ErrorCode::from_status(status.as_u16());
        let message = match response.json::<ApiEnvelope<serde_json::Value>>().await {
            Ok(envelope) => envelope
                .message
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };
        warn!("api: request rejected method={method} url={url} status={status} message={message}");
        Err(GatewayError::from_api(ApiError::new(code, message)))
    }

    async fn call<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> GatewayResult<Option<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let envelope: ApiEnvelope<T> = self.send(method, url, body).await?.json().await?;
        if !envelope.status {
            let message = envelope
                .message
                .unwrap_or_else(|| "request failed".to_string());
            return Err(GatewayError::Rejected {
                code: ErrorCode::Internal,
                message,
            });
        }
        Ok(envelope.data)
    }

    async fn fetch<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> GatewayResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.call(method, url, body)
            .await?
            .ok_or_else(|| GatewayError::Decode(format!("response for {path} carried no data")))
    }

    /// List endpoints answer `null` instead of an empty array.
    async fn fetch_list<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GatewayResult<Vec<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        Ok(self
            .call::<B, Vec<T>>(method, url, body)
            .await?
            .unwrap_or_default())
    }

    async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> GatewayResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(path)?;
        self.call::<B, serde_json::Value>(method, url, body)
            .await
            .map(|_| ())
    }
}

const NO_BODY: Option<&()> = None;

#[async_trait]
impl ApiGateway for HttpApiGateway {
    async fn current_profile(&self) -> GatewayResult<Person> {
        self.fetch(Method::GET, "api/current_profile", NO_BODY).await
    }

    async fn get_profile(&self, steam_id: SteamId) -> GatewayResult<PlayerProfile> {
        let mut url = self.endpoint("api/profile")?;
        url.query_pairs_mut()
            .append_pair("query", &steam_id.to_string());
        self.call(Method::GET, url, NO_BODY)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("no profile for {steam_id}")))
    }

    async fn list_bans(&self, filter: &BansQueryFilter) -> GatewayResult<Vec<BannedPerson>> {
        self.fetch_list(Method::POST, "api/bans", Some(filter)).await
    }

    async fn get_ban(&self, ban_id: BanId) -> GatewayResult<BannedPerson> {
        self.fetch(Method::GET, &format!("api/ban/{ban_id}"), NO_BODY)
            .await
    }

    async fn create_ban(&self, payload: &BanPayload) -> GatewayResult<Ban> {
        self.fetch(Method::POST, "api/ban", Some(payload)).await
    }

    async fn delete_ban(&self, ban_id: BanId, payload: &UnbanPayload) -> GatewayResult<()> {
        self.execute(Method::DELETE, &format!("api/ban/{ban_id}"), Some(payload))
            .await
    }

    async fn list_ban_messages(&self, ban_id: BanId) -> GatewayResult<Vec<AuthorMessage>> {
        self.fetch_list(Method::GET, &format!("api/ban/{ban_id}/messages"), NO_BODY)
            .await
    }

    async fn create_ban_message(
        &self,
        ban_id: BanId,
        payload: &CreateBanMessage,
    ) -> GatewayResult<UserMessage> {
        self.fetch(
            Method::POST,
            &format!("api/ban/{ban_id}/messages"),
            Some(payload),
        )
        .await
    }

    async fn update_ban_message(
        &self,
        message_id: BanMessageId,
        payload: &UpdateBanMessage,
    ) -> GatewayResult<()> {
        self.execute(
            Method::POST,
            &format!("api/ban/message/{message_id}"),
            Some(payload),
        )
        .await
    }

    async fn delete_ban_message(&self, message_id: BanMessageId) -> GatewayResult<()> {
        self.execute(
            Method::DELETE,
            &format!("api/ban/message/{message_id}"),
            Some(&serde_json::json!({})),
        )
        .await
    }

    async fn get_report(&self, report_id: ReportId) -> GatewayResult<ReportWithAuthor> {
        self.fetch(Method::GET, &format!("api/report/{report_id}"), NO_BODY)
            .await
    }

    async fn set_report_state(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> GatewayResult<()> {
        self.execute(
            Method::POST,
            &format!("api/report/{report_id}/state"),
            Some(&ReportStatePayload { status }),
        )
        .await
    }

    async fn list_servers(&self) -> GatewayResult<Vec<ServerState>> {
        self.fetch_list(Method::GET, "api/servers", NO_BODY).await
    }

    async fn get_wiki_page(&self, slug: &str) -> GatewayResult<WikiPage> {
        let mut url = self.endpoint("api/wiki/slug/")?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport("api base url cannot carry a path".into()))?
            .pop_if_empty()
            .push(slug);
        match self.call(Method::GET, url, NO_BODY).await? {
            Some(page) => Ok(page),
            None => Ok(WikiPage::placeholder(slug)),
        }
    }

    async fn save_wiki_page(&self, page: &WikiPage) -> GatewayResult<WikiPage> {
        self.fetch(Method::POST, "api/wiki/slug", Some(page)).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
