//! Hand-written gateway fake and context builders shared by the view tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::{
    domain::{
        BanId, BanMessageId, BanReason, BanType, PermissionLevel, ReportId, ReportStatus, SteamId,
        STEAM_ID_BASE,
    },
    protocol::{
        AuthorMessage, Ban, BanPayload, BannedPerson, BansQueryFilter, CreateBanMessage, Person,
        PlayerProfile, Report, ReportWithAuthor, ServerState, UnbanPayload, UpdateBanMessage,
        UserMessage, WikiPage,
    },
};
use tokio::sync::Notify;

use crate::{
    api::{ApiGateway, GatewayResult},
    error::GatewayError,
    markdown::CmarkRenderer,
    notify::FlashQueue,
    routing::HistoryNavigator,
    session::{CurrentUser, Session},
    views::ViewContext,
};

pub(crate) const MODERATOR_ID: SteamId = SteamId(STEAM_ID_BASE + 1);
pub(crate) const PLAYER_ID: SteamId = SteamId(STEAM_ID_BASE + 2);
pub(crate) const SUBJECT_ID: SteamId = SteamId(STEAM_ID_BASE + 3);

fn not_found(what: impl std::fmt::Display) -> GatewayError {
    GatewayError::NotFound(what.to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

pub(crate) struct FakeGateway {
    pub current: Mutex<Option<Person>>,
    pub profiles: Mutex<HashMap<SteamId, GatewayResult<PlayerProfile>>>,
    pub ban_history: Mutex<GatewayResult<Vec<BannedPerson>>>,
    pub ban_filters: Mutex<Vec<BansQueryFilter>>,
    pub bans: Mutex<HashMap<BanId, GatewayResult<BannedPerson>>>,
    pub messages: Mutex<GatewayResult<Vec<AuthorMessage>>>,
    pub created_bans: Mutex<Vec<BanPayload>>,
    pub create_ban_error: Mutex<Option<GatewayError>>,
    pub unbans: Mutex<Vec<(BanId, UnbanPayload)>>,
    pub message_ops: Mutex<Vec<String>>,
    pub reports: Mutex<HashMap<ReportId, GatewayResult<ReportWithAuthor>>>,
    pub state_changes: Mutex<Vec<(ReportId, ReportStatus)>>,
    pub state_error: Mutex<Option<GatewayError>>,
    pub servers: Mutex<GatewayResult<Vec<ServerState>>>,
    pub wiki: Mutex<HashMap<String, GatewayResult<WikiPage>>>,
    pub saved_pages: Mutex<Vec<WikiPage>>,
    pub save_error: Mutex<Option<GatewayError>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            profiles: Mutex::new(HashMap::new()),
            ban_history: Mutex::new(Ok(Vec::new())),
            ban_filters: Mutex::new(Vec::new()),
            bans: Mutex::new(HashMap::new()),
            messages: Mutex::new(Ok(Vec::new())),
            created_bans: Mutex::new(Vec::new()),
            create_ban_error: Mutex::new(None),
            unbans: Mutex::new(Vec::new()),
            message_ops: Mutex::new(Vec::new()),
            reports: Mutex::new(HashMap::new()),
            state_changes: Mutex::new(Vec::new()),
            state_error: Mutex::new(None),
            servers: Mutex::new(Ok(Vec::new())),
            wiki: Mutex::new(HashMap::new()),
            saved_pages: Mutex::new(Vec::new()),
            save_error: Mutex::new(None),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Holds the next request for `key` (e.g. `wiki:home`) until the
    /// returned notify is signalled.
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.gates).insert(key.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        lock(&self.calls).get(endpoint).copied().unwrap_or(0)
    }

    async fn enter(&self, endpoint: &'static str, key: String) {
        *lock(&self.calls).entry(endpoint).or_default() += 1;
        let gate = lock(&self.gates).remove(&key);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ApiGateway for FakeGateway {
    async fn current_profile(&self) -> GatewayResult<Person> {
        self.enter("current_profile", "current".into()).await;
        lock(&self.current)
            .clone()
            .ok_or_else(|| GatewayError::PermissionDenied("no token".into()))
    }

    async fn get_profile(&self, steam_id: SteamId) -> GatewayResult<PlayerProfile> {
        self.enter("get_profile", format!("profile:{steam_id}")).await;
        lock(&self.profiles)
            .get(&steam_id)
            .cloned()
            .unwrap_or_else(|| Err(not_found(steam_id)))
    }

    async fn list_bans(&self, filter: &BansQueryFilter) -> GatewayResult<Vec<BannedPerson>> {
        self.enter("list_bans", "bans".into()).await;
        lock(&self.ban_filters).push(filter.clone());
        lock(&self.ban_history).clone()
    }

    async fn get_ban(&self, ban_id: BanId) -> GatewayResult<BannedPerson> {
        self.enter("get_ban", format!("ban:{ban_id}")).await;
        lock(&self.bans)
            .get(&ban_id)
            .cloned()
            .unwrap_or_else(|| Err(not_found(ban_id)))
    }

    async fn create_ban(&self, payload: &BanPayload) -> GatewayResult<Ban> {
        self.enter("create_ban", "create_ban".into()).await;
        if let Some(err) = lock(&self.create_ban_error).clone() {
            return Err(err);
        }
        lock(&self.created_bans).push(payload.clone());
        let mut created = ban(900, payload.steam_id, false, 1);
        created.ban_type = payload.ban_type;
        created.reason = Some(payload.reason);
        created.report_id = payload.report_id;
        Ok(created)
    }

    async fn delete_ban(&self, ban_id: BanId, payload: &UnbanPayload) -> GatewayResult<()> {
        self.enter("delete_ban", format!("unban:{ban_id}")).await;
        lock(&self.unbans).push((ban_id, payload.clone()));
        if let Some(Ok(entry)) = lock(&self.bans).get_mut(&ban_id) {
            entry.ban.deleted = true;
            entry.ban.unban_reason_text = payload.unban_reason_text.clone();
        }
        Ok(())
    }

    async fn list_ban_messages(&self, ban_id: BanId) -> GatewayResult<Vec<AuthorMessage>> {
        self.enter("list_ban_messages", format!("messages:{ban_id}")).await;
        lock(&self.messages).clone()
    }

    async fn create_ban_message(
        &self,
        ban_id: BanId,
        payload: &CreateBanMessage,
    ) -> GatewayResult<UserMessage> {
        self.enter("create_ban_message", "message".into()).await;
        lock(&self.message_ops).push(format!("create {ban_id} {}", payload.message));
        let next_id = lock(&self.messages).as_ref().map_or(0, |m| m.len()) as i64 + 1;
        let message = user_message(next_id, ban_id, MODERATOR_ID, &payload.message);
        if let Ok(messages) = lock(&self.messages).as_mut() {
            messages.push(AuthorMessage {
                message: message.clone(),
                author: person(MODERATOR_ID, "mod"),
            });
        }
        Ok(message)
    }

    async fn update_ban_message(
        &self,
        message_id: BanMessageId,
        payload: &UpdateBanMessage,
    ) -> GatewayResult<()> {
        self.enter("update_ban_message", "message".into()).await;
        lock(&self.message_ops).push(format!("update {message_id} {}", payload.body_md));
        Ok(())
    }

    async fn delete_ban_message(&self, message_id: BanMessageId) -> GatewayResult<()> {
        self.enter("delete_ban_message", "message".into()).await;
        lock(&self.message_ops).push(format!("delete {message_id}"));
        Ok(())
    }

    async fn get_report(&self, report_id: ReportId) -> GatewayResult<ReportWithAuthor> {
        self.enter("get_report", format!("report:{report_id}")).await;
        lock(&self.reports)
            .get(&report_id)
            .cloned()
            .unwrap_or_else(|| Err(not_found(report_id)))
    }

    async fn set_report_state(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> GatewayResult<()> {
        self.enter("set_report_state", format!("state:{report_id}")).await;
        if let Some(err) = lock(&self.state_error).clone() {
            return Err(err);
        }
        lock(&self.state_changes).push((report_id, status));
        Ok(())
    }

    async fn list_servers(&self) -> GatewayResult<Vec<ServerState>> {
        self.enter("list_servers", "servers".into()).await;
        lock(&self.servers).clone()
    }

    async fn get_wiki_page(&self, slug: &str) -> GatewayResult<WikiPage> {
        self.enter("get_wiki_page", format!("wiki:{slug}")).await;
        lock(&self.wiki)
            .get(slug)
            .cloned()
            .unwrap_or_else(|| Ok(WikiPage::placeholder(slug)))
    }

    async fn save_wiki_page(&self, page: &WikiPage) -> GatewayResult<WikiPage> {
        self.enter("save_wiki_page", format!("save:{}", page.slug)).await;
        if let Some(err) = lock(&self.save_error).clone() {
            return Err(err);
        }
        lock(&self.saved_pages).push(page.clone());
        let mut saved = page.clone();
        saved.revision += 1;
        Ok(saved)
    }
}

pub(crate) struct Harness {
    pub api: Arc<FakeGateway>,
    pub flashes: Arc<FlashQueue>,
    pub navigator: Arc<HistoryNavigator>,
    pub ctx: ViewContext,
}

pub(crate) fn harness(level: PermissionLevel) -> Harness {
    harness_with(FakeGateway::new(), level)
}

pub(crate) fn harness_with(api: FakeGateway, level: PermissionLevel) -> Harness {
    let api = Arc::new(api);
    let flashes = Arc::new(FlashQueue::new());
    let navigator = Arc::new(HistoryNavigator::new());
    let steam_id = if level >= PermissionLevel::Moderator {
        MODERATOR_ID
    } else {
        PLAYER_ID
    };
    let session = Session::new(CurrentUser {
        steam_id,
        name: "tester".into(),
        permission_level: level,
    });
    let ctx = ViewContext {
        api: api.clone(),
        session: Arc::new(session),
        notifications: flashes.clone(),
        navigator: navigator.clone(),
        markdown: Arc::new(CmarkRenderer),
    };
    Harness {
        api,
        flashes,
        navigator,
        ctx,
    }
}

pub(crate) fn person(steam_id: SteamId, name: &str) -> Person {
    Person {
        steam_id,
        personaname: name.to_string(),
        ..Person::default()
    }
}

pub(crate) fn ban(id: i64, steam_id: SteamId, deleted: bool, day: u32) -> Ban {
    let at = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
    Ban {
        ban_id: BanId(id),
        net_id: 0,
        steam_id,
        cidr: String::new(),
        author_id: MODERATOR_ID,
        ban_type: BanType::Banned,
        reason: Some(BanReason::Cheating),
        reason_text: String::new(),
        unban_reason_text: String::new(),
        note: String::new(),
        source: 0,
        deleted,
        report_id: None,
        valid_until: at + chrono::Duration::days(30),
        created_on: at,
        updated_on: at,
    }
}

pub(crate) fn banned(id: i64, steam_id: SteamId, deleted: bool, ban_type: BanType) -> BannedPerson {
    let mut entry = ban(id, steam_id, deleted, 1 + id as u32 % 28);
    entry.ban_type = ban_type;
    BannedPerson {
        ban: entry,
        person: person(steam_id, "subject"),
    }
}

pub(crate) fn report(id: i64, status: ReportStatus) -> ReportWithAuthor {
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
    ReportWithAuthor {
        report: Report {
            report_id: ReportId(id),
            author_id: PLAYER_ID,
            reported_id: SUBJECT_ID,
            report_status: status,
            reason: Some(BanReason::Cheating),
            reason_text: String::new(),
            description: "aimbot on badwater".into(),
            deleted: false,
            created_on: at,
            updated_on: at,
        },
        author: person(PLAYER_ID, "reporter"),
        subject: person(SUBJECT_ID, "suspect"),
    }
}

pub(crate) fn user_message(id: i64, ban_id: BanId, author: SteamId, body: &str) -> UserMessage {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    UserMessage {
        message_id: BanMessageId(id),
        parent_id: ban_id,
        author_id: author,
        message: body.to_string(),
        deleted: false,
        created_on: at,
        updated_on: at,
    }
}

pub(crate) fn wiki_page(slug: &str, body: &str, revision: u32) -> WikiPage {
    WikiPage {
        slug: slug.to_string(),
        title: slug.to_string(),
        body_md: body.to_string(),
        revision,
        ..WikiPage::placeholder(slug)
    }
}

pub(crate) fn server(id: i64, region: &str, players: usize, max_players: u32) -> ServerState {
    ServerState {
        server_id: id.into(),
        name: format!("server-{id}"),
        region: region.to_string(),
        host: "10.0.0.1".into(),
        port: 27015,
        players: (0..players)
            .map(|n| shared::protocol::ServerPlayer {
                name: format!("p{n}"),
                ..Default::default()
            })
            .collect(),
        max_players,
        ..ServerState::default()
    }
}
