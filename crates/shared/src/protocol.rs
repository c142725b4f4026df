use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BanId, BanMessageId, BanReason, BanType, PermissionLevel, ReportId, ReportStatus, ServerId,
    SteamId,
};

/// Envelope wrapped around every API response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub steam_id: SteamId,
    #[serde(default)]
    pub personaname: String,
    #[serde(default)]
    pub realname: String,
    #[serde(default)]
    pub profileurl: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub avatarmedium: String,
    #[serde(default)]
    pub avatarfull: String,
    #[serde(default)]
    pub loccountrycode: String,
    #[serde(default)]
    pub timecreated: i64,
    #[serde(default)]
    pub communityvisibilitystate: i32,
    #[serde(default)]
    pub profilestate: i32,
    #[serde(default)]
    pub personastate: i32,
    #[serde(default)]
    pub personastateflags: i32,
    #[serde(default)]
    pub ip_addr: String,
    #[serde(default)]
    pub vac_bans: i32,
    #[serde(default)]
    pub game_bans: i32,
    #[serde(default)]
    pub economy_ban: String,
    #[serde(default)]
    pub community_banned: bool,
    #[serde(default)]
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player: Person,
    #[serde(default)]
    pub friends: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ban {
    pub ban_id: BanId,
    #[serde(default)]
    pub net_id: i64,
    pub steam_id: SteamId,
    #[serde(default)]
    pub cidr: String,
    pub author_id: SteamId,
    pub ban_type: BanType,
    #[serde(default, with = "zero_as_none")]
    pub reason: Option<BanReason>,
    #[serde(default)]
    pub reason_text: String,
    #[serde(default)]
    pub unban_reason_text: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub source: i32,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, with = "zero_as_none")]
    pub report_id: Option<ReportId>,
    pub valid_until: DateTime<Utc>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// A ban joined with the person it was issued against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannedPerson {
    pub ban: Ban,
    pub person: Person,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BansQueryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<SteamId>,
}

impl BansQueryFilter {
    /// Full history of one subject, deleted bans included.
    pub fn history_for(steam_id: SteamId, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            deleted: Some(true),
            steam_id: Some(steam_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanPayload {
    pub steam_id: SteamId,
    pub duration: String,
    pub ban_type: BanType,
    pub reason: BanReason,
    pub reason_text: String,
    pub note: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<ReportId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnbanPayload {
    pub unban_reason_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub message_id: BanMessageId,
    pub parent_id: BanId,
    pub author_id: SteamId,
    pub message: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorMessage {
    pub message: UserMessage,
    pub author: Person,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBanMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBanMessage {
    pub body_md: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: ReportId,
    pub author_id: SteamId,
    pub reported_id: SteamId,
    pub report_status: ReportStatus,
    #[serde(default, with = "zero_as_none")]
    pub reason: Option<BanReason>,
    #[serde(default)]
    pub reason_text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWithAuthor {
    pub report: Report,
    pub author: Person,
    pub subject: Person,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStatePayload {
    pub status: ReportStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerPlayer {
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steam_id: SteamId,
    #[serde(default)]
    pub ping: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerState {
    pub server_id: ServerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_short: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub cc: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub players: Vec<ServerPlayer>,
    /// Zero when the server did not report a slot count.
    #[serde(default)]
    pub max_players: u32,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiPage {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body_md: String,
    #[serde(default)]
    pub revision: u32,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl WikiPage {
    /// Placeholder shown before a page loads; revision 0 marks it as absent.
    pub fn placeholder(slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            title: String::new(),
            body_md: String::new(),
            revision: 0,
            created_on: now,
            updated_on: now,
        }
    }

    pub fn exists(&self) -> bool {
        self.revision > 0
    }
}

/// Optional enum-like values the backend encodes as `0` when absent.
mod zero_as_none {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_i64(0),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: TryFrom<i64>,
        T::Error: std::fmt::Display,
        D: Deserializer<'de>,
    {
        let raw = Option::<i64>::deserialize(deserializer)?;
        match raw {
            None | Some(0) => Ok(None),
            Some(value) => T::try_from(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
