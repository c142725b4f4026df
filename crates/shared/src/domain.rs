use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(BanId);
id_newtype!(ReportId);
id_newtype!(BanMessageId);
id_newtype!(ServerId);

/// First SteamID64 of the public individual-account universe.
pub const STEAM_ID_BASE: u64 = 76_561_197_960_265_728;

/// 64-bit Steam identifier. Travels as a decimal string on the wire because
/// JSON numbers lose precision past 2^53 in browser clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "SteamIdRepr", into = "String")]
pub struct SteamId(pub u64);

impl SteamId {
    pub fn is_valid_individual(self) -> bool {
        self.0 >= STEAM_ID_BASE && self.0 - STEAM_ID_BASE < (1 << 32)
    }

    pub fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SteamId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(SteamId(0));
        }
        trimmed
            .parse::<u64>()
            .map(SteamId)
            .map_err(|e| format!("invalid steam id {trimmed:?}: {e}"))
    }
}

impl From<SteamId> for String {
    fn from(value: SteamId) -> Self {
        value.0.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SteamIdRepr {
    Text(String),
    Number(u64),
}

impl TryFrom<SteamIdRepr> for SteamId {
    type Error = String;

    fn try_from(value: SteamIdRepr) -> Result<Self, Self::Error> {
        match value {
            SteamIdRepr::Text(text) => text.parse(),
            SteamIdRepr::Number(n) => Ok(SteamId(n)),
        }
    }
}

/// Ordered privilege tier. Comparison follows the numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum PermissionLevel {
    Banned = 0,
    #[default]
    Guest = 1,
    User = 10,
    Editor = 25,
    Moderator = 50,
    Admin = 100,
}

impl TryFrom<u8> for PermissionLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Banned,
            1 => Self::Guest,
            10 => Self::User,
            25 => Self::Editor,
            50 => Self::Moderator,
            100 => Self::Admin,
            other => return Err(format!("unknown permission level {other}")),
        })
    }
}

impl From<PermissionLevel> for u8 {
    fn from(value: PermissionLevel) -> Self {
        value as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum BanType {
    #[default]
    Unknown,
    Ok,
    NoComm,
    Banned,
}

impl TryFrom<i32> for BanType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            -1 => Self::Unknown,
            0 => Self::Ok,
            1 => Self::NoComm,
            2 => Self::Banned,
            other => return Err(format!("unknown ban type {other}")),
        })
    }
}

impl From<BanType> for i32 {
    fn from(value: BanType) -> Self {
        match value {
            BanType::Unknown => -1,
            BanType::Ok => 0,
            BanType::NoComm => 1,
            BanType::Banned => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum BanReason {
    Custom,
    External,
    Cheating,
    Racism,
    Harassment,
    Exploiting,
    WarningsExceeded,
    Spam,
    Language,
    Profile,
    ItemDescriptions,
    BotHost,
}

impl BanReason {
    /// Order in which reasons are offered when filing a ban.
    pub const SELECTABLE: [BanReason; 11] = [
        BanReason::Cheating,
        BanReason::Racism,
        BanReason::Harassment,
        BanReason::Exploiting,
        BanReason::WarningsExceeded,
        BanReason::Spam,
        BanReason::Language,
        BanReason::Profile,
        BanReason::ItemDescriptions,
        BanReason::External,
        BanReason::Custom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BanReason::Custom => "Custom",
            BanReason::External => "3rd party",
            BanReason::Cheating => "Cheating",
            BanReason::Racism => "Racism",
            BanReason::Harassment => "Person Harassment",
            BanReason::Exploiting => "Exploiting",
            BanReason::WarningsExceeded => "Warnings Exceeding",
            BanReason::Spam => "Spam",
            BanReason::Language => "Language",
            BanReason::Profile => "Profile",
            BanReason::ItemDescriptions => "Item Name/Descriptions",
            BanReason::BotHost => "Bot Host",
        }
    }
}

impl TryFrom<i32> for BanReason {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Custom,
            2 => Self::External,
            3 => Self::Cheating,
            4 => Self::Racism,
            5 => Self::Harassment,
            6 => Self::Exploiting,
            7 => Self::WarningsExceeded,
            8 => Self::Spam,
            9 => Self::Language,
            10 => Self::Profile,
            11 => Self::ItemDescriptions,
            12 => Self::BotHost,
            other => return Err(format!("unknown ban reason {other}")),
        })
    }
}

impl TryFrom<i64> for BanReason {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        i32::try_from(value)
            .map_err(|_| format!("unknown ban reason {value}"))
            .and_then(Self::try_from)
    }
}

impl From<BanReason> for i32 {
    fn from(value: BanReason) -> Self {
        match value {
            BanReason::Custom => 1,
            BanReason::External => 2,
            BanReason::Cheating => 3,
            BanReason::Racism => 4,
            BanReason::Harassment => 5,
            BanReason::Exploiting => 6,
            BanReason::WarningsExceeded => 7,
            BanReason::Spam => 8,
            BanReason::Language => 9,
            BanReason::Profile => 10,
            BanReason::ItemDescriptions => 11,
            BanReason::BotHost => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ReportStatus {
    #[default]
    Opened,
    NeedMoreInfo,
    ClosedWithoutAction,
    ClosedWithAction,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Opened,
        ReportStatus::NeedMoreInfo,
        ReportStatus::ClosedWithoutAction,
        ReportStatus::ClosedWithAction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Opened => "Opened",
            ReportStatus::NeedMoreInfo => "Need More Info",
            ReportStatus::ClosedWithoutAction => "Closed without action",
            ReportStatus::ClosedWithAction => "Closed with action",
        }
    }
}

impl TryFrom<i32> for ReportStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Opened,
            1 => Self::NeedMoreInfo,
            2 => Self::ClosedWithoutAction,
            3 => Self::ClosedWithAction,
            other => return Err(format!("unknown report status {other}")),
        })
    }
}

impl From<ReportStatus> for i32 {
    fn from(value: ReportStatus) -> Self {
        match value {
            ReportStatus::Opened => 0,
            ReportStatus::NeedMoreInfo => 1,
            ReportStatus::ClosedWithoutAction => 2,
            ReportStatus::ClosedWithAction => 3,
        }
    }
}
