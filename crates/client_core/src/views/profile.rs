use chrono::{DateTime, NaiveDate};
use shared::{
    domain::SteamId,
    protocol::{BansQueryFilter, PlayerProfile},
};
use tracing::{error, warn};

use crate::{
    bans::BanHistory,
    generation::{Loading, ViewCell},
    notify::Flash,
    views::{ban_heading, Badge, LoadOutcome, Tone, ViewContext},
};

const PROFILE_BAN_LIMIT: u32 = 25;

#[derive(Debug, Clone, Default)]
pub struct ProfileState {
    pub steam_id: Option<SteamId>,
    pub loading: bool,
    pub profile: Option<PlayerProfile>,
    pub bans: BanHistory,
}

impl Loading for ProfileState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub title: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendEntry {
    pub steam_id: SteamId,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCard {
    pub steam_id: SteamId,
    pub name: String,
    pub real_name: String,
    pub avatar: String,
    pub created: Option<NaiveDate>,
    pub community_status: Vec<Badge>,
    pub current_ban: Option<Badge>,
    pub links: Vec<ExternalLink>,
    pub friends: Vec<FriendEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileScreen {
    Loading,
    Empty,
    Loaded(Box<ProfileCard>),
}

pub fn external_links(steam_id: SteamId) -> Vec<ExternalLink> {
    [
        ("Steam", "https://steamcommunity.com/profiles/"),
        ("SteamID.uk", "https://steamid.uk/profile/"),
        ("Logs.tf", "https://logs.tf/profile/"),
        ("RGL", "https://rgl.gg/Public/PlayerProfile.aspx?p="),
        ("ETF2L", "https://etf2l.org/search/"),
        ("Backpack.tf", "https://backpack.tf/profiles/"),
    ]
    .into_iter()
    .map(|(title, prefix)| ExternalLink {
        title,
        url: format!("{prefix}{steam_id}"),
    })
    .collect()
}

fn flag(label: &str, raised: bool) -> Badge {
    Badge::new(label, if raised { Tone::Error } else { Tone::Success })
}

pub fn render_profile(state: &ProfileState) -> ProfileScreen {
    if state.loading {
        return ProfileScreen::Loading;
    }
    let Some(profile) = state.profile.as_ref().filter(|p| !p.player.steam_id.is_unset()) else {
        return ProfileScreen::Empty;
    };
    let player = &profile.player;

    ProfileScreen::Loaded(Box::new(ProfileCard {
        steam_id: player.steam_id,
        name: player.personaname.clone(),
        real_name: player.realname.clone(),
        avatar: player.avatarfull.clone(),
        created: DateTime::from_timestamp(player.timecreated, 0).map(|t| t.date_naive()),
        community_status: vec![
            flag("VAC", player.vac_bans > 0),
            flag("Game Ban", player.game_bans > 0),
            flag(
                "Economy Ban",
                !player.economy_ban.is_empty() && player.economy_ban != "none",
            ),
            flag("Community Ban", player.community_banned),
        ],
        current_ban: state.bans.current().map(|entry| ban_heading(entry.ban.ban_type)),
        links: external_links(player.steam_id),
        friends: profile
            .friends
            .iter()
            .map(|friend| FriendEntry {
                steam_id: friend.steam_id,
                name: friend.personaname.clone(),
                avatar: friend.avatar.clone(),
            })
            .collect(),
    }))
}

pub struct ProfileController {
    ctx: ViewContext,
    cell: ViewCell<ProfileState>,
}

impl ProfileController {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            cell: ViewCell::new(ProfileState::default()),
        }
    }

    pub async fn load(&self, steam_id: SteamId) -> LoadOutcome {
        if steam_id.is_unset() {
            return LoadOutcome::Skipped;
        }
        let (ticket, _loading) = self.cell.begin_load(|state| {
            if state.steam_id != Some(steam_id) {
                state.profile = None;
                state.bans = BanHistory::default();
            }
            state.steam_id = Some(steam_id);
        });

        let filter = BansQueryFilter {
            limit: Some(PROFILE_BAN_LIMIT),
            deleted: Some(false),
            steam_id: Some(steam_id),
            ..BansQueryFilter::default()
        };
        let (profile, bans) = futures::join!(
            self.ctx.api.get_profile(steam_id),
            self.ctx.api.list_bans(&filter)
        );

        match profile {
            Ok(profile) => {
                let bans = bans.unwrap_or_else(|err| {
                    warn!("profile: ban history unavailable steam_id={steam_id} err={err}");
                    Vec::new()
                });
                let applied = self.cell.commit(ticket, |state| {
                    state.profile = Some(profile);
                    state.bans = BanHistory::new(bans);
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
                error!("profile: load failed steam_id={steam_id} err={err}");
                self.ctx
                    .flash(Flash::error(format!("Failed to load profile: {err}")));
                LoadOutcome::Failed
            }
        }
    }

    pub fn snapshot(&self) -> ProfileState {
        self.cell.snapshot()
    }

    pub fn render(&self) -> ProfileScreen {
        self.cell.read(render_profile)
    }
}

#[cfg(test)]
#[path = "../tests/profile_tests.rs"]
mod tests;
