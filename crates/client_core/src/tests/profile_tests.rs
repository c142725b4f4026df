use super::*;
use crate::{
    error::GatewayError,
    test_support::{banned, harness, person, SUBJECT_ID},
    views::Tone,
};
use shared::domain::{BanType, PermissionLevel, STEAM_ID_BASE};

fn loaded_profile(steam_id: SteamId) -> PlayerProfile {
    let mut player = person(steam_id, "suspect");
    player.vac_bans = 2;
    player.economy_ban = "none".into();
    player.timecreated = 1_262_304_000;
    PlayerProfile {
        player,
        friends: vec![person(SteamId(STEAM_ID_BASE + 77), "buddy")],
    }
}

#[tokio::test]
async fn load_fetches_profile_and_active_bans_together() {
    let h = harness(PermissionLevel::User);
    h.api
        .profiles
        .lock()
        .unwrap()
        .insert(SUBJECT_ID, Ok(loaded_profile(SUBJECT_ID)));
    *h.api.ban_history.lock().unwrap() = Ok(vec![
        banned(1, SUBJECT_ID, false, BanType::NoComm),
        banned(2, SUBJECT_ID, true, BanType::Banned),
    ]);
    let controller = ProfileController::new(h.ctx.clone());

    assert_eq!(controller.load(SUBJECT_ID).await, LoadOutcome::Applied);

    let filters = h.api.ban_filters.lock().unwrap().clone();
    assert_eq!(filters[0].deleted, Some(false));
    assert_eq!(filters[0].steam_id, Some(SUBJECT_ID));

    let ProfileScreen::Loaded(card) = controller.render() else {
        panic!("profile should be loaded");
    };
    assert_eq!(card.name, "suspect");
    assert_eq!(card.created.map(|d| d.to_string()), Some("2010-01-01".into()));
    assert_eq!(card.current_ban, Some(Badge::new("Muted", Tone::Warning)));
    assert_eq!(card.friends.len(), 1);
    assert_eq!(card.links.len(), 6);
    assert!(card.links[0].url.ends_with(&SUBJECT_ID.to_string()));

    let tones: Vec<_> = card
        .community_status
        .iter()
        .map(|b| (b.label.as_str(), b.tone))
        .collect();
    assert_eq!(
        tones,
        vec![
            ("VAC", Tone::Error),
            ("Game Ban", Tone::Success),
            ("Economy Ban", Tone::Success),
            ("Community Ban", Tone::Success),
        ]
    );
}

#[tokio::test]
async fn unset_steam_id_skips_fetch() {
    let h = harness(PermissionLevel::User);
    let controller = ProfileController::new(h.ctx.clone());

    assert_eq!(controller.load(SteamId(0)).await, LoadOutcome::Skipped);
    assert_eq!(h.api.calls("get_profile"), 0);
    assert_eq!(controller.render(), ProfileScreen::Empty);
}

#[tokio::test]
async fn profile_with_zero_steam_id_renders_empty() {
    let h = harness(PermissionLevel::User);
    h.api
        .profiles
        .lock()
        .unwrap()
        .insert(SUBJECT_ID, Ok(PlayerProfile::default()));
    let controller = ProfileController::new(h.ctx.clone());

    controller.load(SUBJECT_ID).await;
    assert_eq!(controller.render(), ProfileScreen::Empty);
}

#[tokio::test]
async fn failure_flashes_and_clears_loading() {
    let h = harness(PermissionLevel::User);
    h.api.profiles.lock().unwrap().insert(
        SUBJECT_ID,
        Err(GatewayError::Transport("connection refused".into())),
    );
    let controller = ProfileController::new(h.ctx.clone());

    assert_eq!(controller.load(SUBJECT_ID).await, LoadOutcome::Failed);
    assert!(!controller.snapshot().loading);
    let flashes = h.flashes.pending();
    assert_eq!(flashes.len(), 1);
    assert!(flashes[0].message.starts_with("Failed to load profile:"));
}

#[tokio::test]
async fn ban_history_failure_still_shows_profile() {
    let h = harness(PermissionLevel::User);
    h.api
        .profiles
        .lock()
        .unwrap()
        .insert(SUBJECT_ID, Ok(loaded_profile(SUBJECT_ID)));
    *h.api.ban_history.lock().unwrap() = Err(GatewayError::Transport("timeout".into()));
    let controller = ProfileController::new(h.ctx.clone());

    assert_eq!(controller.load(SUBJECT_ID).await, LoadOutcome::Applied);
    let ProfileScreen::Loaded(card) = controller.render() else {
        panic!("profile should be loaded");
    };
    assert!(card.current_ban.is_none());
    assert!(h.flashes.pending().is_empty());
}

#[tokio::test]
async fn stale_profile_response_is_discarded() {
    let other = SteamId(STEAM_ID_BASE + 500);
    let h = harness(PermissionLevel::User);
    {
        let mut profiles = h.api.profiles.lock().unwrap();
        profiles.insert(SUBJECT_ID, Ok(loaded_profile(SUBJECT_ID)));
        profiles.insert(other, Ok(loaded_profile(other)));
    }
    let gate = h.api.gate(&format!("profile:{SUBJECT_ID}"));
    let controller = ProfileController::new(h.ctx.clone());

    let (first, second) = tokio::join!(controller.load(SUBJECT_ID), async {
        let outcome = controller.load(other).await;
        gate.notify_one();
        outcome
    });

    assert_eq!(second, LoadOutcome::Applied);
    assert_eq!(first, LoadOutcome::Stale);
    let state = controller.snapshot();
    assert_eq!(state.steam_id, Some(other));
    assert_eq!(state.profile.map(|p| p.player.steam_id), Some(other));
    assert!(!state.loading);
}
