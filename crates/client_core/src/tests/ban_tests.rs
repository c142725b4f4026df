use super::*;
use crate::test_support::{
    banned, harness, person, user_message, Harness, MODERATOR_ID, PLAYER_ID, SUBJECT_ID,
};
use shared::domain::BanType;

fn seeded(level: PermissionLevel) -> Harness {
    let h = harness(level);
    h.api
        .bans
        .lock()
        .unwrap()
        .insert(BanId(7), Ok(banned(7, SUBJECT_ID, false, BanType::Banned)));
    *h.api.messages.lock().unwrap() = Ok(vec![
        AuthorMessage {
            message: user_message(1, BanId(7), PLAYER_ID, "please *unban* me"),
            author: person(PLAYER_ID, "appealer"),
        },
        AuthorMessage {
            message: user_message(2, BanId(7), MODERATOR_ID, "no"),
            author: person(MODERATOR_ID, "mod"),
        },
    ]);
    h
}

#[tokio::test]
async fn load_fetches_ban_and_messages() {
    let h = seeded(PermissionLevel::User);
    let controller = BanController::new(h.ctx.clone());

    assert_eq!(controller.load(BanId(7)).await, LoadOutcome::Applied);
    assert_eq!(h.api.calls("get_ban"), 1);
    assert_eq!(h.api.calls("list_ban_messages"), 1);

    let screen = controller.render();
    let summary = screen.summary.expect("summary");
    assert_eq!(summary.subject_id, SUBJECT_ID);
    assert_eq!(summary.heading.label, "Banned");
    assert_eq!(screen.messages.len(), 2);
    assert!(screen.messages[0].html.contains("<em>unban</em>"));
    // the harness user at User level is the appealer
    assert!(screen.messages[0].editable);
    assert!(!screen.messages[1].editable);
    assert!(!screen.can_unban);
}

#[tokio::test]
async fn moderators_may_edit_every_message() {
    let h = seeded(PermissionLevel::Moderator);
    let controller = BanController::new(h.ctx.clone());
    controller.load(BanId(7)).await;

    let screen = controller.render();
    assert!(screen.messages.iter().all(|m| m.editable));
    assert!(screen.can_unban);
}

#[tokio::test]
async fn missing_ban_flashes() {
    let h = harness(PermissionLevel::User);
    let controller = BanController::new(h.ctx.clone());

    assert_eq!(controller.load(BanId(1)).await, LoadOutcome::Failed);
    assert!(h.flashes.pending()[0].message.starts_with("Failed to load ban:"));
    assert!(!controller.snapshot().loading);
}

#[tokio::test]
async fn message_operations_reload_the_thread() {
    let h = seeded(PermissionLevel::User);
    let controller = BanController::new(h.ctx.clone());
    controller.load(BanId(7)).await;

    assert!(matches!(
        controller.post_message("   ").await,
        Err(ViewError::Invalid(_))
    ));
    controller.post_message("appeal update").await.unwrap();
    controller
        .edit_message(BanMessageId(1), "edited appeal")
        .await
        .unwrap();
    controller.delete_message(BanMessageId(2)).await.unwrap();

    assert_eq!(
        *h.api.message_ops.lock().unwrap(),
        vec![
            "create 7 appeal update".to_string(),
            "update 1 edited appeal".to_string(),
            "delete 2".to_string(),
        ]
    );
    assert_eq!(h.api.calls("list_ban_messages"), 4);
    assert_eq!(controller.snapshot().messages.len(), 3);
}

#[tokio::test]
async fn message_operations_need_a_loaded_ban() {
    let h = harness(PermissionLevel::User);
    let controller = BanController::new(h.ctx.clone());
    assert!(matches!(
        controller.post_message("hello").await,
        Err(ViewError::NotLoaded)
    ));
}

#[tokio::test]
async fn unban_requires_moderator_and_reason() {
    let h = seeded(PermissionLevel::User);
    let controller = BanController::new(h.ctx.clone());
    controller.load(BanId(7)).await;
    assert!(matches!(
        controller.unban("appeal accepted").await,
        Err(ViewError::Forbidden { .. })
    ));

    let h = seeded(PermissionLevel::Moderator);
    let controller = BanController::new(h.ctx.clone());
    controller.load(BanId(7)).await;
    assert!(matches!(
        controller.unban(" ").await,
        Err(ViewError::Invalid(_))
    ));

    controller.unban("appeal accepted").await.unwrap();
    let unbans = h.api.unbans.lock().unwrap().clone();
    assert_eq!(unbans[0].0, BanId(7));
    assert_eq!(unbans[0].1.unban_reason_text, "appeal accepted");

    let screen = controller.render();
    assert!(screen.summary.is_some_and(|s| s.deleted));
    assert!(!screen.can_unban);
    assert_eq!(h.flashes.pending()[0].message, "Player unbanned");
}
