//! Integration tests for chat provisioning and group administration.

mod common;

use crate::common::TestEnv;
use beacon_core::{BeaconError, NotificationKind, UserId, DIRECT_CHAT_GREETING, MESSAGES};
use docstore::{DocumentStore, FieldPath, Predicate};

/// Seed three users and a group created by the first. Returns
/// (creator, member_one, member_two, chat_id).
async fn seed_group(env: &TestEnv) -> (UserId, UserId, UserId, beacon_core::ChatId) {
    let carol = env.seed_profile("carol", "Carol", "caro", "carol@example.com").await;
    let dave = env.seed_profile("dave", "Dave", "dave", "dave@example.com").await;
    let erin = env.seed_profile("erin", "Erin", "erin", "erin@example.com").await;

    env.identity.sign_in(carol.clone());
    let chat_id = env
        .chats
        .create_group_chat("Trip", &[carol.clone(), dave.clone(), erin.clone()])
        .await
        .unwrap();
    (carol, dave, erin, chat_id)
}

// =============================================================================
// ensure_direct_chat
// =============================================================================

/// Provisioning the same pair twice returns the same chat id.
#[tokio::test]
async fn ensure_direct_chat_is_idempotent() {
    let env = TestEnv::new();
    let alice = env.seed_profile("alice", "Alice", "alice", "alice@example.com").await;
    let bob = env.seed_profile("bob", "Bob", "bobby", "bob@example.com").await;

    let first = env.chats.ensure_direct_chat(&alice, &bob).await.unwrap();
    let second = env.chats.ensure_direct_chat(&alice, &bob).await.unwrap();
    // Argument order must not matter either
    let third = env.chats.ensure_direct_chat(&bob, &alice).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, third);
    assert_eq!(env.chats.chats_for(&alice).await.unwrap().len(), 1);
}

/// A fresh direct chat is seeded with the greeting, zeroed unread counts,
/// and no admins.
#[tokio::test]
async fn direct_chat_seeding() {
    let env = TestEnv::new();
    let alice = env.seed_profile("alice", "Alice", "alice", "alice@example.com").await;
    let bob = env.seed_profile("bob", "Bob", "bobby", "bob@example.com").await;

    let chat_id = env.chats.ensure_direct_chat(&alice, &bob).await.unwrap();
    let chat = env.chats.get(chat_id).await.unwrap();

    assert_eq!(chat.last_message, DIRECT_CHAT_GREETING);
    assert!(chat.admin_ids.is_empty());
    assert!(!chat.is_group());
    assert_eq!(chat.unread_counts[&alice], 0);
    assert_eq!(chat.unread_counts[&bob], 0);
    assert_eq!(chat.nicknames[&alice], "alice");
    assert_eq!(chat.nicknames[&bob], "bobby");
    assert!(chat.participant_photos.is_empty());
}

/// The greeting is configurable per provisioner instance.
#[tokio::test]
async fn custom_greeting_seeds_direct_chat() {
    let env = TestEnv::new();
    let alice = env.seed_profile("alice", "Alice", "alice", "alice@example.com").await;
    let bob = env.seed_profile("bob", "Bob", "bobby", "bob@example.com").await;

    let chats = env.chats.clone().with_greeting("Howdy!");
    let chat_id = chats.ensure_direct_chat(&alice, &bob).await.unwrap();
    assert_eq!(env.chats.get(chat_id).await.unwrap().last_message, "Howdy!");
}

#[tokio::test]
async fn direct_chat_with_self_rejected() {
    let env = TestEnv::new();
    let alice = env.seed_profile("alice", "Alice", "alice", "alice@example.com").await;

    let err = env.chats.ensure_direct_chat(&alice, &alice).await.unwrap_err();
    assert!(matches!(err, BeaconError::InvalidInput { .. }));
}

// =============================================================================
// create_group_chat
// =============================================================================

/// Creator becomes the sole admin; the other participants each get one
/// group-invite notification, the creator none.
#[tokio::test]
async fn create_group_chat_admin_and_invites() {
    let env = TestEnv::new();
    let (carol, dave, erin, chat_id) = seed_group(&env).await;

    let chat = env.chats.get(chat_id).await.unwrap();
    assert_eq!(chat.name, "Trip");
    assert_eq!(chat.admin_ids, vec![carol.clone()]);
    assert_eq!(chat.participants.len(), 3);
    assert!(chat.is_group());
    assert_eq!(chat.creator(), Some(&carol));

    for member in [&dave, &erin] {
        let notifications = env.notifications_for(member).await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::GroupInvite);
        assert_eq!(notifications[0].data["chatId"], chat_id.to_string());
    }
    assert!(env.notifications_for(&carol).await.is_empty());
}

/// Fewer than two *other* participants is rejected, and duplicates of the
/// creator do not count.
#[tokio::test]
async fn create_group_chat_requires_two_others() {
    let env = TestEnv::new();
    let carol = env.seed_profile("carol", "Carol", "caro", "carol@example.com").await;
    let dave = env.seed_profile("dave", "Dave", "dave", "dave@example.com").await;
    env.identity.sign_in(carol.clone());

    let err = env
        .chats
        .create_group_chat("Trip", &[carol.clone(), dave.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::InsufficientParticipants));

    // Duplicated ids collapse before the check
    let err = env
        .chats
        .create_group_chat("Trip", &[carol.clone(), dave.clone(), dave.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::InsufficientParticipants));
}

#[tokio::test]
async fn create_group_chat_rejects_empty_name() {
    let env = TestEnv::new();
    let carol = env.seed_profile("carol", "Carol", "caro", "carol@example.com").await;
    let dave = env.seed_profile("dave", "Dave", "dave", "dave@example.com").await;
    let erin = env.seed_profile("erin", "Erin", "erin", "erin@example.com").await;
    env.identity.sign_in(carol.clone());

    let err = env
        .chats
        .create_group_chat("   ", &[carol, dave, erin])
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::InvalidInput { .. }));
}

// =============================================================================
// rename_group
// =============================================================================

/// Non-admins cannot rename; the name is unchanged afterwards.
#[tokio::test]
async fn rename_group_requires_admin() {
    let env = TestEnv::new();
    let (_carol, dave, _erin, chat_id) = seed_group(&env).await;

    env.identity.sign_in(dave);
    let err = env.chats.rename_group(chat_id, "Hijacked").await.unwrap_err();
    assert!(matches!(err, BeaconError::NotAuthorized { .. }));

    assert_eq!(env.chats.get(chat_id).await.unwrap().name, "Trip");
}

#[tokio::test]
async fn rename_group_by_admin() {
    let env = TestEnv::new();
    let (carol, _dave, _erin, chat_id) = seed_group(&env).await;

    env.identity.sign_in(carol);
    env.chats.rename_group(chat_id, "Road Trip").await.unwrap();
    assert_eq!(env.chats.get(chat_id).await.unwrap().name, "Road Trip");
}

/// Direct chats have no admins, so nobody can rename them.
#[tokio::test]
async fn direct_chat_cannot_be_renamed() {
    let env = TestEnv::new();
    let alice = env.seed_profile("alice", "Alice", "alice", "alice@example.com").await;
    let bob = env.seed_profile("bob", "Bob", "bobby", "bob@example.com").await;
    let chat_id = env.chats.ensure_direct_chat(&alice, &bob).await.unwrap();

    env.identity.sign_in(alice);
    let err = env.chats.rename_group(chat_id, "Us").await.unwrap_err();
    assert!(matches!(err, BeaconError::NotAuthorized { .. }));
}

// =============================================================================
// add_admin / remove_admin
// =============================================================================

#[tokio::test]
async fn add_admin_flow() {
    let env = TestEnv::new();
    let (carol, dave, erin, chat_id) = seed_group(&env).await;
    let outsider = env.seed_profile("frank", "Frank", "frank", "frank@example.com").await;

    // Non-admin requester
    env.identity.sign_in(dave.clone());
    let err = env.chats.add_admin(chat_id, &erin).await.unwrap_err();
    assert!(matches!(err, BeaconError::NotAuthorized { .. }));

    env.identity.sign_in(carol.clone());

    // Target must participate
    let err = env.chats.add_admin(chat_id, &outsider).await.unwrap_err();
    assert!(matches!(err, BeaconError::NotParticipant { .. }));

    // Promote dave
    env.chats.add_admin(chat_id, &dave).await.unwrap();
    let chat = env.chats.get(chat_id).await.unwrap();
    assert_eq!(chat.admin_ids, vec![carol.clone(), dave.clone()]);

    // Promoting twice is a conflict
    let err = env.chats.add_admin(chat_id, &dave).await.unwrap_err();
    assert!(matches!(err, BeaconError::AlreadyAdmin { .. }));
}

/// Only the creator demotes; the creator is undemotable; the admin set
/// never empties.
#[tokio::test]
async fn remove_admin_preserves_creator_and_nonempty_set() {
    let env = TestEnv::new();
    let (carol, dave, _erin, chat_id) = seed_group(&env).await;

    env.identity.sign_in(carol.clone());
    env.chats.add_admin(chat_id, &dave).await.unwrap();

    // A non-creator admin cannot demote anyone
    env.identity.sign_in(dave.clone());
    let err = env.chats.remove_admin(chat_id, &carol).await.unwrap_err();
    assert!(matches!(err, BeaconError::NotAuthorized { .. }));

    env.identity.sign_in(carol.clone());

    // The creator cannot be demoted, even by themselves
    let err = env.chats.remove_admin(chat_id, &carol).await.unwrap_err();
    assert!(matches!(err, BeaconError::CannotRemoveCreator));

    // Demote dave; the creator remains
    env.chats.remove_admin(chat_id, &dave).await.unwrap();
    let chat = env.chats.get(chat_id).await.unwrap();
    assert_eq!(chat.admin_ids, vec![carol.clone()]);

    // Demoting a non-admin is a no-op
    env.chats.remove_admin(chat_id, &dave).await.unwrap();
    let chat = env.chats.get(chat_id).await.unwrap();
    assert_eq!(chat.admin_ids, vec![carol]);
}

// =============================================================================
// add_participants
// =============================================================================

#[tokio::test]
async fn add_participants_flow() {
    let env = TestEnv::new();
    let (carol, dave, _erin, chat_id) = seed_group(&env).await;
    let frank = env.seed_profile("frank", "Frank", "frank", "frank@example.com").await;
    let grace = env.seed_profile("grace", "Grace", "grace", "grace@example.com").await;

    // Non-admin requester
    env.identity.sign_in(dave.clone());
    let err = env
        .chats
        .add_participants(chat_id, &[frank.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::NotAuthorized { .. }));

    env.identity.sign_in(carol.clone());

    // Already-present ids are silently dropped; an empty remainder fails
    let err = env
        .chats
        .add_participants(chat_id, &[dave.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::NoNewParticipants));

    // dave is dropped, frank and grace are added
    env.chats
        .add_participants(chat_id, &[dave.clone(), frank.clone(), grace.clone()])
        .await
        .unwrap();

    let chat = env.chats.get(chat_id).await.unwrap();
    assert_eq!(chat.participants.len(), 5);
    assert!(chat.is_participant(&frank));
    assert!(chat.is_participant(&grace));
    assert_eq!(chat.unread_counts[&frank], 0);
    assert_eq!(chat.nicknames[&grace], "grace");

    // A synthetic system message announces the change
    let messages = env
        .store
        .query(
            MESSAGES,
            &Predicate::field_eq(
                FieldPath::root("chat_id").unwrap(),
                serde_json::json!(chat_id),
            ),
        )
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    let message: beacon_core::ChatMessage = messages[0].decode().unwrap();
    assert_eq!(message.sender_id, None);
    assert_eq!(message.text, "Carol added Frank, Grace");
    assert_eq!(chat.last_message, message.text);
}

// =============================================================================
// chats_for
// =============================================================================

/// Listing returns only the user's chats, most recent activity first.
#[tokio::test]
async fn chats_for_lists_only_own_chats() {
    let env = TestEnv::new();
    let alice = env.seed_profile("alice", "Alice", "alice", "alice@example.com").await;
    let bob = env.seed_profile("bob", "Bob", "bobby", "bob@example.com").await;
    let carol = env.seed_profile("carol", "Carol", "caro", "carol@example.com").await;

    env.chats.ensure_direct_chat(&alice, &bob).await.unwrap();
    env.chats.ensure_direct_chat(&bob, &carol).await.unwrap();

    assert_eq!(env.chats.chats_for(&alice).await.unwrap().len(), 1);
    assert_eq!(env.chats.chats_for(&bob).await.unwrap().len(), 2);
    assert_eq!(env.chats.chats_for(&carol).await.unwrap().len(), 1);
}
