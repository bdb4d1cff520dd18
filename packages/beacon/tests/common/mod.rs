//! Shared test environment wiring all components over one in-memory store.

use std::sync::Arc;

use beacon_core::testing::{RecordingPush, StaticIdentity};
use beacon_core::{
    ChatProvisioner, FriendRequestWorkflow, FriendshipLedger, NotificationFanout,
    NotificationFeed, ProfileStore, UserId, UserNotification, NOTIFICATIONS,
};
use docstore::{DocumentStore, FieldPath, MemoryStore, Predicate};

/// All components wired over a single store, with controllable identity
/// and recorded push sends.
pub struct TestEnv {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<StaticIdentity>,
    pub push: Arc<RecordingPush>,
    pub profiles: ProfileStore,
    pub ledger: FriendshipLedger,
    pub chats: ChatProvisioner,
    pub requests: FriendRequestWorkflow,
    pub fanout: NotificationFanout,
    pub feed: NotificationFeed,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        // Respect RUST_LOG when debugging tests; ignore double-init.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let identity = Arc::new(StaticIdentity::signed_out());
        let push = Arc::new(RecordingPush::new());

        let profiles = ProfileStore::new(store.clone());
        let fanout = NotificationFanout::new(store.clone(), push.clone());
        let ledger = FriendshipLedger::new(store.clone(), profiles.clone());
        let chats = ChatProvisioner::new(
            store.clone(),
            profiles.clone(),
            fanout.clone(),
            identity.clone(),
        );
        let requests = FriendRequestWorkflow::new(
            store.clone(),
            profiles.clone(),
            ledger.clone(),
            chats.clone(),
            fanout.clone(),
            identity.clone(),
        );
        let feed = NotificationFeed::new(store.clone());

        Self {
            store,
            identity,
            push,
            profiles,
            ledger,
            chats,
            requests,
            fanout,
            feed,
        }
    }

    /// Create a profile and return its id.
    pub async fn seed_profile(&self, id: &str, name: &str, username: &str, email: &str) -> UserId {
        let user_id = UserId::from(id);
        let profile =
            beacon_core::UserProfile::new(user_id.clone(), name, username, email);
        self.profiles.create(&profile).await.unwrap();
        user_id
    }

    /// Every notification stored for a user, read or not.
    pub async fn notifications_for(&self, user_id: &UserId) -> Vec<UserNotification> {
        let predicate = Predicate::field_eq(
            FieldPath::root("user_id").unwrap(),
            user_id.as_str(),
        );
        self.store
            .query(NOTIFICATIONS, &predicate)
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.decode().unwrap())
            .collect()
    }

    /// Number of documents matching a predicate in a collection.
    pub async fn count_matching(&self, collection: &str, predicate: &Predicate) -> usize {
        self.store.query(collection, predicate).await.unwrap().len()
    }
}
