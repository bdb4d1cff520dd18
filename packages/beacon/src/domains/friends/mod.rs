//! Friend graph: requests, the edge ledger, and their invariants.
//!
//! Control flow on accept:
//!   respond(accept) -> status write -> FriendshipLedger.create_edge
//!     -> ChatProvisioner.ensure_direct_chat -> NotificationFanout

pub mod ledger;
pub mod models;
pub mod requests;

pub use ledger::{FriendshipLedger, FRIENDSHIPS};
pub use models::{Friend, FriendEdge, FriendRequest, RequestStatus};
pub use requests::{FriendRequestWorkflow, FRIEND_REQUESTS};
