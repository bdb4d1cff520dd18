//! User profiles: the identity documents every other domain reads.

pub mod models;
pub mod store;

pub use models::{ProfileType, UserProfile};
pub use store::{ProfileStore, PROFILES};
