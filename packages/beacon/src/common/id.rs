//! Typed UUID wrappers for compile-time type safety.
//!
//! `Id<T>` wraps a time-ordered (v7) `uuid::Uuid` and carries the entity
//! type as a phantom parameter, so a `RequestId` can never be passed where
//! a `ChatId` is expected.
//!
//! # Example
//!
//! ```rust
//! use beacon_core::common::id::Id;
//!
//! pub struct Chat;
//! pub struct FriendRequest;
//!
//! pub type ChatId = Id<Chat>;
//! pub type RequestId = Id<FriendRequest>;
//!
//! let chat_id = ChatId::new();
//! // let wrong: RequestId = chat_id; // compile error
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed wrapper around a v7 `Uuid`.
///
/// V7 UUIDs are time-ordered, which gives document ids natural
/// chronological ordering.
#[repr(transparent)]
pub struct Id<T>(Uuid, PhantomData<fn() -> T>);

impl<T> Id<T> {
    /// Mint a fresh time-ordered id.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7(), PhantomData)
    }

    /// Wrap a raw `Uuid` (loading from storage, deserializing).
    #[inline]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    /// Parse from the string form used as a document id.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?, PhantomData))
    }

    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    #[inline]
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Id<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&format!("Id<{}>", std::any::type_name::<T>()))
            .field(&self.0)
            .finish()
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for Id<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Id<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T> From<Id<T>> for Uuid {
    fn from(id: Id<T>) -> Self {
        id.0
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;
    type WidgetId = Id<Widget>;

    #[test]
    fn new_creates_unique_ids() {
        assert_ne!(WidgetId::new(), WidgetId::new());
    }

    #[test]
    fn parse_and_display_roundtrip() {
        let id = WidgetId::new();
        assert_eq!(WidgetId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn serde_roundtrip() {
        let id = WidgetId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: WidgetId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        let id1 = WidgetId::new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = WidgetId::new();
        assert!(id1 < id2);
    }
}
