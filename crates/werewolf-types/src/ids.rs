//! Identifier types.
//!
//! Games are keyed by a UUID v7 [`GameId`] so that snapshot directories sort
//! by creation time. Participants are addressed by their seat number
//! ([`PlayerId`]), which is stable for the whole game and is what agents
//! see in every prompt, vote, and transcript.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for one game from deal to final result.
    GameId
}

/// Seat number of a participant, 1 through 12.
///
/// Serializes as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Wrap a seat number.
    pub const fn new(seat: u8) -> Self {
        Self(seat)
    }

    /// Return the seat number.
    pub const fn seat(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_ids_are_unique() {
        let a = GameId::new();
        let b = GameId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn player_id_serializes_as_integer() {
        let json = serde_json::to_string(&PlayerId::new(7)).ok();
        assert_eq!(json.as_deref(), Some("7"));
        let back: Result<PlayerId, _> = serde_json::from_str("11");
        assert_eq!(back.ok(), Some(PlayerId(11)));
    }

    #[test]
    fn player_id_orders_by_seat() {
        assert!(PlayerId(2) < PlayerId(10));
        assert_eq!(PlayerId(4).to_string(), "4");
    }
}
