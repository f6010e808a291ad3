//! Reservation state machine.

use serde::{Deserialize, Serialize};

/// The state of a reservation.
///
/// State transitions:
/// ```text
/// Active ──fulfill──► Fulfilled
///    │
///    ├──release────► Released
///    └──expire─────► Expired
/// ```
/// There is no way back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    #[default]
    Active,
    Fulfilled,
    Released,
    Expired,
}

impl ReservationState {
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationState::Active)
    }

    pub fn can_fulfill(&self) -> bool {
        self.is_active()
    }

    pub fn can_release(&self) -> bool {
        self.is_active()
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Active => "active",
            ReservationState::Fulfilled => "fulfilled",
            ReservationState::Released => "released",
            ReservationState::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
