use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A subscribe/unsubscribe that was accepted locally but not yet confirmed
/// against Reddit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PendingState {
    #[default]
    None,
    PendingSubscribe,
    PendingUnsubscribe,
}

impl PendingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingState::None => "NONE",
            PendingState::PendingSubscribe => "PENDING_SUBSCRIBE",
            PendingState::PendingUnsubscribe => "PENDING_UNSUBSCRIBE",
        }
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self, PendingState::None)
    }
}

impl fmt::Display for PendingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(PendingState::None),
            "PENDING_SUBSCRIBE" => Ok(PendingState::PendingSubscribe),
            "PENDING_UNSUBSCRIBE" => Ok(PendingState::PendingUnsubscribe),
            other => Err(format!("Unknown pending state: {}", other)),
        }
    }
}

/// A subreddit the user is tracking locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub pending_state: PendingState,
    pub hidden: bool,
}

impl Subscription {
    pub fn new(name: impl Into<String>, pending_state: PendingState, hidden: bool) -> Self {
        Self {
            name: name.into(),
            pending_state,
            hidden,
        }
    }

    /// A confirmed, visible subscription.
    pub fn confirmed(name: impl Into<String>) -> Self {
        Self::new(name, PendingState::None, false)
    }

    pub fn with_pending_state(&self, pending_state: PendingState) -> Self {
        Self {
            pending_state,
            ..self.clone()
        }
    }

    pub fn is_subscribe_pending(&self) -> bool {
        self.pending_state == PendingState::PendingSubscribe
    }

    pub fn is_unsubscribe_pending(&self) -> bool {
        self.pending_state == PendingState::PendingUnsubscribe
    }

    /// Case-insensitive name comparison, as Reddit treats subreddit names.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_state_text_round_trip() {
        for state in [
            PendingState::None,
            PendingState::PendingSubscribe,
            PendingState::PendingUnsubscribe,
        ] {
            assert_eq!(state.as_str().parse::<PendingState>().unwrap(), state);
        }
        assert!("pending".parse::<PendingState>().is_err());
    }

    #[test]
    fn test_with_pending_state_keeps_hidden() {
        let sub = Subscription::new("aww", PendingState::PendingSubscribe, true);
        let confirmed = sub.with_pending_state(PendingState::None);
        assert_eq!(confirmed.name, "aww");
        assert!(confirmed.hidden);
        assert!(!confirmed.pending_state.is_pending());
    }

    #[test]
    fn test_is_named_ignores_case() {
        let sub = Subscription::confirmed("Frontpage");
        assert!(sub.is_named("frontpage"));
        assert!(sub.is_named("FRONTPAGE"));
        assert!(!sub.is_named("popular"));
    }
}
