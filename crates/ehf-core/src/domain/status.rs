//! Tri-state lookup status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a status lookup for one entity.
///
/// State transitions:
/// - Pending -> Confirmed
/// - Pending -> Rejected
///
/// A status is always replaced as a whole; there is no partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::Confirmed, Status::Rejected];

    /// Session label. Identical to the state class rendered on the element.
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "gul",
            Status::Confirmed => "grønn",
            Status::Rejected => "rød",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Status::Confirmed
        } else {
            Status::Rejected
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Status::Pending => "⏳",
            Status::Confirmed => "✅",
            Status::Rejected => "❌",
        }
    }

    /// Only resolved outcomes may enter the session cache.
    pub fn is_resolved(self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::pending(Status::Pending, "gul")]
    #[case::confirmed(Status::Confirmed, "grønn")]
    #[case::rejected(Status::Rejected, "rød")]
    fn labels_parse_back(#[case] status: Status, #[case] label: &str) {
        assert_eq!(status.label(), label);
        assert_eq!(Status::from_label(label), Some(status));
    }

    #[test]
    fn unknown_label_is_none() {
        assert_eq!(Status::from_label("green"), None);
        assert_eq!(Status::from_label(""), None);
    }

    #[test]
    fn flag_maps_to_confirmed_or_rejected() {
        assert_eq!(Status::from_flag(true), Status::Confirmed);
        assert_eq!(Status::from_flag(false), Status::Rejected);
    }

    #[test]
    fn pending_is_not_resolved() {
        assert!(!Status::Pending.is_resolved());
        assert!(Status::Confirmed.is_resolved());
        assert!(Status::Rejected.is_resolved());
    }
}
