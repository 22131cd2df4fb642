use serde::{Deserialize, Serialize};

/// Watch status stored in a note's status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[default]
    PlanToWatch,
    Watching,
    Completed,
    OnHold,
    Dropped,
}

impl WatchStatus {
    /// Options in the order the status control lists them.
    pub const ALL: &[WatchStatus] = &[
        Self::PlanToWatch,
        Self::Watching,
        Self::Completed,
        Self::OnHold,
        Self::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanToWatch => "Plan to Watch",
            Self::Watching => "Watching",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Dropped => "Dropped",
        }
    }

    /// Block string representation (lowercase, no spaces).
    pub fn as_block_str(&self) -> &'static str {
        match self {
            Self::PlanToWatch => "plan_to_watch",
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Dropped => "dropped",
        }
    }

    pub fn from_block_str(s: &str) -> Option<Self> {
        match s {
            "plan_to_watch" => Some(Self::PlanToWatch),
            "watching" => Some(Self::Watching),
            "completed" => Some(Self::Completed),
            "on_hold" => Some(Self::OnHold),
            "dropped" => Some(Self::Dropped),
            _ => None,
        }
    }
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_str_round_trip_and_default() {
        for status in WatchStatus::ALL {
            assert_eq!(WatchStatus::from_block_str(status.as_block_str()), Some(*status));
        }
        assert_eq!(WatchStatus::default(), WatchStatus::PlanToWatch);
        assert_eq!(WatchStatus::from_block_str("Watching"), None);
    }
}
