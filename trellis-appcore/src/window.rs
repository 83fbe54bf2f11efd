use serde::{Deserialize, Serialize};

/// The chat panel's three display states.
///
/// Maximize transitions are gated by configuration; everything else is
/// always available. Closing never touches the conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Closed,
    Open,
    Maximized,
}

impl WindowState {
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// The launcher bubble: closed opens, anything open closes.
    pub fn toggle(self) -> Self {
        match self {
            Self::Closed => Self::Open,
            Self::Open | Self::Maximized => Self::Closed,
        }
    }

    pub fn open(self) -> Self {
        match self {
            Self::Closed => Self::Open,
            other => other,
        }
    }

    pub fn close(self) -> Self {
        Self::Closed
    }

    /// Step down one level: maximized shrinks to open, open closes.
    pub fn minimize(self) -> Self {
        match self {
            Self::Maximized => Self::Open,
            Self::Open | Self::Closed => Self::Closed,
        }
    }

    pub fn maximize(self, enabled: bool) -> Self {
        if enabled && self.is_open() {
            Self::Maximized
        } else {
            self
        }
    }

    pub fn toggle_maximize(self, enabled: bool) -> Self {
        match self {
            Self::Maximized => Self::Open,
            Self::Open => self.maximize(enabled),
            Self::Closed => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_toggle_round_trips() {
        assert_eq!(WindowState::Closed.toggle(), WindowState::Open);
        assert_eq!(WindowState::Open.toggle(), WindowState::Closed);
        assert_eq!(WindowState::Maximized.toggle(), WindowState::Closed);
    }

    #[test]
    fn minimize_steps_down_one_level() {
        assert_eq!(WindowState::Maximized.minimize(), WindowState::Open);
        assert_eq!(WindowState::Open.minimize(), WindowState::Closed);
        assert_eq!(WindowState::Closed.minimize(), WindowState::Closed);
    }

    #[test]
    fn maximize_respects_the_gate() {
        assert_eq!(WindowState::Open.maximize(true), WindowState::Maximized);
        assert_eq!(WindowState::Open.maximize(false), WindowState::Open);
        assert_eq!(WindowState::Closed.maximize(true), WindowState::Closed);
    }

    #[test]
    fn toggle_maximize_always_allows_shrinking() {
        assert_eq!(
            WindowState::Maximized.toggle_maximize(false),
            WindowState::Open
        );
        assert_eq!(
            WindowState::Open.toggle_maximize(true),
            WindowState::Maximized
        );
        assert_eq!(WindowState::Closed.toggle_maximize(true), WindowState::Closed);
    }
}
