//! Persisted user settings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of most recent snapshots used for the remaining-days trend.
///
/// Always within `[WindowSize::MIN, WindowSize::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WindowSize(u32);

impl WindowSize {
    /// Smallest accepted window.
    pub const MIN: u32 = 1;
    /// Largest accepted window.
    pub const MAX: u32 = 365;

    /// Window length as a count of snapshots.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u32> for WindowSize {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::WindowOutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }
}

impl From<WindowSize> for u32 {
    fn from(window: WindowSize) -> Self {
        window.0
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Settings stored next to the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Remaining-days window
    #[serde(default)]
    pub recent_x: WindowSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert!(WindowSize::try_from(0).is_err());
        assert_eq!(WindowSize::try_from(1).unwrap().get(), 1);
        assert_eq!(WindowSize::try_from(365).unwrap().get(), 365);
        assert_eq!(
            WindowSize::try_from(366),
            Err(CoreError::WindowOutOfRange { value: 366, min: 1, max: 365 })
        );
    }

    #[test]
    fn test_settings_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.recent_x.get(), 5);

        let settings: Settings = serde_json::from_str(r#"{"recent_x":12}"#).unwrap();
        assert_eq!(settings.recent_x.get(), 12);
        assert_eq!(serde_json::to_string(&settings).unwrap(), r#"{"recent_x":12}"#);

        assert!(serde_json::from_str::<Settings>(r#"{"recent_x":0}"#).is_err());
    }
}
