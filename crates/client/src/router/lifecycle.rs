//! Lifecycle state machine for one release of the router.
//!
//! ```text
//! Parsed ──install──▶ Installing ──ok──▶ Installed ──activate──▶ Activating ──▶ Activated
//!                         │                  ▲                       │              │
//!                         └──err──▶ Redundant┘(retry install)        └─err─▶ Installed
//!                                                                   Activated ──activate──▶ Activating
//! ```

use serde::{Deserialize, Serialize};
use shellcache_core::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Built, nothing installed yet.
    #[default]
    Parsed,
    Installing,
    /// App shell stored; waiting to take over.
    Installed,
    Activating,
    /// Stale buckets removed; controlling requests.
    Activated,
    /// Last install failed. A new install attempt may be made.
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }

    /// State entered when an install starts.
    pub fn begin_install(self) -> Result<Self, Error> {
        match self {
            Self::Parsed | Self::Installed | Self::Redundant => Ok(Self::Installing),
            other => Err(Error::Lifecycle { event: "install", state: other.to_string() }),
        }
    }

    /// State entered when an activation starts.
    ///
    /// Re-activating an active release is allowed so activation stays idempotent.
    pub fn begin_activate(self) -> Result<Self, Error> {
        match self {
            Self::Installed | Self::Activated => Ok(Self::Activating),
            other => Err(Error::Lifecycle { event: "activate", state: other.to_string() }),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_transitions() {
        assert_eq!(LifecycleState::Parsed.begin_install().unwrap(), LifecycleState::Installing);
        assert_eq!(LifecycleState::Redundant.begin_install().unwrap(), LifecycleState::Installing);
        assert_eq!(LifecycleState::Installed.begin_install().unwrap(), LifecycleState::Installing);

        for state in [LifecycleState::Installing, LifecycleState::Activating, LifecycleState::Activated] {
            assert!(matches!(state.begin_install(), Err(Error::Lifecycle { event: "install", .. })));
        }
    }

    #[test]
    fn test_activate_transitions() {
        assert_eq!(LifecycleState::Installed.begin_activate().unwrap(), LifecycleState::Activating);
        assert_eq!(LifecycleState::Activated.begin_activate().unwrap(), LifecycleState::Activating);

        for state in [
            LifecycleState::Parsed,
            LifecycleState::Installing,
            LifecycleState::Activating,
            LifecycleState::Redundant,
        ] {
            let err = state.begin_activate().unwrap_err();
            assert_eq!(err.to_string(), format!("LIFECYCLE: cannot activate while {state}"));
        }
    }

    #[test]
    fn test_default_and_names() {
        assert_eq!(LifecycleState::default(), LifecycleState::Parsed);
        assert_eq!(serde_json::to_string(&LifecycleState::Redundant).unwrap(), "\"redundant\"");
    }
}
