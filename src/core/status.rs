use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle of a filing inside the analysis pipeline.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

use ProcessingStatus::*;

impl ProcessingStatus {
    /// Targets reachable in one step. No state transitions to itself.
    pub fn allowed_transitions(self) -> &'static [ProcessingStatus] {
        match self {
            Pending => &[Processing, Cancelled],
            Processing => &[Completed, Failed, Cancelled],
            Completed => &[Processing],
            Failed => &[Processing, Cancelled],
            Cancelled => &[Pending],
        }
    }

    pub fn can_transition_to(self, target: ProcessingStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Completed | Cancelled)
    }

    pub fn is_active(self) -> bool {
        self == Processing
    }

    pub fn is_pending(self) -> bool {
        self == Pending
    }

    /// Cancelled counts as both terminal and an error state.
    pub fn is_error_state(self) -> bool {
        matches!(self, Failed | Cancelled)
    }

    pub fn is_successful(self) -> bool {
        self == Completed
    }

    pub fn can_be_retried(self) -> bool {
        matches!(self, Failed | Cancelled)
    }

    pub fn can_be_cancelled(self) -> bool {
        matches!(self, Pending | Processing | Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const LEGAL: &[(ProcessingStatus, ProcessingStatus)] = &[
        (Pending, Processing),
        (Pending, Cancelled),
        (Processing, Completed),
        (Processing, Failed),
        (Processing, Cancelled),
        (Completed, Processing),
        (Failed, Processing),
        (Failed, Cancelled),
        (Cancelled, Pending),
    ];

    #[test]
    fn test_transition_table_is_exact() {
        for from in ProcessingStatus::iter() {
            for to in ProcessingStatus::iter() {
                assert_eq!(
                    from.can_transition_to(to),
                    LEGAL.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_no_self_loops() {
        for status in ProcessingStatus::iter() {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_every_state_can_recover() {
        for status in ProcessingStatus::iter() {
            assert!(!status.allowed_transitions().is_empty());
        }
    }

    #[test]
    fn test_classifications() {
        let terminal: Vec<_> = ProcessingStatus::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![Completed, Cancelled]);

        let errors: Vec<_> = ProcessingStatus::iter().filter(|s| s.is_error_state()).collect();
        assert_eq!(errors, vec![Failed, Cancelled]);

        assert!(Processing.is_active() && !Pending.is_active());
        assert!(Pending.is_pending() && !Failed.is_pending());
        assert!(Completed.is_successful() && !Cancelled.is_successful());

        let retryable: Vec<_> = ProcessingStatus::iter().filter(|s| s.can_be_retried()).collect();
        assert_eq!(retryable, vec![Failed, Cancelled]);

        let cancellable: Vec<_> = ProcessingStatus::iter()
            .filter(|s| s.can_be_cancelled())
            .collect();
        assert_eq!(cancellable, vec![Pending, Processing, Failed]);
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(Processing.to_string(), "processing");
        assert_eq!("FAILED".parse::<ProcessingStatus>().unwrap(), Failed);
        assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"cancelled\"");
        assert_eq!(ProcessingStatus::default(), Pending);
    }
}
