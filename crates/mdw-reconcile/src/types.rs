use std::fmt;

/// Why a raw value resolved the way it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionReason {
    /// `enabled` present and truthy.
    Enabled,
    /// `enabled` present and falsy.
    Disabled,
    EmptyValue,
    Unparseable,
    /// Valid JSON, but not an object (e.g. a bare `true` or a list).
    NotAnObject,
    MissingField,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Enabled => "enabled",
            DecisionReason::Disabled => "disabled",
            DecisionReason::EmptyValue => "empty_value",
            DecisionReason::Unparseable => "unparseable",
            DecisionReason::NotAnObject => "not_an_object",
            DecisionReason::MissingField => "missing_field",
        }
    }

    /// True when the value was ambiguous and the fail-safe default applied.
    pub fn is_fail_safe(&self) -> bool {
        !matches!(self, DecisionReason::Enabled | DecisionReason::Disabled)
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of interpreting one attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnforcementDecision {
    pub enabled: bool,
    pub reason: DecisionReason,
}

impl EnforcementDecision {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            reason: DecisionReason::Enabled,
        }
    }

    pub fn disabled(reason: DecisionReason) -> Self {
        Self {
            enabled: false,
            reason,
        }
    }
}

/// What applying a decision did to the marker file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Created,
    Removed,
    /// Already present; modification time bumped.
    Refreshed,
    /// Already absent.
    Unchanged,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Created => "created",
            Transition::Removed => "removed",
            Transition::Refreshed => "refreshed",
            Transition::Unchanged => "unchanged",
        }
    }

    /// True when file existence flipped.
    pub fn is_change(&self) -> bool {
        matches!(self, Transition::Created | Transition::Removed)
    }
}

/// Decision plus its effect, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    pub decision: EnforcementDecision,
    pub transition: Transition,
}
