use std::fmt;

use mdw_longpoll::WatchError;

/// Why a run (loop or one-shot) stopped with failure.
#[derive(Debug)]
pub enum RunError {
    /// The long-poll client gave up.
    Watch(WatchError),
    /// The state file or an output file could not be written.
    Io(anyhow::Error),
    /// The wait ended without a non-empty value.
    EmptyValue { key: String },
}

impl RunError {
    pub fn watch(&self) -> Option<&WatchError> {
        match self {
            RunError::Watch(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Watch(e) => write!(f, "{e}"),
            RunError::Io(e) => write!(f, "{e:#}"),
            RunError::EmptyValue { key } => write!(f, "no value for \"{key}\""),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Watch(e) => Some(e),
            RunError::Io(e) => Some(&**e),
            RunError::EmptyValue { .. } => None,
        }
    }
}

impl From<WatchError> for RunError {
    fn from(e: WatchError) -> Self {
        RunError::Watch(e)
    }
}
