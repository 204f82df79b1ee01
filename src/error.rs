use thiserror::Error;

/// Failures reported by the workflow backend collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Backend rejected the request with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Backend response could not be decoded: {0}")]
    Decode(String),
}

/// Local checks on the transition confirmation form.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Event key is required")]
    EmptyEventKey,

    #[error("Name is required")]
    EmptyName,

    #[error("State key is required")]
    EmptyStateKey,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Layout storage write failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum DesignerError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A gesture is already active; end it before starting another")]
    GestureActive,

    #[error("No workflow definition is open")]
    NoActiveDefinition,

    #[error("State '{0}' is not part of the open definition")]
    UnknownState(String),

    #[error("Transition #{0} is not part of the open definition")]
    UnknownTransition(usize),

    #[error("Position ({x}, {y}) for state '{state_key}' is not finite")]
    InvalidPosition { state_key: String, x: f32, y: f32 },

    #[error("No transition proposal is open")]
    NoPendingProposal,
}

pub type Result<T> = std::result::Result<T, DesignerError>;
