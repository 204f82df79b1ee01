pub mod backend;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod designer;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod intent;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod render;
pub mod scene;
pub mod scene_dump;
pub mod theme;

pub use backend::WorkflowBackend;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::DesignerConfig;
pub use designer::{DesignerEvent, LoadTicket, SubscriptionId, WorkflowDesigner};
pub use error::{BackendError, DesignerError, StorageError, ValidationError};
pub use layout::{FileStorage, LayoutStorage, MemoryStorage};
