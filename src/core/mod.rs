//! Core module - session state, persistence-independent types and workspace

pub mod autosave;
pub mod config;
pub mod hierarchy;
pub mod identity;
pub mod key;
pub mod session;
pub mod store;
pub mod validation;
pub mod value;
pub mod workspace;

pub use autosave::{AutoSave, AutosaveOutcome};
pub use config::{Backend, Config};
pub use hierarchy::{list_distinct, HierarchyColumn, Selection};
pub use identity::{IdParseError, RowId};
pub use key::{ContextId, FieldId, ValueKey};
pub use session::{SessionContext, SessionMeta, SessionSummary};
pub use store::ValueStore;
pub use validation::ValidationWarning;
pub use value::{Scalar, Table, Value};
pub use workspace::{Workspace, WorkspaceError};
