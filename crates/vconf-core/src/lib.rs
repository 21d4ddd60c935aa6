//! vconf Core Library
//!
//! A versioned, file-backed registry of configuration objects. Config
//! kinds are registered once at startup, stored instances are discovered
//! on disk and grouped into a category tree, and edits flow back to disk
//! through a confirm-then-write save workflow.

pub mod category;
pub mod error;
pub mod hierarchy;
pub mod instance;
pub mod kind;
pub mod locator;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod workspace;

pub use error::{RegistryError, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Kinds and instances
    pub use crate::instance::{ConfigInstance, Decoded};
    pub use crate::kind::{
        ConfigKind, Fields, KindCapability, KindDefinition, KindId, KindRegistry,
    };

    // Discovery and naming
    pub use crate::category::{BucketPolicy, CategoryNamer, CategoryPath};
    pub use crate::locator::{InstanceLocator, LocatedInstance, ScanResult};

    // Hierarchy and session
    pub use crate::hierarchy::{
        CategoryTree, Hierarchy, HierarchyBuilder, InstanceHandle, TreeNode,
    };
    pub use crate::session::SessionState;

    // Persistence
    pub use crate::persistence::{
        ClipboardSink, Clock, DestinationPicker, DestinationRequest, SaveOutcome,
        StorageRefresher, SystemClock, WorkflowState,
    };

    // Settings
    pub use crate::settings::Settings;

    pub use crate::error::{RegistryError, Result};
    pub use crate::workspace::{InstanceSummary, Workspace};
}
