//! Purpose: Define the stable public Rust API boundary for slicer-bridge.
//! Exports: The action entry points, collaborator traits, and their real implementations.
//! Role: Public, additive-only surface for hosts that embed the action.
//! Invariants: Hosts depend on these re-exports rather than on `core` paths.

pub use crate::core::action::{
    ActionContext, SELECT_PROMPT, SendReport, SlicerStatus, send_to_slicer, set_slicer_path,
    slicer_status,
};
pub use crate::core::config::{ConfigStore, JsonFileStore, SlicerPathConfig};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::export::{InterchangeFormat, allocate_export_path};
pub use crate::core::host::{
    BrowseRequest, Exporter, ObjectRef, SelectionProvider, SlicerBrowser, StatusChannel,
};
pub use crate::core::launch::{LaunchRequest, Launcher, SystemLauncher};
pub use crate::core::platform::{DEFAULT_MAC_BUNDLE, Platform, expand_home};
pub use crate::core::resolve::{
    Environment, PathSource, ProcessEnv, ResolvedSlicer, SLICER_PATH_ENV, resolve_slicer,
};
