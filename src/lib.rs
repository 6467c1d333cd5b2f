//! Writing assistant core.
//!
//! A [`Workbench`] owns the editing surface, the generation controller, the
//! bounded history log and the saved stories. A [`GenerationRuntime`] runs
//! provider calls off the owning thread and feeds their resolutions back to
//! the workbench when flushed.
//!
//! # Lifecycle
//!
//! `idle --GENERATE--> generating --ok--> success --CONTINUE--> idle`,
//! `generating --err--> failure`, then `RETRY` (back to `generating`, same
//! messages) or `CANCEL` (back to `idle`). At most one provider call is ever
//! in flight.
//!
//! # Configuration
//!
//! See [`config::EnvConfig`] for the `STORYLOOM_*` variables and
//! [`logging::init_logging`] for log filtering.

pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod workbench;

pub use controller::{
    CompletionHost, GenerationController, GenerationState, GenerationStatus,
    DEFAULT_SYSTEM_INSTRUCTIONS,
};
pub use editor::{join_continuation, EditorSurface, TextBuffer};
pub use error::{classify_failure, GenerationError, GenerationEvent, StartError, TransitionError};
pub use runtime::{CompletionResolution, GenerationRuntime};
pub use workbench::Workbench;
