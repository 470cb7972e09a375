//! # rstkit-build
//!
//! Turns an assembled document into a downloadable site archive: stage a
//! throwaway Sphinx project, run `sphinx-build` against it, zip the output.

pub mod archive;
pub mod orchestrator;
pub mod retain;
pub mod staging;
pub mod templates;

pub use archive::{zip_dir, ArchiveError};
pub use orchestrator::{
    BuildArtifact, BuildError, BuildOrchestrator, BuildPhase, BuildSettings, BuildSummary,
};
pub use retain::{RetainedOutput, RetainedSlot};
pub use templates::TemplateSource;
