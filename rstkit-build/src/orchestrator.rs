//! Build orchestration: Staging → Building → Packaging → Done.
//!
//! Each invocation gets its own uniquely named staging root under the work
//! root. The root is a [`tempfile::TempDir`], so it is removed when the
//! build future completes, fails, or is dropped mid-flight. The only state
//! outliving a build is the returned archive and, when configured, the
//! retained copy of the rendered output.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use rstkit_core::Config;
use serde::Serialize;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::archive::{zip_dir, ArchiveError};
use crate::retain::RetainedOutput;
use crate::staging::{stage_project, StagedProject};
use crate::templates::TemplateSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    Staging,
    Building,
    Packaging,
    Done,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildPhase::Staging => "staging",
            BuildPhase::Building => "building",
            BuildPhase::Packaging => "packaging",
            BuildPhase::Done => "done",
        })
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{phase} failed: {source}")]
    Io {
        phase: BuildPhase,
        #[source]
        source: io::Error,
    },

    #[error("build tool {bin:?} unavailable: {source}")]
    ToolUnavailable {
        bin: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("build tool failed (exit {exit_code:?}): {diagnostics}")]
    BuildFailed {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    #[error("packaging failed: {0}")]
    Packaging(#[from] ArchiveError),

    #[error("build task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

impl BuildError {
    /// Phase the build was in when it failed.
    pub fn phase(&self) -> BuildPhase {
        match self {
            BuildError::Io { phase, .. } => *phase,
            BuildError::ToolUnavailable { .. } | BuildError::BuildFailed { .. } => {
                BuildPhase::Building
            }
            BuildError::Packaging(_) => BuildPhase::Packaging,
            BuildError::Aborted(_) => BuildPhase::Staging,
        }
    }

    fn io(phase: BuildPhase) -> impl FnOnce(io::Error) -> BuildError {
        move |source| BuildError::Io { phase, source }
    }
}

/// Everything a build needs, fixed at construction time.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub sphinx_bin: PathBuf,
    pub builder: String,
    pub templates: TemplateSource,
    pub work_root: PathBuf,
    pub retain_dir: Option<PathBuf>,
    pub archive_name: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl BuildSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sphinx_bin: config.sphinx_bin(),
            builder: config.build.builder.clone(),
            templates: TemplateSource::from_dir(config.template_dir()),
            work_root: config.work_root(),
            retain_dir: config.retain_dir(),
            archive_name: config.build.archive_name.clone(),
        }
    }
}

/// A packaged build, owned by the caller.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub sphinx_bin: PathBuf,
    pub builder: String,
    pub template_dir: Option<PathBuf>,
    pub work_root: PathBuf,
    pub retain_dir: Option<PathBuf>,
}

/// Runs isolated Sphinx builds over assembled documents.
#[derive(Debug)]
pub struct BuildOrchestrator {
    settings: BuildSettings,
    retained: Option<RetainedOutput>,
}

impl BuildOrchestrator {
    pub fn new(settings: BuildSettings) -> Self {
        let retained = settings.retain_dir.clone().map(RetainedOutput::new);
        Self { settings, retained }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn retained_path(&self) -> Option<&Path> {
        self.retained.as_ref().map(RetainedOutput::path)
    }

    /// Check that the build tool can be spawned at all.
    pub async fn ensure_ready(&self) -> Result<(), BuildError> {
        let output = Command::new(tool_path(&self.settings.sphinx_bin))
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| BuildError::ToolUnavailable {
                bin: self.settings.sphinx_bin.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(BuildError::BuildFailed {
                exit_code: output.status.code(),
                diagnostics: diagnostics(&output.stdout, &output.stderr),
            });
        }
        info!(
            bin = %self.settings.sphinx_bin.display(),
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "build tool ready"
        );
        Ok(())
    }

    /// Build `document` and return the zipped output tree.
    #[instrument(skip_all, fields(doc_bytes = document.len()))]
    pub async fn build(&self, document: &str) -> Result<BuildArtifact, BuildError> {
        let started_at = Instant::now();
        let settings = &self.settings;

        tokio::fs::create_dir_all(&settings.work_root)
            .await
            .map_err(BuildError::io(BuildPhase::Staging))?;
        // The tool runs from inside the root, so its arguments must be absolute.
        let work_root = tokio::fs::canonicalize(&settings.work_root)
            .await
            .map_err(BuildError::io(BuildPhase::Staging))?;
        // Dropping the TempDir removes the whole root on every exit path. Each
        // blocking step takes ownership of it and hands it back, so whichever
        // task finishes last performs the removal.
        let staging = tempfile::Builder::new()
            .prefix("rstkit-build-")
            .tempdir_in(&work_root)
            .map_err(BuildError::io(BuildPhase::Staging))?;
        info!(phase = %BuildPhase::Staging, root = %staging.path().display(), "staging project");

        let (staging, project) = {
            let templates = settings.templates.clone();
            let document = document.to_string();
            let builder = settings.builder.clone();
            tokio::task::spawn_blocking(move || {
                let project = stage_project(staging.path(), &templates, &document, &builder);
                (staging, project)
            })
            .await?
        };
        let project = project.map_err(BuildError::io(BuildPhase::Staging))?;

        self.run_tool(&project).await?;

        info!(phase = %BuildPhase::Packaging, output = %project.output_dir.display(), "packaging output");
        let (staging, bytes) = {
            let output_dir = project.output_dir.clone();
            tokio::task::spawn_blocking(move || {
                let bytes = zip_dir(&output_dir);
                (staging, bytes)
            })
            .await?
        };
        let bytes = bytes?;

        let staging = match &self.retained {
            Some(retained) => {
                let slot = retained.acquire().await;
                let output_dir = project.output_dir.clone();
                let (staging, copied) = tokio::task::spawn_blocking(move || {
                    let copied = slot.replace_from(&output_dir);
                    (staging, copied)
                })
                .await?;
                if let Err(err) = copied {
                    warn!(
                        dir = %retained.path().display(),
                        error = %err,
                        "failed to refresh retained output"
                    );
                }
                staging
            }
            None => staging,
        };

        info!(
            phase = %BuildPhase::Done,
            archive_bytes = bytes.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "build complete"
        );
        remove_root(staging).await;

        Ok(BuildArtifact {
            file_name: settings.archive_name.clone(),
            bytes,
        })
    }

    async fn run_tool(&self, project: &StagedProject) -> Result<(), BuildError> {
        let settings = &self.settings;
        info!(
            phase = %BuildPhase::Building,
            bin = %settings.sphinx_bin.display(),
            builder = %settings.builder,
            "running build tool"
        );

        let tool_started_at = Instant::now();
        let output = Command::new(tool_path(&settings.sphinx_bin))
            .arg("-b")
            .arg(&settings.builder)
            .arg(&project.source_dir)
            .arg(&project.output_dir)
            .current_dir(&project.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| {
                warn!(bin = %settings.sphinx_bin.display(), error = %source, "failed to spawn build tool");
                if source.kind() == io::ErrorKind::NotFound {
                    BuildError::ToolUnavailable {
                        bin: settings.sphinx_bin.clone(),
                        source,
                    }
                } else {
                    BuildError::io(BuildPhase::Building)(source)
                }
            })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            let diagnostics = diagnostics(&output.stdout, &output.stderr);
            warn!(
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                tool_elapsed_ms = tool_started_at.elapsed().as_millis() as u64,
                stderr = %diagnostics,
                "build tool failed"
            );
            return Err(BuildError::BuildFailed {
                exit_code,
                diagnostics,
            });
        }

        debug!(
            tool_elapsed_ms = tool_started_at.elapsed().as_millis() as u64,
            stdout = %String::from_utf8_lossy(&output.stdout),
            "build tool finished"
        );
        Ok(())
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            sphinx_bin: self.settings.sphinx_bin.clone(),
            builder: self.settings.builder.clone(),
            template_dir: match &self.settings.templates {
                TemplateSource::Directory(dir) => Some(dir.clone()),
                TemplateSource::Embedded => None,
            },
            work_root: self.settings.work_root.clone(),
            retain_dir: self.settings.retain_dir.clone(),
        }
    }
}

/// Remove the staging root off the async workers, reporting what `Drop` would swallow.
async fn remove_root(staging: TempDir) {
    let root = staging.path().to_path_buf();
    match tokio::task::spawn_blocking(move || staging.close()).await {
        Ok(Ok(())) => debug!(root = %root.display(), "staging root removed"),
        Ok(Err(err)) => warn!(root = %root.display(), error = %err, "failed to remove staging root"),
        Err(err) => warn!(root = %root.display(), error = %err, "staging cleanup task failed"),
    }
}

/// Relative paths with a directory part would otherwise resolve against the
/// staging root the tool runs in. Bare names are left for PATH lookup.
fn tool_path(bin: &Path) -> PathBuf {
    if bin.is_relative() && bin.components().count() > 1 {
        std::path::absolute(bin).unwrap_or_else(|_| bin.to_path_buf())
    } else {
        bin.to_path_buf()
    }
}

/// Prefer stderr; fall back to stdout when the tool reported nothing there.
fn diagnostics(stdout: &[u8], stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(stdout).trim().to_string()
    } else {
        stderr
    }
}
