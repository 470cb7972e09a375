//! # rstkit-core
//!
//! Core library for rstkit.
//!
//! This crate turns typed content requests into reStructuredText fragments,
//! joins fragments into documents, and loads the shared `rstkit.yml`
//! configuration used by the build and storage crates.

pub mod config;
pub mod document;
pub mod fields;
pub mod fragment;
pub mod text;

pub use config::{BuildConfig, Config, ConfigError, ServerConfig, StoreConfig};
pub use document::{assemble, Document, DocumentError};
pub use fields::Fields;
pub use fragment::{format, Fragment, FragmentKind, FragmentRequest};
