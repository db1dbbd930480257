//! RSB packaging - buildset selection and job materialization
//!
//! This crate resolves which buildsets of an RTEMS Source Builder tree to
//! build, merges per-directory `configs.ini` overrides into them, turns each
//! one into a job descriptor for the set builder, and renders packaging
//! files (RPM spec files) from those jobs.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod job;
pub mod pipeline;
pub mod scan;
pub mod selection;
pub mod spec;

pub use backend::{backend_by_name, backend_for_host, Backend, BackendError, RpmBackend};
pub use catalog::{BuildsetEntry, BuildsetId, Catalog};
pub use config::{BuildParams, EffectiveParams, OverrideValue};
pub use job::{materialize, JobDescriptor};
pub use pipeline::{PipelineError, PipelineResult, Resolution};
