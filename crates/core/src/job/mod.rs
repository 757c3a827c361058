//! Job module: one soundpost conversion, start to finish.
//!
//! A [`JobRunner`] takes a [`JobRequest`] through
//! `Validating -> Acquiring -> Transforming -> Targeting (extract only) -> Finalizing`
//! inside a private [`Workspace`], and ends in exactly one [`JobOutcome`].
//! Progress, the overwrite prompt and the outcome travel to the caller as
//! [`JobEvent`]s over a channel; the runner never blocks on anything but
//! its collaborators and the overwrite reply.

mod config;
mod error;
mod finalize;
mod runner;
mod types;
mod workspace;

pub use config::{JobConfig, RunnerSettings};
pub use error::JobError;
pub use finalize::{destination_name, destination_path, place};
pub use runner::JobRunner;
pub use types::{JobEvent, JobMode, JobOutcome, JobRequest, JobState};
pub use workspace::Workspace;
