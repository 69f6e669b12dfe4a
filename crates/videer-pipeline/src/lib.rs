//! Pipeline orchestration.
//!
//! This crate sequences the Videer stages per render job:
//! collecting inputs → resolving footage → synthesizing narration →
//! building the timeline → rendering. Stages run strictly forward on a
//! background task; the front-end subscribes to a progress event channel
//! instead of polling shared state.

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod script;
pub mod timeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use orchestrator::{JobHandle, Pipeline};
pub use script::parse_script;
pub use timeline::plan_segment;
