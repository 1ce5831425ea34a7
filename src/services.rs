pub mod pipeline_service;

pub use pipeline_service::{FileError, FileFailure, PipelineError, PipelineService, RunReport};
