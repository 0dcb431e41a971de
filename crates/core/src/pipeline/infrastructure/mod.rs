pub mod sequential_pipeline_executor;
pub mod threaded_pipeline_executor;
