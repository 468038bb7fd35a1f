pub mod detection_loop;
pub mod frame_scheduler;
pub mod infrastructure;
pub mod live_pipeline;
pub mod liveness;
pub mod pipeline_config;
pub mod pipeline_error;
pub mod pipeline_state;

#[cfg(test)]
pub(crate) mod test_support;
