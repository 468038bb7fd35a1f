pub mod acquisition_error;
pub mod camera_backend;
pub mod capture_request;
pub mod frame_source;
