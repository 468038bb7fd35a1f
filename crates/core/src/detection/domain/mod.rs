pub mod errors;
pub mod inference_service;
pub mod object_detector;
