pub mod capture_manager;
pub mod domain;
pub mod infrastructure;
