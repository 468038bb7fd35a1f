pub mod fixed_rate_scheduler;
