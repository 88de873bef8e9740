// Test modules

pub mod common;
mod stats_service_test;
