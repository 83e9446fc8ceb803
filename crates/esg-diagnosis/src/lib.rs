pub mod config;
pub mod diagnosis;
pub mod error;
pub mod narrative;
pub mod telemetry;
