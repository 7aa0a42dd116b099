//! Configuration and logging shared across dmesh crates.
//!
//! - **Configuration**: Strongly typed, profile-aware operator configuration (`config`).
//! - **Telemetry**: Console, rolling-file and audit log initialisation (`telemetry`).
pub mod config;
pub mod telemetry;
