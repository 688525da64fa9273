// Shared type definitions for the orchestration core.

pub mod download;
pub mod errors;
pub mod events;
pub mod extension;
pub mod geometry;
pub mod permission;
pub mod window_state;
