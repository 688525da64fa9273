//! Cormorant — view/window/session orchestration for a multi-process
//! browser shell.
//!
//! This library crate exposes all modules for use by the binary and
//! integration tests. The windowing host and rendering engine sit behind
//! the capability traits in [`host`]; everything else is the coordinating
//! logic: per-window view registries, the window registry, session-level
//! services (permissions, downloads, extensions) and overlay dialogs.

pub mod app;
pub mod app_window;
pub mod constants;
pub mod crx;
pub mod dialogs;
pub mod host;
pub mod ipc;
pub mod sessions_service;
pub mod settings;
pub mod storage;
pub mod types;
pub mod view;
pub mod view_manager;
pub mod windows_service;
