//! # System Interaction Layer
//!
//! This module provides abstractions for interacting with the underlying operating system.
//! It serves as a boundary between the core application logic and the specifics of process
//! management and platform history stores.
//!
//! ## Modules
//!
//! - **`toeexpand`**: Runs TouchDesigner's bundled `toeexpand` tool against a project file
//!   to determine the build that wrote it, with a hard timeout.
//! - **`launcher`**: Spawns a TouchDesigner installation on a project file and detaches,
//!   going through LaunchServices on macOS.
//! - **`native_recents`**: Read-only access to TouchDesigner's own recent-file history
//!   (the shared-file-list document on macOS, the synced snapshot elsewhere).

pub mod launcher;
pub mod native_recents;
pub mod toeexpand;
