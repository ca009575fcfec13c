//! Sound Menu - route each application's audio to an output device
//!
//! The engine decodes the external tool's tab-separated dump into an
//! inventory of running audio applications and output devices, keeps a
//! persistent list of favorite (application, device) pairs, and builds the
//! menu structures the tray renders.

pub mod audio_tool;
pub mod cli;
pub mod config;
pub mod dump;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod inventory;
pub mod paths;
pub mod refresher;
pub mod tray;
pub mod view;

pub use engine::{Engine, Snapshot};
pub use error::{DecodeError, RefreshError, StoreError, ToolError};
