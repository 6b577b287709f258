//! # Configuration
//!
//! Plugin configuration loaded from the environment.

mod plugin;

pub use plugin::PluginConfig;
