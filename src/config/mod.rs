//! Configuration module
//!
//! [`Config`] is the user's JSON configuration tree addressed by dotted
//! keys (`OpsiAshBeacon.Scheduler.NextRun`); [`Settings`] is the typed
//! runtime section stored under its `Settings` key.

pub mod settings;
pub mod store;

pub use settings::{Settings, TimingSettings};
pub use store::{Config, ConfigError, DEFAULT_TIME};
