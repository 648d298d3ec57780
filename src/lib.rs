//! Ash Beacon - Operation Siren ash beacon automation for Android emulators
//!
//! This library watches the Operation Siren map through screenshots, decides
//! when an ash beacon is ready to attack, and handles the beacon battle
//! screens through simulated taps.
//!
//! ## Layers
//!
//! - `device` takes screenshots and taps (adb, or recorded frames)
//! - `vision` answers "is this button on screen" and reads counters
//! - `combat` drives a battle through its screens
//! - `beacon` holds the ash beacon logic on top of all of the above
//! - `config` reads the user configuration and calls scheduler tasks
//!
//! ## Anti-Detection
//!
//! The `stealth` module randomizes tap positions and waits so that input
//! does not repeat pixel for pixel.

pub mod beacon;
pub mod combat;
pub mod config;
pub mod device;
pub mod stealth;
pub mod vision;

#[cfg(test)]
pub(crate) mod testing;

pub use beacon::{AshCollectStatus, AshCombat, OpsiAsh};
pub use combat::{BattleOutcomeHandler, CombatEnd, CombatError};
pub use config::{Config, ConfigError, Settings};
pub use vision::{Screen, VisionSystem};

/// Any error the library can return
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] device::DeviceError),
    #[error(transparent)]
    Vision(#[from] vision::VisionError),
    #[error(transparent)]
    Asset(#[from] vision::assets::AssetError),
    #[error(transparent)]
    Ocr(#[from] vision::ocr::OcrError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Combat(#[from] CombatError),
    #[error(transparent)]
    Drop(#[from] combat::drop::DropError),
}
