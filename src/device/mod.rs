//! Device drivers
//!
//! A device hands out raw screenshots and performs taps. Everything above
//! this layer works in terms of buttons and never talks to the emulator
//! directly.

pub mod adb;
pub mod replay;

use std::time::Duration;

use image::RgbaImage;

pub use adb::AdbDevice;
pub use replay::ReplayDevice;

/// A screen source plus touch input.
pub trait Device {
    /// Capture the current screen.
    fn screenshot(&mut self) -> Result<RgbaImage, DeviceError>;

    /// Tap at a point in screen pixels.
    fn tap(&mut self, x: i32, y: i32) -> Result<(), DeviceError>;

    /// Block for the given duration.
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Device errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("No frame available")]
    NoFrame,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("adb {command} exited with {status}: {stderr}")]
    AdbFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Failed to decode screenshot: {0}")]
    Decode(#[from] image::ImageError),
}
