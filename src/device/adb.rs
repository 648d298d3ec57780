//! Device backed by the `adb` command line tool

use std::process::{Command, Output};

use image::RgbaImage;

use super::{Device, DeviceError};

/// Talks to an emulator or phone through `adb exec-out` / `adb shell`.
pub struct AdbDevice {
    serial: Option<String>,
}

impl AdbDevice {
    /// Use the only connected device
    pub fn new() -> Self {
        Self { serial: None }
    }

    /// Target a specific device (`adb -s <serial>`), e.g. `127.0.0.1:16384`
    pub fn with_serial(serial: impl Into<String>) -> Self {
        Self {
            serial: Some(serial.into()),
        }
    }

    /// Device serial, if one was pinned
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn command(&self) -> Command {
        let mut command = Command::new("adb");
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command
    }

    fn run(&self, args: &[&str]) -> Result<Output, DeviceError> {
        let output = self.command().args(args).output()?;
        if !output.status.success() {
            return Err(DeviceError::AdbFailed {
                command: args.join(" "),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl Default for AdbDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for AdbDevice {
    fn screenshot(&mut self) -> Result<RgbaImage, DeviceError> {
        let output = self.run(&["exec-out", "screencap", "-p"])?;
        if output.stdout.is_empty() {
            return Err(DeviceError::NoFrame);
        }
        Ok(image::load_from_memory(&output.stdout)?.to_rgba8())
    }

    fn tap(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
        let (x, y) = (x.to_string(), y.to_string());
        self.run(&["shell", "input", "tap", &x, &y])?;
        Ok(())
    }
}
