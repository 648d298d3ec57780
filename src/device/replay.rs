//! Offline device that plays back recorded screenshots
//!
//! Used by the CLI to dry-run handlers against a folder of captures and by
//! tests to drive `VisionSystem` with synthetic frames.

use std::path::Path;
use std::time::Duration;

use image::RgbaImage;

use super::{Device, DeviceError};

/// Plays frames in order and records every tap and sleep.
///
/// Once the frames run out the last one is repeated, so a handler polling a
/// static screen keeps seeing it.
pub struct ReplayDevice {
    frames: Vec<RgbaImage>,
    cursor: usize,
    taps: Vec<(i32, i32)>,
    slept: Duration,
    real_sleep: bool,
}

impl ReplayDevice {
    /// Create a replay device from in-memory frames
    pub fn new(frames: Vec<RgbaImage>) -> Self {
        Self {
            frames,
            cursor: 0,
            taps: Vec::new(),
            slept: Duration::ZERO,
            real_sleep: false,
        }
    }

    /// Load every `*.png` in a directory, sorted by file name
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, DeviceError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            log::debug!("Loading replay frame {}", path.display());
            frames.push(image::open(path)?.to_rgba8());
        }
        log::info!(
            "Loaded {} replay frames from {}",
            frames.len(),
            dir.as_ref().display()
        );

        Ok(Self::new(frames))
    }

    /// Actually block in `sleep` instead of only accounting for it
    pub fn with_real_sleep(mut self, real_sleep: bool) -> Self {
        self.real_sleep = real_sleep;
        self
    }

    /// Taps performed so far
    pub fn taps(&self) -> &[(i32, i32)] {
        &self.taps
    }

    /// Total time requested through `sleep`
    pub fn slept(&self) -> Duration {
        self.slept
    }
}

impl Device for ReplayDevice {
    fn screenshot(&mut self) -> Result<RgbaImage, DeviceError> {
        let last = self.frames.len().checked_sub(1).ok_or(DeviceError::NoFrame)?;
        let frame = self.frames[self.cursor.min(last)].clone();
        if self.cursor < last {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn tap(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
        log::debug!("Replay tap at ({}, {})", x, y);
        self.taps.push((x, y));
        Ok(())
    }

    fn sleep(&mut self, duration: Duration) {
        self.slept += duration;
        if self.real_sleep {
            std::thread::sleep(duration);
        }
    }
}
