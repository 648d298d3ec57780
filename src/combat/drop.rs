//! Drop tracking during battle result screens

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use image::RgbaImage;

use crate::vision::Screen;

/// Collects evidence of what a battle dropped.
///
/// Called right before the result screen is dismissed.
pub trait DropRecord {
    fn handle_add(&mut self, screen: &dyn Screen);
}

/// Keeps copies of result screens for later saving
#[derive(Debug, Default)]
pub struct DropImage {
    images: Vec<(NaiveDateTime, RgbaImage)>,
}

impl DropImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> impl Iterator<Item = &RgbaImage> {
        self.images.iter().map(|(_, image)| image)
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Write every kept image to `dir` as `<timestamp>_<index>.png`
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, DropError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| DropError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut saved = Vec::with_capacity(self.images.len());
        for (index, (time, image)) in self.images.iter().enumerate() {
            let path = dir.join(format!("{}_{}.png", time.format("%Y%m%d_%H%M%S_%3f"), index));
            image.save(&path).map_err(|source| DropError::Save {
                path: path.clone(),
                source,
            })?;
            saved.push(path);
        }
        log::info!("Saved {} drop images to {}", saved.len(), dir.display());
        Ok(saved)
    }
}

impl DropRecord for DropImage {
    fn handle_add(&mut self, screen: &dyn Screen) {
        match screen.image() {
            Some(image) => self.images.push((Local::now().naive_local(), image.clone())),
            None => log::warn!("Drop record requested without a screenshot"),
        }
    }
}

/// Drop image errors
#[derive(Debug, thiserror::Error)]
pub enum DropError {
    #[error("Failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}
