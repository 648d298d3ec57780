//! Template matching for buttons that may drift on screen
//!
//! A button's reference image is a crop of its `area`. When a search
//! offset is given, the template is matched inside the area grown by that
//! offset and the best position is reported relative to the area.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbaImage};
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};

use super::button::{Area, Offset};
use super::capture::crop;

/// Minimum normalized correlation for a template to count as present
pub const TEMPLATE_SIMILARITY: f32 = 0.85;

/// Best template position inside a search window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// Normalized cross-correlation in `0.0..=1.0`
    pub similarity: f32,
    /// Displacement of the match from the button's nominal area
    pub offset: (i32, i32),
}

/// Search for `template` in `area` grown by `offset`
pub fn match_in_area(
    frame: &RgbaImage,
    template: &GrayImage,
    area: Area,
    offset: Offset,
) -> Option<TemplateMatch> {
    let search = area.expand(offset);
    let (x, y, _, _) = search.clip(frame.width(), frame.height())?;
    let window = image::imageops::grayscale(&crop(frame, search)?);

    if template.width() == 0
        || template.height() == 0
        || template.width() > window.width()
        || template.height() > window.height()
    {
        log::debug!(
            "Template {}x{} does not fit search window {}x{}",
            template.width(),
            template.height(),
            window.width(),
            window.height()
        );
        return None;
    }

    let scores = match_template(&window, template, MatchTemplateMethod::CrossCorrelationNormalized);
    let extremes = find_extremes(&scores);
    let (mx, my) = extremes.max_value_location;

    Some(TemplateMatch {
        similarity: extremes.max_value,
        offset: (x as i32 + mx as i32 - area.x1, y as i32 + my as i32 - area.y1),
    })
}

/// Lazily loaded grayscale templates, keyed by file path
#[derive(Default)]
pub struct TemplateLibrary {
    templates: HashMap<PathBuf, Option<GrayImage>>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-memory template for a path
    pub fn insert(&mut self, path: impl Into<PathBuf>, template: GrayImage) {
        self.templates.insert(path.into(), Some(template));
    }

    /// Get a template, reading it from disk on first use.
    ///
    /// Unreadable files are remembered as missing so the warning is logged
    /// once.
    pub fn get(&mut self, path: &Path) -> Option<&GrayImage> {
        self.templates
            .entry(path.to_path_buf())
            .or_insert_with(|| match image::open(path) {
                Ok(image) => Some(image.to_luma8()),
                Err(e) => {
                    log::warn!("Failed to load template {}: {}", path.display(), e);
                    None
                }
            })
            .as_ref()
    }
}
