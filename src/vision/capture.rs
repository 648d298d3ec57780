//! Screen capture handling
//!
//! Holds the latest screenshot and answers colour questions about regions
//! of it.

use image::{Rgba, RgbaImage};

use super::button::{Area, Color};

/// Latest screenshot plus a frame counter
pub struct ScreenCapture {
    /// Current frame as RGBA image
    current_frame: Option<RgbaImage>,
    /// Frame counter
    frame_count: u64,
}

impl ScreenCapture {
    /// Create a new screen capture handler
    pub fn new() -> Self {
        Self {
            current_frame: None,
            frame_count: 0,
        }
    }

    /// Replace the current frame
    pub fn set_frame(&mut self, frame: RgbaImage) {
        self.current_frame = Some(frame);
        self.frame_count += 1;
    }

    /// Get the current frame
    pub fn current_frame(&self) -> Option<&RgbaImage> {
        self.current_frame.as_ref()
    }

    /// Get screen dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.current_frame
            .as_ref()
            .map_or((0, 0), |frame| frame.dimensions())
    }

    /// Get the frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Check if we have a valid frame
    pub fn has_frame(&self) -> bool {
        self.current_frame.is_some()
    }
}

impl Default for ScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Crop an area out of an image, clipped to the image bounds
pub fn crop(image: &RgbaImage, area: Area) -> Option<RgbaImage> {
    let (x, y, w, h) = area.clip(image.width(), image.height())?;
    Some(image::imageops::crop_imm(image, x, y, w, h).to_image())
}

/// Mean colour of an area
pub fn get_color(image: &RgbaImage, area: Area) -> Option<[f32; 3]> {
    let region = crop(image, area)?;
    let count = (region.width() * region.height()) as f32;
    let mut sum = [0f32; 3];
    for pixel in region.pixels() {
        for (total, channel) in sum.iter_mut().zip(pixel.0.iter()) {
            *total += *channel as f32;
        }
    }
    Some(sum.map(|total| total / count))
}

/// Sum of the largest positive and largest negative channel difference.
///
/// Zero for identical colours; a uniform brightness shift of `n` costs `n`,
/// a hue change costs more.
fn color_distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let mut positive = 0f32;
    let mut negative = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let diff = x - y;
        positive = positive.max(diff);
        negative = negative.max(-diff);
    }
    positive + negative
}

/// Whether two colours are within `threshold` of each other
pub fn color_similar(a: [f32; 3], b: Color, threshold: f32) -> bool {
    color_distance(a, b.map(f32::from)) <= threshold
}

/// Per-pixel similarity to a reference colour, 255 meaning identical
pub fn color_similarity(pixel: &Rgba<u8>, color: Color) -> u8 {
    let pixel = [pixel[0], pixel[1], pixel[2]].map(f32::from);
    let distance = color_distance(pixel, color.map(f32::from)).min(255.0);
    255 - distance as u8
}

/// Count pixels of an area whose similarity to `color` is at least `threshold`
pub fn count_color(image: &RgbaImage, area: Area, color: Color, threshold: u8) -> usize {
    let Some(region) = crop(image, area) else {
        return 0;
    };
    region
        .pixels()
        .filter(|pixel| color_similarity(pixel, color) >= threshold)
        .count()
}
