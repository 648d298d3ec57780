//! OCR for in-game counters
//!
//! Counters such as `42/100` are read by isolating the letter colour,
//! optionally stripping a leading icon, and handing the cleaned image to an
//! [`OcrBackend`].

use std::path::Path;

use image::{GrayImage, Luma, RgbaImage};

use super::button::{Button, Color};
use super::capture::crop;

/// Recognizes text in a cleaned grayscale image (dark text, light ground)
pub trait OcrBackend {
    fn recognize(&self, image: &GrayImage) -> String;
}

/// Result of reading an `a/b` counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterReading {
    pub current: i32,
    pub remain: i32,
    pub total: i32,
}

impl CounterReading {
    pub fn new(current: i32, total: i32) -> Self {
        Self {
            current,
            remain: total.saturating_sub(current),
            total,
        }
    }
}

/// Drop everything left of the first dark column plus `length` more columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeftStrip {
    pub threshold: u8,
    pub length: u32,
}

/// Reads an `a/b` counter from a button's area
#[derive(Debug, Clone)]
pub struct DigitCounter {
    pub button: Button,
    /// Text colour
    pub letter: Color,
    /// Colour distance that maps to white
    pub threshold: u8,
    pub name: String,
    pub left_strip: Option<LeftStrip>,
}

impl DigitCounter {
    pub fn new(button: Button, letter: Color, threshold: u8, name: impl Into<String>) -> Self {
        Self {
            button,
            letter,
            threshold,
            name: name.into(),
            left_strip: None,
        }
    }

    /// Strip a leading icon baked into the capture area
    pub fn with_left_strip(mut self, threshold: u8, length: u32) -> Self {
        self.left_strip = Some(LeftStrip { threshold, length });
        self
    }

    /// Isolate the text of an already-cropped counter image
    pub fn pre_process(&self, image: &RgbaImage) -> GrayImage {
        let image = extract_letters(image, self.letter, self.threshold);
        match self.left_strip {
            Some(strip) => image_left_strip(&image, strip.threshold, strip.length),
            None => image,
        }
    }

    /// Read the counter from a full screenshot.
    ///
    /// Unreadable text yields a zero reading rather than an error; callers
    /// poll again on the next frame.
    pub fn ocr(&self, frame: &RgbaImage, backend: &dyn OcrBackend) -> CounterReading {
        let Some(region) = crop(frame, self.button.area) else {
            log::warn!("{}: area is off screen", self.name);
            return CounterReading::default();
        };
        let text = backend.recognize(&self.pre_process(&region));
        match parse_counter(&text) {
            Some(reading) => {
                log::info!(
                    "{}: {}/{}",
                    self.name,
                    reading.current,
                    reading.total
                );
                reading
            }
            None => {
                log::warn!("{}: unexpected ocr result {:?}", self.name, text);
                CounterReading::default()
            }
        }
    }
}

/// Map each pixel to its distance from `letter`, scaled so that
/// `threshold` becomes white. Text in the letter colour ends up black.
pub fn extract_letters(image: &RgbaImage, letter: Color, threshold: u8) -> GrayImage {
    let scale = 255.0 / threshold.max(1) as f32;
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        let mut positive = 0u8;
        let mut negative = 0u8;
        for (channel, reference) in pixel.0.iter().zip(letter.iter()) {
            positive = positive.max(channel.saturating_sub(*reference));
            negative = negative.max(reference.saturating_sub(*channel));
        }
        let distance = positive.saturating_add(negative) as f32;
        Luma([(distance * scale).min(255.0) as u8])
    })
}

/// Remove the left margin up to the first column darker than `threshold`,
/// plus `length` columns after it. The image is kept as is when nothing is
/// dark or the cut would leave no columns.
pub fn image_left_strip(image: &GrayImage, threshold: u8, length: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if height == 0 {
        return image.clone();
    }
    let first_dark = (0..width).find(|&x| {
        let sum: u32 = (0..height).map(|y| image.get_pixel(x, y)[0] as u32).sum();
        (sum as f32 / height as f32) < threshold as f32
    });
    match first_dark {
        Some(x) if x + length < width => {
            let left = x + length;
            image::imageops::crop_imm(image, left, 0, width - left, height).to_image()
        }
        _ => image.clone(),
    }
}

/// Parse `current/total`, tolerating common digit misreads.
///
/// `current` is capped at `total`.
pub fn parse_counter(text: &str) -> Option<CounterReading> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            'O' | 'o' | 'D' | 'Q' => '0',
            'I' | 'l' | 'i' | '|' => '1',
            'S' | 's' => '5',
            'B' => '8',
            'Z' | 'z' => '2',
            other => other,
        })
        .collect();
    let (current, total) = cleaned.split_once('/')?;
    let current: i32 = current.parse().ok()?;
    let total: i32 = total.parse().ok()?;
    Some(CounterReading::new(current.min(total), total))
}

/// Glyph width/height used when comparing a segment to a glyph
const GLYPH_COMPARE_SIZE: (u32, u32) = (12, 20);

/// A pixel darker than this is ink
const INK_THRESHOLD: u8 = 128;

/// Minimum similarity for a segment to be accepted as a glyph
const MIN_GLYPH_SIMILARITY: f32 = 0.7;

/// Glyph-template digit recognizer.
///
/// Splits the image into runs of inked columns and labels each run with
/// the most similar glyph. Suited to the fixed pixel fonts of game
/// counters.
pub struct TemplateDigits {
    glyphs: Vec<(char, GrayImage)>,
}

impl TemplateDigits {
    /// Build from in-memory glyphs
    pub fn from_glyphs(glyphs: Vec<(char, GrayImage)>) -> Self {
        let glyphs = glyphs
            .into_iter()
            .filter_map(|(c, glyph)| trim_to_ink(&glyph).map(|glyph| (c, glyph)))
            .collect();
        Self { glyphs }
    }

    /// Load `0.png` .. `9.png` and `slash.png` from a directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, OcrError> {
        let dir = dir.as_ref();
        let mut glyphs = Vec::new();
        for c in "0123456789/".chars() {
            let file = if c == '/' {
                "slash.png".to_string()
            } else {
                format!("{}.png", c)
            };
            let path = dir.join(&file);
            let glyph = image::open(&path)
                .map_err(|source| OcrError::Glyph { file, source })?
                .to_luma8();
            glyphs.push((c, glyph));
        }
        log::info!("Loaded {} OCR glyphs from {}", glyphs.len(), dir.display());
        Ok(Self::from_glyphs(glyphs))
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    fn classify(&self, segment: &GrayImage) -> Option<char> {
        let mut best: Option<(char, f32)> = None;
        for (c, glyph) in &self.glyphs {
            let score = compare_glyphs(segment, glyph);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((*c, score));
            }
        }
        best.filter(|(_, score)| *score >= MIN_GLYPH_SIMILARITY)
            .map(|(c, _)| c)
    }
}

impl OcrBackend for TemplateDigits {
    fn recognize(&self, image: &GrayImage) -> String {
        let (width, height) = image.dimensions();
        let inked = |x: u32| (0..height).any(|y| image.get_pixel(x, y)[0] < INK_THRESHOLD);

        let mut text = String::new();
        let mut x = 0;
        while x < width {
            if !inked(x) {
                x += 1;
                continue;
            }
            let start = x;
            while x < width && inked(x) {
                x += 1;
            }
            let column = image::imageops::crop_imm(image, start, 0, x - start, height).to_image();
            if let Some(segment) = trim_to_ink(&column) {
                match self.classify(&segment) {
                    Some(c) => text.push(c),
                    None => log::debug!("Unrecognized glyph at x={}", start),
                }
            }
        }
        text
    }
}

/// Crop to the bounding box of ink pixels
fn trim_to_ink(image: &GrayImage) -> Option<GrayImage> {
    let (width, height) = image.dimensions();
    let ink = |x: u32, y: u32| image.get_pixel(x, y)[0] < INK_THRESHOLD;
    let xs: Vec<u32> = (0..width).filter(|&x| (0..height).any(|y| ink(x, y))).collect();
    let ys: Vec<u32> = (0..height).filter(|&y| (0..width).any(|x| ink(x, y))).collect();
    let (x1, x2) = (*xs.first()?, *xs.last()?);
    let (y1, y2) = (*ys.first()?, *ys.last()?);
    Some(image::imageops::crop_imm(image, x1, y1, x2 - x1 + 1, y2 - y1 + 1).to_image())
}

/// Pixel similarity of two glyph images after resizing both, `0.0..=1.0`
fn compare_glyphs(a: &GrayImage, b: &GrayImage) -> f32 {
    let (w, h) = GLYPH_COMPARE_SIZE;
    let a = image::imageops::resize(a, w, h, image::imageops::FilterType::Nearest);
    let b = image::imageops::resize(b, w, h, image::imageops::FilterType::Nearest);

    let total_diff: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| (pa[0] as i32 - pb[0] as i32).unsigned_abs() as u64)
        .sum();
    let avg_diff = total_diff as f32 / (w * h) as f32;
    1.0 - (avg_diff / 255.0)
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Failed to load glyph {file}: {source}")]
    Glyph {
        file: String,
        source: image::ImageError,
    },
}
