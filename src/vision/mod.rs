//! Vision and image processing module
//!
//! [`Screen`] is the perception and input surface the handlers poll:
//! "is this button on screen", "how many pixels of this colour", "what does
//! this counter read", "click it". [`VisionSystem`] implements it on top of
//! a [`Device`].

pub mod assets;
pub mod button;
pub mod capture;
pub mod ocr;
pub mod recognition;
pub mod timer;

use std::collections::HashMap;
use std::time::Duration;

use image::RgbaImage;

use crate::device::{Device, DeviceError};
use crate::stealth::{Humanizer, StealthConfig};

pub use assets::{AssetTable, Server};
pub use button::{Area, Button, Color, Offset};
pub use capture::ScreenCapture;
pub use ocr::{CounterReading, DigitCounter, OcrBackend, TemplateDigits};
pub use recognition::TemplateLibrary;
pub use timer::Timer;

/// Maximum colour distance for a colour-only `appear`
pub const COLOR_SIMILAR_THRESHOLD: f32 = 10.0;

/// Perception and input, one screenshot at a time.
///
/// All queries answer against the frame taken by the last `screenshot`.
pub trait Screen {
    /// Take a new screenshot
    fn screenshot(&mut self) -> Result<(), VisionError>;

    /// The current screenshot
    fn image(&self) -> Option<&RgbaImage>;

    /// Whether `button` is on screen.
    ///
    /// With an `offset` the button's template is searched in its area grown
    /// by that margin; without one only the mean colour is compared. With an
    /// `interval` the button is reported at most once per interval.
    fn appear(&mut self, button: &Button, offset: Option<Offset>, interval: Option<Duration>)
        -> bool;

    /// Whether at least `count` pixels of the button's area have similarity
    /// `threshold` or better to `color`
    fn image_color_count(&self, button: &Button, color: Color, threshold: u8, count: usize) -> bool;

    /// Read a counter from the current screenshot
    fn ocr(&mut self, counter: &DigitCounter) -> CounterReading;

    /// Click a button
    fn click(&mut self, button: &Button) -> Result<(), VisionError>;

    /// Sleep for a random time within `(low, high)` seconds
    fn sleep(&mut self, range: (f32, f32));

    /// `appear`, and click the button if it did
    fn appear_then_click(
        &mut self,
        button: &Button,
        offset: Option<Offset>,
        interval: Option<Duration>,
    ) -> Result<bool, VisionError> {
        if self.appear(button, offset, interval) {
            self.click(button)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Screen implementation over a real or replayed device
pub struct VisionSystem<D> {
    device: D,
    capture: ScreenCapture,
    templates: TemplateLibrary,
    ocr: Box<dyn OcrBackend>,
    humanizer: Humanizer,
    stealth: StealthConfig,
    interval_timers: HashMap<String, Timer>,
    /// Where each button was last found relative to its nominal area
    button_offsets: HashMap<String, (i32, i32)>,
}

impl<D: Device> VisionSystem<D> {
    /// Create a new vision system
    pub fn new(device: D, ocr: Box<dyn OcrBackend>) -> Self {
        Self {
            device,
            capture: ScreenCapture::new(),
            templates: TemplateLibrary::new(),
            ocr,
            humanizer: Humanizer::new(),
            stealth: StealthConfig::default(),
            interval_timers: HashMap::new(),
            button_offsets: HashMap::new(),
        }
    }

    pub fn with_stealth(mut self, stealth: StealthConfig) -> Self {
        self.stealth = stealth;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn templates_mut(&mut self) -> &mut TemplateLibrary {
        &mut self.templates
    }

    /// Forget all interval timers, e.g. when entering a new page
    pub fn interval_clear(&mut self) {
        for timer in self.interval_timers.values_mut() {
            timer.clear();
        }
    }

    fn appear_on(&mut self, button: &Button, offset: Option<Offset>) -> bool {
        let Some(frame) = self.capture.current_frame() else {
            return false;
        };

        let template = match (offset, &button.file) {
            (Some(_), Some(file)) => self.templates.get(file),
            (Some(_), None) => {
                log::debug!("{} has no template, comparing colour only", button);
                None
            }
            _ => None,
        };

        match (offset, template) {
            (Some(offset), Some(template)) => {
                match recognition::match_in_area(frame, template, button.area, offset) {
                    Some(found) if found.similarity >= recognition::TEMPLATE_SIMILARITY => {
                        self.button_offsets.insert(button.name.clone(), found.offset);
                        true
                    }
                    _ => false,
                }
            }
            _ => {
                let appear = capture::get_color(frame, button.area).is_some_and(|color| {
                    capture::color_similar(color, button.color, COLOR_SIMILAR_THRESHOLD)
                });
                if appear {
                    self.button_offsets.insert(button.name.clone(), (0, 0));
                }
                appear
            }
        }
    }
}

impl<D: Device> Screen for VisionSystem<D> {
    fn screenshot(&mut self) -> Result<(), VisionError> {
        let frame = self.device.screenshot()?;
        self.capture.set_frame(frame);
        Ok(())
    }

    fn image(&self) -> Option<&RgbaImage> {
        self.capture.current_frame()
    }

    fn appear(
        &mut self,
        button: &Button,
        offset: Option<Offset>,
        interval: Option<Duration>,
    ) -> bool {
        if let Some(interval) = interval {
            let timer = self
                .interval_timers
                .entry(button.name.clone())
                .or_insert_with(|| Timer::new(interval));
            if timer.limit() != interval {
                *timer = Timer::new(interval);
            }
            if !timer.reached() {
                return false;
            }
        }

        let appear = self.appear_on(button, offset);

        if appear && interval.is_some() {
            if let Some(timer) = self.interval_timers.get_mut(&button.name) {
                timer.reset();
            }
        }
        appear
    }

    fn image_color_count(&self, button: &Button, color: Color, threshold: u8, count: usize) -> bool {
        self.capture.current_frame().is_some_and(|frame| {
            capture::count_color(frame, button.area, color, threshold) >= count
        })
    }

    fn ocr(&mut self, counter: &DigitCounter) -> CounterReading {
        match self.capture.current_frame() {
            Some(frame) => counter.ocr(frame, self.ocr.as_ref()),
            None => {
                log::warn!("{}: no screenshot to read", counter.name);
                CounterReading::default()
            }
        }
    }

    fn click(&mut self, button: &Button) -> Result<(), VisionError> {
        let offset = self
            .button_offsets
            .get(&button.name)
            .copied()
            .unwrap_or((0, 0));
        let area = button.button.shift(offset);
        let (x, y) = if self.stealth.humanize_position {
            self.humanizer.random_point(area)
        } else {
            area.center()
        };
        log::info!("Click ({:>4}, {:>4}) @ {}", x, y, button);
        self.device.tap(x, y)?;

        if self.stealth.enable_micro_pauses
            && self
                .humanizer
                .should_micro_pause(self.stealth.micro_pause_probability)
        {
            let pause = self.humanizer.micro_pause_duration();
            log::debug!("Micro-pause {:?}", pause);
            self.device.sleep(pause);
        }
        Ok(())
    }

    fn sleep(&mut self, range: (f32, f32)) {
        let mut duration = self.humanizer.random_duration(range);
        // Fixed waits get the configured variance
        if self.stealth.humanize_timing && range.0 >= range.1 {
            let ms = self.humanizer.humanize_delay(
                duration.as_millis() as u64,
                self.stealth.timing_variance_percent,
            );
            duration = Duration::from_millis(ms);
        }
        self.device.sleep(duration);
    }
}

/// Vision system errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}
