//! Scripted [`Screen`] double for handler tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::vision::{Area, Button, Color, CounterReading, DigitCounter, Offset, Screen, VisionError};

/// Answers queries from a script instead of pixels.
///
/// Each screenshot advances to the next scripted set of visible buttons; once
/// the script runs out the last set stays on screen.
pub(crate) struct ScriptedScreen {
    visible: HashSet<String>,
    script: VecDeque<HashSet<String>>,
    color_pixels: HashMap<(String, Color), usize>,
    readings: HashMap<String, VecDeque<CounterReading>>,
    frame: RgbaImage,
    pub screenshots: usize,
    pub appears: Vec<(String, Option<Offset>, Option<Duration>)>,
    pub ocr_calls: Vec<String>,
    pub clicks: Vec<String>,
    pub sleeps: Vec<(f32, f32)>,
}

impl ScriptedScreen {
    pub fn new() -> Self {
        Self {
            visible: HashSet::new(),
            script: VecDeque::new(),
            color_pixels: HashMap::new(),
            readings: HashMap::new(),
            frame: ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 255])),
            screenshots: 0,
            appears: Vec::new(),
            ocr_calls: Vec::new(),
            clicks: Vec::new(),
            sleeps: Vec::new(),
        }
    }

    /// Buttons visible right now
    pub fn showing(mut self, names: &[&str]) -> Self {
        self.visible = names.iter().map(|name| name.to_string()).collect();
        self
    }

    /// Buttons visible after each following screenshot
    pub fn then(mut self, names: &[&str]) -> Self {
        self.script
            .push_back(names.iter().map(|name| name.to_string()).collect());
        self
    }

    /// Number of pixels of `color` in the area of button `name`
    pub fn with_color_pixels(mut self, name: &str, color: Color, pixels: usize) -> Self {
        self.color_pixels.insert((name.to_string(), color), pixels);
        self
    }

    /// Readings returned by successive OCR calls of counter `name`; the
    /// last one repeats
    pub fn with_readings(mut self, name: &str, readings: &[CounterReading]) -> Self {
        self.readings
            .insert(name.to_string(), readings.iter().copied().collect());
        self
    }

    pub fn clicked(&self, name: &str) -> bool {
        self.clicks.iter().any(|click| click == name)
    }

    /// Every `(offset, interval)` button `name` was checked with
    pub fn queries(&self, name: &str) -> Vec<(Option<Offset>, Option<Duration>)> {
        self.appears
            .iter()
            .filter(|(button, _, _)| button == name)
            .map(|(_, offset, interval)| (*offset, *interval))
            .collect()
    }

    pub fn queried(&self, name: &str) -> Option<(Option<Offset>, Option<Duration>)> {
        self.appears
            .iter()
            .find(|(button, _, _)| button == name)
            .map(|(_, offset, interval)| (*offset, *interval))
    }
}

impl Screen for ScriptedScreen {
    fn screenshot(&mut self) -> Result<(), VisionError> {
        self.screenshots += 1;
        if let Some(next) = self.script.pop_front() {
            self.visible = next;
        }
        Ok(())
    }

    fn image(&self) -> Option<&RgbaImage> {
        Some(&self.frame)
    }

    fn appear(
        &mut self,
        button: &Button,
        offset: Option<Offset>,
        interval: Option<Duration>,
    ) -> bool {
        self.appears.push((button.name.clone(), offset, interval));
        self.visible.contains(&button.name)
    }

    fn image_color_count(&self, button: &Button, color: Color, _threshold: u8, count: usize) -> bool {
        self.color_pixels
            .get(&(button.name.clone(), color))
            .is_some_and(|pixels| *pixels >= count)
    }

    fn ocr(&mut self, counter: &DigitCounter) -> CounterReading {
        self.ocr_calls.push(counter.name.clone());
        match self.readings.get_mut(&counter.name) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().copied().unwrap_or_default(),
            None => CounterReading::default(),
        }
    }

    fn click(&mut self, button: &Button) -> Result<(), VisionError> {
        self.clicks.push(button.name.clone());
        Ok(())
    }

    fn sleep(&mut self, range: (f32, f32)) {
        self.sleeps.push(range);
    }
}

/// A button whose name is all the scripted screen looks at
pub(crate) fn button(name: &str) -> Button {
    let area = Area::new(0, 0, 10, 10);
    Button::new(name, area, [0, 0, 0], area)
}
