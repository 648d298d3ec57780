//! Ash beacon collection progress
//!
//! The map page shows how much of the next beacon has been collected and how
//! much ash was gathered today. The indicator comes in a light and a gray
//! theme and can be hidden behind daily mission popups.

use std::fmt;

use crate::vision::assets::{names, AssetError};
use crate::vision::{AssetTable, Button, Color, DigitCounter, Screen, Server};

const LIGHT: Color = [235, 235, 235];
const GRAY: Color = [140, 142, 140];

/// Pixel similarity and count that identify a theme
const THEME_THRESHOLD: u8 = 221;
const THEME_COUNT: usize = 20;

const OCR_THRESHOLD: u8 = 160;

/// The daily counter has an icon on its left
const DAILY_STRIP_THRESHOLD: u8 = 120;
const DAILY_STRIP_LENGTH: u32 = 35;

/// Ash that can be collected per day
pub const DAILY_CAP: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Gray,
}

impl Theme {
    /// Text colour of the counters
    pub fn letter(self) -> Color {
        match self {
            Theme::Light => LIGHT,
            Theme::Gray => GRAY,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Gray => write!(f, "gray"),
        }
    }
}

/// Estimates beacon completion from the map page.
///
/// Once today's cap is reached every later estimate is 0 until [`reset`]
/// is called.
///
/// [`reset`]: AshCollectStatus::reset
#[derive(Debug, Clone)]
pub struct AshCollectStatus {
    collect: Button,
    daily: Button,
    fully_collected: bool,
}

impl AshCollectStatus {
    pub fn new(collect: Button, daily: Button) -> Self {
        Self {
            collect,
            daily,
            fully_collected: false,
        }
    }

    pub fn from_table(table: &AssetTable, server: Server) -> Result<Self, AssetError> {
        Ok(Self::new(
            table.button(names::ASH_COLLECT_STATUS, server)?,
            table.button(names::ASH_DAILY_STATUS, server)?,
        ))
    }

    pub fn is_fully_collected(&self) -> bool {
        self.fully_collected
    }

    /// Start a new day
    pub fn reset(&mut self) {
        self.fully_collected = false;
    }

    /// Theme of the indicator, `None` when it is covered
    pub fn theme(&self, screen: &dyn Screen) -> Option<Theme> {
        [Theme::Light, Theme::Gray].into_iter().find(|theme| {
            screen.image_color_count(&self.collect, theme.letter(), THEME_THRESHOLD, THEME_COUNT)
        })
    }

    fn counters(&self, theme: Theme) -> (DigitCounter, DigitCounter) {
        let collect = DigitCounter::new(
            self.collect.clone(),
            theme.letter(),
            OCR_THRESHOLD,
            "OCR_ASH_COLLECT_STATUS",
        );
        let daily = DigitCounter::new(
            self.daily.clone(),
            theme.letter(),
            OCR_THRESHOLD,
            "OCR_ASH_DAILY_STATUS",
        )
        .with_left_strip(DAILY_STRIP_THRESHOLD, DAILY_STRIP_LENGTH);
        (collect, daily)
    }

    /// Beacon completion in percent, 0 when unknown or done for today
    pub fn estimate(&mut self, screen: &mut dyn Screen) -> u32 {
        if self.fully_collected {
            return 0;
        }
        let Some(theme) = self.theme(screen) else {
            log::info!("Ash beacon status is covered, will check next time");
            return 0;
        };
        log::info!("Ash beacon status: {}", theme);

        let (collect, daily) = self.counters(theme);
        let status = screen.ocr(&collect).current;
        let daily = screen.ocr(&daily).current;

        if daily >= DAILY_CAP {
            log::info!("Ash beacon fully collected today");
            self.fully_collected = true;
        }

        status.clamp(0, 100) as u32
    }
}
