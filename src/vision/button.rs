//! Buttons: named screen regions with a reference colour and template

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An RGB colour
pub type Color = [u8; 3];

/// Search margin around a button's area, `(dx, dy)` in pixels
pub type Offset = (i32, i32);

/// Rectangle in screen pixels, `x2`/`y2` exclusive.
///
/// Serialized as `[x1, y1, x2, y2]`, the layout used by the asset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Area {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Area {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Grow the area by `offset` on every side
    pub fn expand(&self, offset: Offset) -> Self {
        Self::new(
            self.x1 - offset.0,
            self.y1 - offset.1,
            self.x2 + offset.0,
            self.y2 + offset.1,
        )
    }

    /// Move the area by `(dx, dy)`
    pub fn shift(&self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Clip to a `width` x `height` frame.
    ///
    /// Returns `(x, y, w, h)` ready for `crop_imm`, or `None` if nothing of
    /// the area is on screen.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = self.x1.clamp(0, width as i32);
        let y1 = self.y1.clamp(0, height as i32);
        let x2 = self.x2.clamp(0, width as i32);
        let y2 = self.y2.clamp(0, height as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}

impl From<[i32; 4]> for Area {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<Area> for [i32; 4] {
    fn from(area: Area) -> Self {
        [area.x1, area.y1, area.x2, area.y2]
    }
}

/// A UI element resolved for one server locale.
///
/// `area` is where the element is detected, `button` is where it is clicked.
/// They are often the same rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub name: String,
    pub area: Area,
    pub color: Color,
    pub button: Area,
    pub file: Option<PathBuf>,
}

impl Button {
    pub fn new(name: impl Into<String>, area: Area, color: Color, button: Area) -> Self {
        Self {
            name: name.into(),
            area,
            color,
            button,
            file: None,
        }
    }

    /// Attach the reference image used for offset matching
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
