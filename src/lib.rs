// SPDX: CC0-1.0

pub mod error;
pub mod eval;
pub mod grid;
pub mod lex;
pub mod parse;
pub mod render;
pub mod sample;
pub mod session;
pub mod shell;
pub mod stdlib;
pub mod view;

pub use error::{PlotError, Result};

use core::{fmt, num::NonZeroU32};

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

/// Visible world-coordinate bounds.
///
/// Only constructed through [`ViewRect::new`], so `x_min < x_max` and
/// `y_min < y_max` always hold and all bounds are finite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRect {
    x_min: Number,
    x_max: Number,
    y_min: Number,
    y_max: Number,
}

impl ViewRect {
    pub const DEFAULT: Self = Self {
        x_min: -10.0,
        x_max: 10.0,
        y_min: -10.0,
        y_max: 10.0,
    };

    pub fn new(x_min: Number, x_max: Number, y_min: Number, y_max: Number) -> Option<Self> {
        let ordered = |lo: Number, hi: Number| lo.is_finite() && hi.is_finite() && lo < hi;
        // the span itself must also be representable
        if ordered(x_min, x_max)
            && ordered(y_min, y_max)
            && (x_max - x_min).is_finite()
            && (y_max - y_min).is_finite()
        {
            Some(Self {
                x_min,
                x_max,
                y_min,
                y_max,
            })
        } else {
            None
        }
    }

    pub const fn x_min(&self) -> Number {
        self.x_min
    }

    pub const fn x_max(&self) -> Number {
        self.x_max
    }

    pub const fn y_min(&self) -> Number {
        self.y_min
    }

    pub const fn y_max(&self) -> Number {
        self.y_max
    }

    pub fn x_range(&self) -> Number {
        self.x_max - self.x_min
    }

    pub fn y_range(&self) -> Number {
        self.y_max - self.y_min
    }
}

impl Default for ViewRect {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ViewRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("x range", &(self.x_min..self.x_max))
            .field("y range", &(self.y_min..self.y_max))
            .finish()
    }
}

/// Pixel size of the drawable plot area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }

    #[inline]
    pub fn width(&self) -> Number {
        Number::from(self.width.get())
    }

    #[inline]
    pub fn height(&self) -> Number {
        Number::from(self.height.get())
    }

    /// Whether a screen point lies inside the viewport, edges included.
    pub fn contains(&self, p: Point<Number>) -> bool {
        (0.0..=self.width()).contains(&p.x) && (0.0..=self.height()).contains(&p.y)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
