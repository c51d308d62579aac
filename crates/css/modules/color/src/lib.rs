//! Color literal conversion for stylesheet values.
//!
//! Accepts named colors, hex forms (`#rgb`/`#rgba`/`#rrggbb`/`#rrggbbaa`)
//! and functional notations like `rgb()`, `rgba()`, `hsl()` and `hsla()`.
use core::fmt;
use csscolorparser::Color;

/// An 8-bit-per-channel RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[inline]
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, u8::MAX)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha == u8::MAX {
            write!(
                formatter,
                "#{:02x}{:02x}{:02x}",
                self.red, self.green, self.blue
            )
        } else {
            write!(
                formatter,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.red, self.green, self.blue, self.alpha
            )
        }
    }
}

/// Parse a color literal into 8-bit RGBA channels.
///
/// Returns `None` if the text is not a color csscolorparser understands.
#[inline]
pub fn parse_color(input: &str) -> Option<Rgba> {
    let parsed: Color = input.trim().parse().ok()?;
    let [red, green, blue, alpha] = parsed.to_rgba8();
    Some(Rgba::new(red, green, blue, alpha))
}

/// True if the function name introduces a color literal (`rgb(...)` and friends).
#[inline]
pub fn is_color_function(name: &str) -> bool {
    ["rgb", "rgba", "hsl", "hsla", "hwb"]
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}
