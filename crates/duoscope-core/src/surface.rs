// crates/duoscope-core/src/surface.rs
//
// Drawing capabilities the core renders through. The host implements these
// over whatever it paints with (an egui Painter in duoscope-ui, a recording
// fake in tests). Nothing in the core owns pixels.
//
// Draw order on the main display is fixed by ReviewSession::frame:
//   video frames → ruler overlays
// The scrubber surface is owned by the event overlay alone.

use serde::{Deserialize, Serialize};

use crate::helpers::geometry::{Point, Rect};

/// 8-bit RGBA colour. Serialized as `#RRGGBB` (alpha is always opaque on the
/// wire, matching the colour strings the overlay tools exchange).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self { Self { r, g, b, a: 255 } }

    /// Parse `#RRGGBB` or `RRGGBB`, case-insensitive.
    ///
    /// ```
    /// use duoscope_core::surface::Rgba;
    /// assert_eq!(Rgba::from_hex("#40e0d0"), Some(Rgba::rgb(0x40, 0xE0, 0xD0)));
    /// assert_eq!(Rgba::from_hex("#12345"), None);
    /// ```
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgba::from_hex(&s).ok_or_else(|| format!("not a #RRGGBB colour: {s:?}"))
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> String { c.to_hex() }
}

/// A 2-D target the overlays can paint on. Coordinates are surface-local pixels.
pub trait Surface {
    /// `(width, height)` in pixels.
    fn size(&self) -> (f32, f32);
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, colour: Rgba);
    fn line(&mut self, from: Point, to: Point, width: f32, colour: Rgba);
    fn fill_circle(&mut self, centre: Point, radius: f32, colour: Rgba);
}

/// A surface that can also show decoded video frames of type `F`.
pub trait FrameSurface<F: ?Sized>: Surface {
    /// Scale `frame` into `dest`.
    fn blit(&mut self, frame: &F, dest: Rect);
}

/// Anything that knows how to paint itself. Construction never draws;
/// rendering is always this explicit call.
pub trait Drawable {
    fn render(&self, surface: &mut dyn Surface);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_is_uppercase() {
        let c = Rgba::from_hex("#ff4546").unwrap();
        assert_eq!(c.to_hex(), "#FF4546");
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgba::rgb(255, 17, 68)).unwrap();
        assert_eq!(json, "\"#FF1144\"");
        let back: Rgba = serde_json::from_str("\"#40E0D0\"").unwrap();
        assert_eq!(back, Rgba::rgb(0x40, 0xE0, 0xD0));
        assert!(serde_json::from_str::<Rgba>("\"teal\"").is_err());
    }
}
