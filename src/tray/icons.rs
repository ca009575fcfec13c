//! Icon generation for system tray
//!
//! Draws a small speaker glyph; the color tells which popup a click opens.

use image::{ImageBuffer, Rgba};

pub const ICON_SIZE: u32 = 16;

/// Icon variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconColor {
    /// Favorites popup
    Compact,
    /// Full menu
    Full,
}

impl IconColor {
    pub fn for_mode(full: bool) -> Self {
        if full {
            IconColor::Full
        } else {
            IconColor::Compact
        }
    }

    fn rgb(self) -> (u8, u8, u8) {
        match self {
            IconColor::Compact => (40, 120, 220),
            IconColor::Full => (240, 140, 20),
        }
    }
}

fn is_speaker(x: u32, y: u32) -> bool {
    let (x, y) = (x as i32, y as i32);
    // Body
    if (2..=5).contains(&x) && (6..=9).contains(&y) {
        return true;
    }
    // Cone widens by one pixel per column
    if (6..=9).contains(&x) {
        let spread = x - 4;
        return (6 - spread..=9 + spread).contains(&y);
    }
    // Sound wave
    (x == 12 && (5..=10).contains(&y)) || (x == 11 && (y == 4 || y == 11))
}

/// Generate a 16x16 speaker icon
pub fn generate_icon(color: IconColor) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let (r, g, b) = color.rgb();
    ImageBuffer::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        if is_speaker(x, y) {
            Rgba([r, g, b, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Generate icon and return as RGBA bytes for tray-icon
pub fn generate_icon_bytes(color: IconColor) -> Vec<u8> {
    generate_icon(color).into_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_icon() {
        let img = generate_icon(IconColor::Compact);
        assert_eq!(img.width(), ICON_SIZE);
        assert_eq!(img.height(), ICON_SIZE);
        assert_eq!(img.get_pixel(0, 0)[3], 0, "corner is transparent");
        assert_eq!(img.get_pixel(3, 7)[3], 255, "speaker body is opaque");
    }

    #[test]
    fn test_mode_colors_differ() {
        let compact = generate_icon(IconColor::for_mode(false));
        let full = generate_icon(IconColor::for_mode(true));
        assert_eq!(compact.get_pixel(3, 7)[2], 220);
        assert_eq!(full.get_pixel(3, 7)[0], 240);
    }

    #[test]
    fn test_icon_bytes() {
        assert_eq!(
            generate_icon_bytes(IconColor::Full).len(),
            (ICON_SIZE * ICON_SIZE * 4) as usize
        );
    }
}
