use crossterm::event::KeyCode;
use crossterm::style::Color;

/// Default palette for bolts (electric blue/white)
pub const DEFAULT_SCHEME: u8 = 0;

/// Shared color scheme state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorState {
    pub scheme: u8,
}

impl ColorState {
    pub fn new(default_scheme: u8) -> Self {
        Self { scheme: default_scheme.min(9) }
    }

    /// Handle color scheme key input. Returns true if key was handled.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(')') => self.scheme = 0,  // Shift+0: electric
            KeyCode::Char('!') => self.scheme = 1,  // Shift+1: plasma
            KeyCode::Char('@') => self.scheme = 2,  // Shift+2: fire
            KeyCode::Char('#') => self.scheme = 3,  // Shift+3: ice
            KeyCode::Char('$') => self.scheme = 4,  // Shift+4: gold
            KeyCode::Char('%') => self.scheme = 5,  // Shift+5: toxic
            KeyCode::Char('^') => self.scheme = 6,  // Shift+6: blood
            KeyCode::Char('&') => self.scheme = 7,  // Shift+7: mono
            KeyCode::Char('*') => self.scheme = 8,  // Shift+8: rainbow
            KeyCode::Char('(') => self.scheme = 9,  // Shift+9: neon
            _ => return false,
        }
        true
    }

    pub fn name(&self) -> &'static str {
        match self.scheme {
            1 => "plasma",
            2 => "fire",
            3 => "ice",
            4 => "gold",
            5 => "toxic",
            6 => "blood",
            7 => "mono",
            8 => "rainbow",
            9 => "neon",
            _ => "electric",
        }
    }
}

/// Quantize a 0..1 brightness into the four palette steps
pub fn intensity_level(brightness: f32) -> u8 {
    match brightness {
        b if b >= 0.75 => 3,
        b if b >= 0.45 => 2,
        b if b >= 0.2 => 1,
        _ => 0,
    }
}

/// Get color from scheme based on intensity (0-3)
pub fn scheme_color(scheme: u8, intensity: u8, bold: bool) -> (Color, bool) {
    match scheme {
        1 => match intensity {  // Violet/white (plasma)
            0 => (Color::DarkMagenta, false),
            1 => (Color::Magenta, false),
            2 => (Color::Rgb { r: 220, g: 170, b: 255 }, bold),
            _ => (Color::White, true),
        },
        2 => match intensity {  // Red/Yellow (fire)
            0 => (Color::DarkRed, false),
            1 => (Color::Red, false),
            2 => (Color::Yellow, bold),
            _ => (Color::White, true),
        },
        3 => match intensity {  // Blue/Cyan (ice)
            0 => (Color::DarkBlue, false),
            1 => (Color::Blue, false),
            2 => (Color::Cyan, bold),
            _ => (Color::White, true),
        },
        4 => match intensity {  // Yellow/White (gold)
            0 => (Color::DarkYellow, false),
            1 => (Color::Yellow, false),
            2 => (Color::Rgb { r: 255, g: 240, b: 180 }, bold),
            _ => (Color::White, true),
        },
        5 => match intensity {  // Green (toxic)
            0 => (Color::DarkGreen, false),
            1 => (Color::Green, false),
            2 => (Color::Rgb { r: 180, g: 255, b: 180 }, bold),
            _ => (Color::White, true),
        },
        6 => match intensity {  // Red (blood)
            0 => (Color::DarkRed, false),
            1 => (Color::Red, false),
            2 => (Color::Rgb { r: 255, g: 120, b: 120 }, bold),
            _ => (Color::White, true),
        },
        7 => match intensity {  // White/Grey (mono)
            0 => (Color::DarkGrey, false),
            1 => (Color::Grey, false),
            2 => (Color::White, bold),
            _ => (Color::White, true),
        },
        8 => match intensity {  // Rainbow
            0 => (Color::Red, false),
            1 => (Color::Yellow, false),
            2 => (Color::Green, bold),
            _ => (Color::Cyan, true),
        },
        9 => match intensity {  // Blue/Magenta (neon)
            0 => (Color::DarkBlue, false),
            1 => (Color::Blue, false),
            2 => (Color::Magenta, bold),
            _ => (Color::White, true),
        },
        _ => match intensity {  // Default: electric blue-white, close to the bloom look
            0 => (Color::DarkBlue, false),
            1 => (Color::Rgb { r: 90, g: 140, b: 255 }, false),
            2 => (Color::Rgb { r: 170, g: 221, b: 255 }, bold),
            _ => (Color::White, true),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_digits_pick_schemes() {
        let mut colors = ColorState::new(DEFAULT_SCHEME);
        assert!(colors.handle_key(KeyCode::Char('@')));
        assert_eq!(colors.scheme, 2);
        assert_eq!(colors.name(), "fire");
        assert!(!colors.handle_key(KeyCode::Char('x')));
        assert_eq!(colors.scheme, 2);
    }

    #[test]
    fn levels_cover_range() {
        assert_eq!(intensity_level(0.0), 0);
        assert_eq!(intensity_level(0.3), 1);
        assert_eq!(intensity_level(0.5), 2);
        assert_eq!(intensity_level(1.2), 3);
    }

    #[test]
    fn brightest_level_is_bold() {
        for scheme in 0..10 {
            assert!(scheme_color(scheme, 3, false).1);
        }
    }
}
