use crate::error::BrandError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Smallest width that gets rounded corners and a text shadow.
pub const ROUNDED_MIN_SIZE: u32 = 48;
/// Smallest width that gets a drop shadow behind the whole icon.
pub const DROP_SHADOW_MIN_SIZE: u32 = 180;

/// An opaque sRGB color, written as `#rrggbb` in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn from_hex(hex: &str) -> Result<Self, BrandError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(BrandError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| BrandError::InvalidColor(hex.to_string()))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn channels(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = BrandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Where the label's glyphs come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    /// Ordered family names looked up in the system font database; the first one installed wins.
    System { families: Vec<String> },
    /// A specific TrueType/OpenType file.
    File { path: PathBuf },
    /// The built-in bitmap font. Always available.
    Builtin,
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::System {
            families: vec!["Arial".to_string(), "Segoe UI".to_string()],
        }
    }
}

/// One PNG written by the batch driver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconTarget {
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

impl IconTarget {
    pub fn new(width: u32, height: u32, file_name: &str) -> Self {
        Self {
            width,
            height,
            file_name: file_name.to_string(),
        }
    }
}

/// Everything that defines the brand mark. `Default` is the shipped asset set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub primary_color: Rgb,
    pub secondary_color: Rgb,
    pub accent_color: Rgb,
    pub text_color: Rgb,
    pub label: String,
    pub output_dir: PathBuf,
    pub targets: Vec<IconTarget>,
    pub ico_file_name: String,
    pub ico_sizes: Vec<u32>,
    pub font: FontSource,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            primary_color: Rgb(0x25, 0x63, 0xeb),
            secondary_color: Rgb(0x1e, 0x40, 0xaf),
            accent_color: Rgb(0x60, 0xa5, 0xfa),
            text_color: Rgb(0xff, 0xff, 0xff),
            label: "FT".to_string(),
            output_dir: PathBuf::from("public"),
            targets: vec![
                IconTarget::new(16, 16, "favicon-16x16.png"),
                IconTarget::new(32, 32, "favicon-32x32.png"),
                IconTarget::new(48, 48, "favicon-48x48.png"),
                IconTarget::new(180, 180, "apple-touch-icon.png"),
                IconTarget::new(192, 192, "android-chrome-192x192.png"),
                IconTarget::new(512, 512, "android-chrome-512x512.png"),
            ],
            ico_file_name: "favicon.ico".to_string(),
            ico_sizes: vec![16, 32, 48],
            font: FontSource::default(),
        }
    }
}

/// The finishing passes applied to one rendered size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Effects {
    pub rounded_corners: bool,
    pub drop_shadow: bool,
    pub text_shadow: bool,
}

impl Effects {
    /// Selects effects from the icon width. Small icons stay square and flat.
    pub fn for_width(width: u32) -> Self {
        Self {
            rounded_corners: width >= ROUNDED_MIN_SIZE,
            drop_shadow: width >= DROP_SHADOW_MIN_SIZE,
            text_shadow: width >= ROUNDED_MIN_SIZE,
        }
    }

    /// ICO frames are plain gradient plus label.
    pub fn none() -> Self {
        Self::default()
    }
}
