//! Run presentation attributes
//!
//! `Style` is the value type shared by the import and export paths: font name,
//! point size, color, bold and italic. Absent values mean "inherit the
//! default". `StyleSheet` maps a role ("response", "prompt") to a base style
//! used by the Markdown renderer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB`, `RRGGBB` or `RRGGBBAA` (alpha ignored).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');

        match hex.len() {
            6 | 8 => {
                let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
                let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
                let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
                Some(Rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// Upper-case `RRGGBB`, the form WordprocessingML stores.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    fn from_components(components: &[i64]) -> Option<Self> {
        match components {
            [r, g, b] => Some(Rgb(
                u8::try_from(*r).ok()?,
                u8::try_from(*g).ok()?,
                u8::try_from(*b).ok()?,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepted spellings of a color in JSON. Anything else is ignored.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Components(Vec<i64>),
    Other(serde::de::IgnoredAny),
}

fn lenient_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Rgb>, D::Error> {
    let repr = Option::<ColorRepr>::deserialize(deserializer)?;
    let color = match repr {
        Some(ColorRepr::Hex(hex)) => Rgb::from_hex(&hex),
        Some(ColorRepr::Components(components)) => Rgb::from_components(&components),
        Some(ColorRepr::Other(_)) | None => None,
    };
    Ok(color)
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Presentation of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub font_name: Option<String>,
    /// Size in points.
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(rename = "font_color_rgb", default, deserialize_with = "lenient_color")]
    pub color: Option<Rgb>,
    #[serde(rename = "is_bold", default, deserialize_with = "lenient_flag")]
    pub bold: bool,
    #[serde(rename = "is_italic", default, deserialize_with = "lenient_flag")]
    pub italic: bool,
}

impl Style {
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = Some(font_name.into());
        self
    }

    pub fn with_size(mut self, points: f32) -> Self {
        self.font_size = Some(points);
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Keep only bold/italic. Headings leave font, size and color to the
    /// native heading style.
    pub fn emphasis_only(&self) -> Self {
        Style {
            bold: self.bold,
            italic: self.italic,
            ..Style::default()
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }
}

/// Role name to base style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    roles: HashMap<String, Style>,
}

impl StyleSheet {
    pub const RESPONSE: &'static str = "response";
    pub const PROMPT: &'static str = "prompt";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: impl Into<String>, style: Style) -> Self {
        self.roles.insert(role.into(), style);
        self
    }

    pub fn insert(&mut self, role: impl Into<String>, style: Style) {
        self.roles.insert(role.into(), style);
    }

    /// Style for `role`, or the default style when the role is not defined.
    pub fn role(&self, role: &str) -> Style {
        self.roles.get(role).cloned().unwrap_or_default()
    }

    pub fn response(&self) -> Style {
        self.role(Self::RESPONSE)
    }
}
