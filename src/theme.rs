use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Accent colors offered by the header picker
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AccentColor {
    #[default]
    Indigo,
    Purple,
    Blue,
    Emerald,
    Rose,
}

impl AccentColor {
    /// The 500 shade of the palette entry
    pub fn color(self) -> Color {
        match self {
            AccentColor::Indigo => Color::Rgb(0x63, 0x66, 0xf1),
            AccentColor::Purple => Color::Rgb(0xa8, 0x55, 0xf7),
            AccentColor::Blue => Color::Rgb(0x3b, 0x82, 0xf6),
            AccentColor::Emerald => Color::Rgb(0x10, 0xb9, 0x81),
            AccentColor::Rose => Color::Rgb(0xf4, 0x3f, 0x5e),
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Next color in picker order, wrapping around
    pub fn next(self) -> AccentColor {
        let all = Self::all();
        let index = all.iter().position(|c| *c == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }

    pub fn all() -> Vec<AccentColor> {
        AccentColor::iter().collect()
    }
}

impl std::fmt::Display for AccentColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
