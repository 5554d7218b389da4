//! Icon categories and their canvas sizes

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Canvas size an icon category expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecommendedSize {
    pub width: u32,
    pub height: u32,
    /// When set, icons of this category must have exactly this size
    pub required: bool,
}

/// Semantic class of an icon; also the folder it is exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IconCategory {
    Passport,
    #[allow(clippy::upper_case_acronyms)]
    RFID,
    #[default]
    Animations,
    SubGhz,
    #[allow(non_camel_case_types)]
    iButton,
    Default,
}

impl IconCategory {
    pub const ALL: [IconCategory; 6] = [
        IconCategory::Passport,
        IconCategory::RFID,
        IconCategory::Animations,
        IconCategory::SubGhz,
        IconCategory::iButton,
        IconCategory::Default,
    ];

    pub fn recommended_size(self) -> RecommendedSize {
        let (width, height, required) = match self {
            IconCategory::Passport => (46, 49, true),
            IconCategory::RFID => (97, 61, true),
            IconCategory::Animations | IconCategory::SubGhz | IconCategory::iButton => {
                (128, 64, true)
            }
            IconCategory::Default => (128, 64, false),
        };
        RecommendedSize { width, height, required }
    }

    /// Whether an icon of this category may have the given size
    pub fn accepts_size(self, width: u32, height: u32) -> bool {
        let size = self.recommended_size();
        !size.required || (size.width == width && size.height == height)
    }

    /// Folder name used inside the pack archive
    pub fn folder_name(self) -> &'static str {
        match self {
            IconCategory::Passport => "Passport",
            IconCategory::RFID => "RFID",
            IconCategory::Animations => "Animations",
            IconCategory::SubGhz => "SubGhz",
            IconCategory::iButton => "iButton",
            IconCategory::Default => "Default",
        }
    }
}

impl fmt::Display for IconCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

impl FromStr for IconCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IconCategory::ALL
            .into_iter()
            .find(|c| c.folder_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedEncoding(format!("unknown icon category '{s}'")))
    }
}
