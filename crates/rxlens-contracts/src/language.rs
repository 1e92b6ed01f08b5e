use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const HINDI_MARKER: &str = "hindi";
pub const ENGLISH_MARKER: &str = "english";

/// Output language for both the model instructions and the rendered labels.
///
/// Only two selectors are recognized. Anything that is not the Hindi marker
/// resolves to English, so parsing never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
}

impl Language {
    pub fn from_selector(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case(HINDI_MARKER) {
            Self::Hindi
        } else {
            Self::English
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => ENGLISH_MARKER,
            Self::Hindi => HINDI_MARKER,
        }
    }

    /// Name of the language as it appears inside model instructions.
    pub fn instruction_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::English => Self::Hindi,
            Self::Hindi => Self::English,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_selector(raw))
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_selector(&raw))
    }
}
