//! Image slots and data URIs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WojtekError;

/// A named storage location for exactly one persisted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSlot {
    /// Primary portrait: Wojtek with a skewer. Also used as the chat avatar.
    Szaszlyk,
    /// Secondary portrait: Wojtek laughing in the exam hall.
    Egzamin,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 2] = [ImageSlot::Szaszlyk, ImageSlot::Egzamin];

    pub fn name(self) -> &'static str {
        match self {
            Self::Szaszlyk => "szaszlyk",
            Self::Egzamin => "egzamin",
        }
    }

    /// Key under which the slot's data URI is persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Szaszlyk => "user_szaszlyk",
            Self::Egzamin => "user_egzamin",
        }
    }

    /// Bundled image shown when nothing was uploaded.
    pub fn default_image(self) -> &'static str {
        match self {
            Self::Szaszlyk => "./input_file_0.png",
            Self::Egzamin => "./input_file_1.png",
        }
    }

    /// Prompt used when the gallery has to paint the slot itself.
    pub fn generation_prompt(self) -> &'static str {
        match self {
            Self::Szaszlyk => {
                "a funny middle-aged man with glasses eating a huge meat skewer in a sunny park, laughing, cinematic lighting"
            }
            Self::Egzamin => {
                "a middle-aged man with glasses laughing loudly in a silent university exam hall, other students staring, funny scene"
            }
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Szaszlyk => "Szaszłyk-Power",
            Self::Egzamin => "Śmiech w Salonie Gier",
        }
    }

    /// Status line shown while an image is being generated for this slot.
    pub fn generating_label(self) -> &'static str {
        match self {
            Self::Szaszlyk => "Wojtek maluje szaszłyk...",
            Self::Egzamin => "Wojtek śmieje się na sali...",
        }
    }
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageSlot {
    type Err = WojtekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "szaszlyk" | "szaszłyk" | "primary" => Ok(Self::Szaszlyk),
            "egzamin" | "secondary" => Ok(Self::Egzamin),
            other => Err(WojtekError::config(format!(
                "Unknown image slot '{other}' (expected szaszlyk or egzamin)"
            ))),
        }
    }
}

/// A `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUri(String);

impl DataUri {
    /// Builds a data URI from a MIME type and an already base64-encoded payload.
    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        Self(format!("data:{mime_type};base64,{payload}"))
    }

    /// Wraps an existing string after checking its shape.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        Self::split(&value)?;
        Some(Self(value))
    }

    /// Returns true when `value` looks like an embedded image rather than a path.
    pub fn is_data_uri(value: &str) -> bool {
        value.starts_with("data:")
    }

    pub fn mime_type(&self) -> &str {
        Self::split(&self.0).map(|(mime, _)| mime).unwrap_or_default()
    }

    pub fn payload(&self) -> &str {
        Self::split(&self.0).map(|(_, data)| data).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn split(value: &str) -> Option<(&str, &str)> {
        let rest = value.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        Some((mime, payload))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
