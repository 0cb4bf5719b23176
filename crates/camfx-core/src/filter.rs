//! Filter vocabulary shared by the runtime and its hosts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies one filter variant. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCode {
    Passthrough,
    Grayscale,
    Negative,
    BlackAndWhite,
}

impl FilterCode {
    pub const ALL: [FilterCode; 4] = [
        FilterCode::Passthrough,
        FilterCode::Grayscale,
        FilterCode::Negative,
        FilterCode::BlackAndWhite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterCode::Passthrough => "passthrough",
            FilterCode::Grayscale => "grayscale",
            FilterCode::Negative => "negative",
            FilterCode::BlackAndWhite => "black_and_white",
        }
    }

    /// Settings value with no parameters set, tagged with this code.
    pub fn default_settings(self) -> FilterSettings {
        match self {
            FilterCode::Passthrough => FilterSettings::Passthrough,
            FilterCode::Grayscale => FilterSettings::Grayscale,
            FilterCode::Negative => FilterSettings::Negative,
            FilterCode::BlackAndWhite => FilterSettings::BlackAndWhite { inverted: false },
        }
    }
}

impl fmt::Display for FilterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter code `{0}`")]
pub struct UnknownFilterCode(pub String);

impl FromStr for FilterCode {
    type Err = UnknownFilterCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownFilterCode(s.to_string()))
    }
}

/// Per-filter parameters, tagged by the code of the filter they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FilterSettings {
    #[default]
    Passthrough,
    Grayscale,
    Negative,
    BlackAndWhite {
        #[serde(default)]
        inverted: bool,
    },
}

impl FilterSettings {
    pub fn code(&self) -> FilterCode {
        match self {
            FilterSettings::Passthrough => FilterCode::Passthrough,
            FilterSettings::Grayscale => FilterCode::Grayscale,
            FilterSettings::Negative => FilterCode::Negative,
            FilterSettings::BlackAndWhite { .. } => FilterCode::BlackAndWhite,
        }
    }
}

/// How the producer's image reaches the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureTarget {
    /// Platform external image (`samplerExternalOES`), written without a CPU copy.
    #[default]
    External,
    /// Plain 2D texture, filled by CPU uploads.
    #[serde(rename = "2d")]
    Texture2D,
}
