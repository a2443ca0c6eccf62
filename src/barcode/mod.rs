//! Code format identifiers and the platform-aware scan pipeline.
//!
//! A detection goes through [`Normalizer::normalize`] and then
//! [`validate`] before it is shown or written to history.

pub mod content;
pub mod normalize;
pub mod validate;

pub use content::{is_url, open_url};
pub use normalize::Normalizer;
pub use validate::{validate, Validation};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A barcode symbology as reported by the code detector.
///
/// Identifiers outside the known set are kept verbatim in [`CodeType::Other`]
/// so that persisted settings and history survive round trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeType {
    Aztec,
    Codabar,
    Code128,
    Code39,
    Code93,
    DataMatrix,
    Ean13,
    Ean8,
    Gs1DataBarExpanded,
    Gs1DataBarLimited,
    Itf,
    Itf14,
    Pdf417,
    Qr,
    UpcA,
    UpcE,
    Unknown,
    Other(String),
}

impl CodeType {
    pub fn id(&self) -> &str {
        match self {
            CodeType::Aztec => "aztec",
            CodeType::Codabar => "codabar",
            CodeType::Code128 => "code-128",
            CodeType::Code39 => "code-39",
            CodeType::Code93 => "code-93",
            CodeType::DataMatrix => "data-matrix",
            CodeType::Ean13 => "ean-13",
            CodeType::Ean8 => "ean-8",
            CodeType::Gs1DataBarExpanded => "gs1-data-bar-expanded",
            CodeType::Gs1DataBarLimited => "gs1-data-bar-limited",
            CodeType::Itf => "itf",
            CodeType::Itf14 => "itf-14",
            CodeType::Pdf417 => "pdf-417",
            CodeType::Qr => "qr",
            CodeType::UpcA => "upc-a",
            CodeType::UpcE => "upc-e",
            CodeType::Unknown => "unknown",
            CodeType::Other(id) => id,
        }
    }

    /// Upper-case label used in result headers and history badges.
    pub fn label(&self) -> String {
        self.id().to_uppercase()
    }

    /// True for identifiers this crate knows about (including `unknown`).
    pub fn is_recognized(&self) -> bool {
        !matches!(self, CodeType::Other(_))
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for CodeType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code_type = match s {
            "aztec" => CodeType::Aztec,
            "codabar" => CodeType::Codabar,
            "code-128" => CodeType::Code128,
            "code-39" => CodeType::Code39,
            "code-93" => CodeType::Code93,
            "data-matrix" => CodeType::DataMatrix,
            "ean-13" => CodeType::Ean13,
            "ean-8" => CodeType::Ean8,
            "gs1-data-bar-expanded" => CodeType::Gs1DataBarExpanded,
            "gs1-data-bar-limited" => CodeType::Gs1DataBarLimited,
            "itf" => CodeType::Itf,
            "itf-14" => CodeType::Itf14,
            "pdf-417" => CodeType::Pdf417,
            "qr" => CodeType::Qr,
            "upc-a" => CodeType::UpcA,
            "upc-e" => CodeType::UpcE,
            "unknown" => CodeType::Unknown,
            other => CodeType::Other(other.to_string()),
        };
        Ok(code_type)
    }
}

impl From<&str> for CodeType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(code_type) => code_type,
            Err(never) => match never {},
        }
    }
}

impl Serialize for CodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for CodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(CodeType::from(id.as_str()))
    }
}

/// Host platform family. Selects normalization rules and the default
/// supported type set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Platform of the build target; everything that is not an Apple target
    /// is treated as the android family.
    pub fn current() -> Self {
        if cfg!(any(target_os = "ios", target_os = "macos")) {
            Platform::Ios
        } else {
            Platform::Android
        }
    }

    pub fn supported_types(self) -> Vec<CodeType> {
        match self {
            Platform::Ios => vec![
                CodeType::Aztec,
                CodeType::Codabar,
                CodeType::Code128,
                CodeType::Code39,
                CodeType::Code93,
                CodeType::DataMatrix,
                CodeType::Ean13,
                CodeType::Ean8,
                CodeType::Gs1DataBarExpanded,
                CodeType::Gs1DataBarLimited,
                CodeType::Itf,
                CodeType::Itf14,
                CodeType::Pdf417,
                CodeType::Qr,
                CodeType::UpcA,
                CodeType::UpcE,
            ],
            Platform::Android => vec![
                CodeType::Aztec,
                CodeType::Codabar,
                CodeType::Code128,
                CodeType::Code39,
                CodeType::Code93,
                CodeType::DataMatrix,
                CodeType::Ean13,
                CodeType::Ean8,
                CodeType::Itf,
                CodeType::Pdf417,
                CodeType::Qr,
                CodeType::UpcA,
                CodeType::UpcE,
            ],
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// One decoded code reported by the detector for a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "type")]
    pub code_type: CodeType,
    #[serde(default)]
    pub value: Option<String>,
}

impl Detection {
    pub fn new(code_type: CodeType, value: impl Into<String>) -> Self {
        Self {
            code_type,
            value: Some(value.into()),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}
