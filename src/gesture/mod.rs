pub mod source;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed vocabulary of gestures the session can report.
///
/// Serialized with the display name the UI shows (and feeds back into
/// [`translate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureLabel {
    #[serde(rename = "Wave")]
    Wave,
    #[serde(rename = "Thumbs Up")]
    ThumbsUp,
    #[serde(rename = "Peace Sign")]
    PeaceSign,
    #[serde(rename = "Pointing")]
    Pointing,
    #[serde(rename = "Open Palm")]
    OpenPalm,
    #[serde(rename = "No gesture detected")]
    NoGesture,
}

impl GestureLabel {
    /// All labels, in table order. The simulator draws uniformly from this.
    pub const ALL: [GestureLabel; 6] = [
        GestureLabel::Wave,
        GestureLabel::ThumbsUp,
        GestureLabel::PeaceSign,
        GestureLabel::Pointing,
        GestureLabel::OpenPalm,
        GestureLabel::NoGesture,
    ];

    /// Display name shown in the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wave => "Wave",
            Self::ThumbsUp => "Thumbs Up",
            Self::PeaceSign => "Peace Sign",
            Self::Pointing => "Pointing",
            Self::OpenPalm => "Open Palm",
            Self::NoGesture => "No gesture detected",
        }
    }

    /// Identifier form, e.g. `ThumbsUp`.
    pub fn ident(&self) -> &'static str {
        match self {
            Self::Wave => "Wave",
            Self::ThumbsUp => "ThumbsUp",
            Self::PeaceSign => "PeaceSign",
            Self::Pointing => "Pointing",
            Self::OpenPalm => "OpenPalm",
            Self::NoGesture => "NoGesture",
        }
    }

    /// Exact match against either the display name or the identifier.
    pub fn lookup(label: &str) -> Option<GestureLabel> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == label || g.ident() == label)
    }

    pub fn translation(&self) -> GestureTranslation {
        let (meaning, description) = match self {
            Self::Wave => ("Hello / Goodbye", "A greeting or farewell gesture"),
            Self::ThumbsUp => ("Yes / Approve", "Indicates agreement or approval"),
            Self::PeaceSign => (
                "Peace / Victory",
                "Represents peace, victory, or the number 2",
            ),
            Self::Pointing => (
                "Attention / Direction",
                "Directs attention to something specific",
            ),
            Self::OpenPalm => ("Stop / Wait", "Indicates a request to pause or wait"),
            Self::NoGesture => ("N/A", "No specific gesture is currently being detected"),
        };
        GestureTranslation { meaning, description }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gesture label: {0:?}")]
pub struct UnknownGesture(pub String);

impl FromStr for GestureLabel {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| UnknownGesture(s.to_string()))
    }
}

/// Human-readable meaning of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GestureTranslation {
    pub meaning: &'static str,
    pub description: &'static str,
}

/// Returned for any label outside the vocabulary.
pub const UNKNOWN_TRANSLATION: GestureTranslation = GestureTranslation {
    meaning: "Unknown",
    description: "This gesture is not in our database",
};

/// Look up the translation for a label. Total: unknown labels resolve to
/// [`UNKNOWN_TRANSLATION`].
pub fn translate(label: &str) -> GestureTranslation {
    GestureLabel::lookup(label)
        .map(|g| g.translation())
        .unwrap_or(UNKNOWN_TRANSLATION)
}

/// One row of the translation table as exposed to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationEntry {
    pub label: GestureLabel,
    #[serde(flatten)]
    pub translation: GestureTranslation,
}

pub fn translation_table() -> Vec<TranslationEntry> {
    GestureLabel::ALL
        .into_iter()
        .map(|label| TranslationEntry {
            label,
            translation: label.translation(),
        })
        .collect()
}
