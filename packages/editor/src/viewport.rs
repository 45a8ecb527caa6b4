//! Fixed viewport profiles.

use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three device profiles a design is laid out for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    Desktop,
    Tablet,
    Mobile,
}

impl Viewport {
    pub const ALL: [Viewport; 3] = [Viewport::Desktop, Viewport::Tablet, Viewport::Mobile];

    /// Nominal logical width
    pub fn width(self) -> f64 {
        match self {
            Viewport::Desktop => 1920.0,
            Viewport::Tablet => 768.0,
            Viewport::Mobile => 375.0,
        }
    }

    /// Nominal logical height (the canvas may grow past it)
    pub fn height(self) -> f64 {
        match self {
            Viewport::Desktop => 1080.0,
            Viewport::Tablet => 1024.0,
            Viewport::Mobile => 667.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Viewport::Desktop => "desktop",
            Viewport::Tablet => "tablet",
            Viewport::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viewport {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Viewport::Desktop),
            "tablet" => Ok(Viewport::Tablet),
            "mobile" => Ok(Viewport::Mobile),
            other => Err(EditorError::UnknownViewport(other.to_string())),
        }
    }
}
