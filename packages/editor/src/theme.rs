use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Light => f.write_str("light"),
            ThemeMode::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for ThemeMode {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(EditorError::UnknownThemeMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: "#22c55e".to_string(),
            secondary: "#1f2937".to_string(),
            background: "#ffffff".to_string(),
            text: "#111827".to_string(),
        }
    }
}

/// Document-wide visual theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub mode: ThemeMode,
    #[serde(default)]
    pub colors: ThemeColors,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_font_family() -> String {
    "Inter, sans-serif".to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            mode: ThemeMode::Light,
            colors: ThemeColors::default(),
            font_family: default_font_family(),
        }
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            mode: ThemeMode::Dark,
            colors: ThemeColors {
                primary: "#4ade80".to_string(),
                secondary: "#e5e7eb".to_string(),
                background: "#111827".to_string(),
                text: "#f9fafb".to_string(),
            },
            font_family: default_font_family(),
        }
    }
}
