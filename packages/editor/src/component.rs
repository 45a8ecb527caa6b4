//! # Components
//!
//! A component is a common envelope (id, box, style) around a kind-specific
//! payload. The payload is an exhaustive enum, so consumers match on the
//! kind instead of probing for optional fields.
//!
//! On the wire a component is a flat JSON object:
//!
//! ```text
//! { "id": "generated-3", "box": [100, 100, 120, 40], "kind": "button", "label": "Submit" }
//! ```

use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Axis-aligned box in viewport logical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Position differs (ignoring size)
    pub fn moved_from(&self, other: &Rect) -> bool {
        self.x != other.x || self.y != other.y
    }

    /// Size differs (ignoring position)
    pub fn resized_from(&self, other: &Rect) -> bool {
        self.width != other.width || self.height != other.height
    }

    /// Finite coordinates and non-negative extent
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Scale every coordinate independently per axis
    pub fn scaled(&self, sx: f64, sy: f64) -> Rect {
        Rect::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }
}

impl From<[f64; 4]> for Rect {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Rect::new(x, y, width, height)
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x, r.y, r.width, r.height]
    }
}

/// Style fields (CSS-like property → value)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Style(BTreeMap<String, String>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.0.remove(property)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `patch` on top of this style; empty values delete a field
    pub fn merge(&mut self, patch: &Style) {
        for (property, value) in patch.iter() {
            if value.is_empty() {
                self.0.remove(property);
            } else {
                self.0.insert(property.to_string(), value.to_string());
            }
        }
    }
}

/// Discriminant of [`ComponentPayload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    Frame,
    Container,
    Input,
    Button,
    Heading,
    Text,
    Checkbox,
    Radio,
    Nav,
    Footer,
    Image,
    Icon,
    Divider,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Frame => "frame",
            ComponentKind::Container => "container",
            ComponentKind::Input => "input",
            ComponentKind::Button => "button",
            ComponentKind::Heading => "heading",
            ComponentKind::Text => "text",
            ComponentKind::Checkbox => "checkbox",
            ComponentKind::Radio => "radio",
            ComponentKind::Nav => "nav",
            ComponentKind::Footer => "footer",
            ComponentKind::Image => "image",
            ComponentKind::Icon => "icon",
            ComponentKind::Divider => "divider",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "frame" => ComponentKind::Frame,
            "container" => ComponentKind::Container,
            "input" => ComponentKind::Input,
            "button" => ComponentKind::Button,
            "heading" => ComponentKind::Heading,
            "text" => ComponentKind::Text,
            "checkbox" => ComponentKind::Checkbox,
            "radio" => ComponentKind::Radio,
            "nav" => ComponentKind::Nav,
            "footer" => ComponentKind::Footer,
            "image" => ComponentKind::Image,
            "icon" => ComponentKind::Icon,
            "divider" => ComponentKind::Divider,
            other => return Err(EditorError::UnknownKind(other.to_string())),
        };
        Ok(kind)
    }
}

/// Kind-specific component data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ComponentPayload {
    Frame {
        #[serde(default)]
        label: String,
    },
    Container {
        #[serde(default)]
        label: String,
    },
    Input {
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        value: String,
    },
    Button {
        #[serde(default)]
        label: String,
    },
    Heading {
        #[serde(default)]
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    Text {
        #[serde(default)]
        text: String,
    },
    Checkbox {
        #[serde(default)]
        label: String,
        #[serde(default)]
        checked: bool,
    },
    Radio {
        #[serde(default)]
        label: String,
        #[serde(default)]
        group: String,
        #[serde(default)]
        checked: bool,
    },
    Nav {
        #[serde(default)]
        items: Vec<String>,
    },
    Footer {
        #[serde(default)]
        text: String,
    },
    Image {
        #[serde(default)]
        src: String,
        #[serde(default)]
        alt: String,
    },
    Icon {
        #[serde(default)]
        name: String,
    },
    Divider {},
}

fn default_heading_level() -> u8 {
    2
}

impl ComponentPayload {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentPayload::Frame { .. } => ComponentKind::Frame,
            ComponentPayload::Container { .. } => ComponentKind::Container,
            ComponentPayload::Input { .. } => ComponentKind::Input,
            ComponentPayload::Button { .. } => ComponentKind::Button,
            ComponentPayload::Heading { .. } => ComponentKind::Heading,
            ComponentPayload::Text { .. } => ComponentKind::Text,
            ComponentPayload::Checkbox { .. } => ComponentKind::Checkbox,
            ComponentPayload::Radio { .. } => ComponentKind::Radio,
            ComponentPayload::Nav { .. } => ComponentKind::Nav,
            ComponentPayload::Footer { .. } => ComponentKind::Footer,
            ComponentPayload::Image { .. } => ComponentKind::Image,
            ComponentPayload::Icon { .. } => ComponentKind::Icon,
            ComponentPayload::Divider {} => ComponentKind::Divider,
        }
    }

    /// Palette defaults for a freshly dropped component
    pub fn default_for(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Frame => ComponentPayload::Frame {
                label: "Frame".to_string(),
            },
            ComponentKind::Container => ComponentPayload::Container {
                label: String::new(),
            },
            ComponentKind::Input => ComponentPayload::Input {
                placeholder: "Enter text...".to_string(),
                value: String::new(),
            },
            ComponentKind::Button => ComponentPayload::Button {
                label: "Submit".to_string(),
            },
            ComponentKind::Heading => ComponentPayload::Heading {
                text: "Heading Text".to_string(),
                level: default_heading_level(),
            },
            ComponentKind::Text => ComponentPayload::Text {
                text: "Sample text goes here.".to_string(),
            },
            ComponentKind::Checkbox => ComponentPayload::Checkbox {
                label: "Check me".to_string(),
                checked: false,
            },
            ComponentKind::Radio => ComponentPayload::Radio {
                label: "Option".to_string(),
                group: "default".to_string(),
                checked: false,
            },
            ComponentKind::Nav => ComponentPayload::Nav {
                items: vec!["Home".to_string(), "About".to_string(), "Contact".to_string()],
            },
            ComponentKind::Footer => ComponentPayload::Footer {
                text: "Footer Content".to_string(),
            },
            ComponentKind::Image => ComponentPayload::Image {
                src: String::new(),
                alt: String::new(),
            },
            ComponentKind::Icon => ComponentPayload::Icon {
                name: "star".to_string(),
            },
            ComponentKind::Divider => ComponentPayload::Divider {},
        }
    }

    /// Primary text content, for kinds that carry one
    pub fn text(&self) -> Option<&str> {
        match self {
            ComponentPayload::Frame { label }
            | ComponentPayload::Container { label }
            | ComponentPayload::Button { label }
            | ComponentPayload::Checkbox { label, .. }
            | ComponentPayload::Radio { label, .. } => Some(label),
            ComponentPayload::Heading { text, .. }
            | ComponentPayload::Text { text }
            | ComponentPayload::Footer { text } => Some(text),
            ComponentPayload::Input { value, .. } => Some(value),
            ComponentPayload::Image { alt, .. } => Some(alt),
            ComponentPayload::Icon { name } => Some(name),
            ComponentPayload::Nav { .. } | ComponentPayload::Divider {} => None,
        }
    }
}

/// One placed design element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,

    #[serde(rename = "box")]
    pub rect: Rect,

    #[serde(default, skip_serializing_if = "Style::is_empty")]
    pub style: Style,

    #[serde(flatten)]
    pub payload: ComponentPayload,
}

impl Component {
    pub fn new(id: impl Into<String>, rect: Rect, payload: ComponentPayload) -> Self {
        Self {
            id: id.into(),
            rect,
            style: Style::default(),
            payload,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn kind(&self) -> ComponentKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_from_cli_names() {
        assert_eq!("Button".parse::<ComponentKind>().unwrap(), ComponentKind::Button);
        assert_eq!(" divider ".parse::<ComponentKind>().unwrap(), ComponentKind::Divider);
        assert!(matches!(
            "carousel".parse::<ComponentKind>(),
            Err(EditorError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_component_wire_format() {
        let component = Component::new(
            "generated-3",
            Rect::new(100.0, 100.0, 120.0, 40.0),
            ComponentPayload::Button {
                label: "Go".to_string(),
            },
        );

        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["kind"], "button");
        assert_eq!(json["box"], serde_json::json!([100.0, 100.0, 120.0, 40.0]));
        assert_eq!(json["label"], "Go");
        assert!(json.get("style").is_none());
    }

    #[test]
    fn test_parse_with_missing_optional_fields() {
        let json = r#"{ "id": "generated-1", "box": [0, 0, 10, 10], "kind": "heading" }"#;
        let component: Component = serde_json::from_str(json).unwrap();

        assert_eq!(component.kind(), ComponentKind::Heading);
        match component.payload {
            ComponentPayload::Heading { level, .. } => assert_eq!(level, 2),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{ "id": "x", "box": [0, 0, 1, 1], "kind": "carousel" }"#;
        assert!(serde_json::from_str::<Component>(json).is_err());
    }

    #[test]
    fn test_rect_validity() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, -1.0, 5.0).is_valid());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 5.0).is_valid());
    }

    #[test]
    fn test_style_merge_removes_empty_values() {
        let mut style = Style::new().with("color", "red").with("padding", "4px");
        style.merge(&Style::new().with("color", "").with("margin", "2px"));

        assert_eq!(style.get("color"), None);
        assert_eq!(style.get("padding"), Some("4px"));
        assert_eq!(style.get("margin"), Some("2px"));
    }

    #[test]
    fn test_default_payload_matches_kind() {
        for kind in [
            ComponentKind::Frame,
            ComponentKind::Nav,
            ComponentKind::Divider,
            ComponentKind::Radio,
        ] {
            assert_eq!(ComponentPayload::default_for(kind).kind(), kind);
        }
    }
}
