use anyhow::{Context, Result};
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// Everything the UI reads is gathered here, built once at startup and passed
// down by reference. Colors are `#rrggbb` strings or one of a few names.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: String,
    pub default_text: String,
    pub folder: String,
    pub search_highlight_fore: String,
    pub search_highlight_back: String,
    pub selection_back: String,
    pub selection_inactive: String,
    pub selection_fore: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: "black".to_string(),
            default_text: "lgrey".to_string(),
            folder: "#8ac6f2".to_string(),
            search_highlight_fore: "black".to_string(),
            search_highlight_back: "yellow".to_string(),
            selection_back: "#335ea8".to_string(),
            selection_inactive: "grey".to_string(),
            selection_fore: "white".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    pub font_size: f32,
    pub columns_vertical: usize,
    pub columns_horizontal: usize,
    pub editor: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            font_size: 13.0,
            columns_vertical: 3,
            columns_horizontal: 5,
            editor: "gvim".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: Theme,
    pub general: General,
}

pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

pub fn resolve_color(name: &str) -> Color32 {
    let named = match name {
        "black" => Some(Color32::from_rgb(0x00, 0x00, 0x00)),
        "white" => Some(Color32::from_rgb(0xff, 0xff, 0xff)),
        "yellow" => Some(Color32::from_rgb(0xff, 0xff, 0x00)),
        "blue" => Some(Color32::from_rgb(0x00, 0x00, 0xff)),
        "red" => Some(Color32::from_rgb(0xff, 0x00, 0x00)),
        "lgrey" => Some(Color32::from_rgb(0xcc, 0xcc, 0xcc)),
        "grey" => Some(Color32::from_rgb(0x99, 0x99, 0x99)),
        _ => None,
    };
    if let Some(color) = named {
        return color;
    }
    parse_hex_color(name).unwrap_or(Color32::WHITE)
}

fn parse_hex_color(raw: &str) -> Option<Color32> {
    let hex = raw.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}
