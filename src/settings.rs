//! User preferences: the sheet font table and defaults for new sheets.
//!
//! Stored as JSON5 so hand edits may carry comments and trailing commas; written
//! back as plain JSON, which JSON5 readers accept.

use crate::notify::Notifier;
use crate::statics;
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const FONT_SIZE_MIN: i32 = 1;
pub const FONT_SIZE_MAX: i32 = 200;
pub const DEFAULT_FONT_NAME: &str = "SansSerif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => FontStyle::Plain,
            1 => FontStyle::Bold,
            2 => FontStyle::Italic,
            3 => FontStyle::BoldItalic,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            FontStyle::Plain => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::BoldItalic => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDesc {
    pub name: String,
    pub style: FontStyle,
    pub size: i32,
}

impl FontDesc {
    pub fn new(name: &str, style: FontStyle, size: i32) -> Self {
        Self {
            name: name.to_string(),
            style,
            size: size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX),
        }
    }

    /// Parses `"name,style,size"`. Missing or unusable parts come from `default`;
    /// sizes outside 1..=200 are clamped.
    pub fn parse(text: &str, default: &FontDesc) -> Self {
        let mut font = default.clone();
        let mut parts = text.split(',').map(str::trim);
        match parts.next() {
            Some(name) if !name.is_empty() => font.name = name.to_string(),
            _ => return font,
        }
        if let Some(style) = parts.next() {
            font.style = style
                .parse()
                .ok()
                .and_then(FontStyle::from_code)
                .unwrap_or(default.style);
            if let Some(size) = parts.next() {
                font.size = size
                    .parse::<i64>()
                    .map(|s| s.clamp(FONT_SIZE_MIN as i64, FONT_SIZE_MAX as i64) as i32)
                    .unwrap_or(default.size);
            }
        }
        font
    }

    pub fn to_setting(&self) -> String {
        format!("{},{},{}", self.name, self.style.code(), self.size)
    }
}

/// Registered font keys with their defaults, in display order.
pub fn default_fonts() -> IndexMap<String, FontDesc> {
    [
        (statics::FONT_LABEL_PRIMARY, FontStyle::Plain, 9),
        (statics::FONT_LABEL_SECONDARY, FontStyle::Plain, 8),
        (statics::FONT_FIELD_PRIMARY, FontStyle::Plain, 9),
        (statics::FONT_FIELD_SECONDARY, FontStyle::Plain, 8),
        (statics::FONT_FOOTER_PRIMARY, FontStyle::Bold, 8),
        (statics::FONT_FOOTER_SECONDARY, FontStyle::Plain, 6),
    ]
    .into_iter()
    .map(|(key, style, size)| (key.to_string(), FontDesc::new(DEFAULT_FONT_NAME, style, size)))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetDefaults {
    /// Zoom percentage new sheet windows open at.
    pub initial_scale: i32,
    pub include_kick_boots: bool,
}

impl Default for SheetDefaults {
    fn default() -> Self {
        Self {
            initial_scale: 100,
            include_kick_boots: false,
        }
    }
}

/// On-disk shape of the settings file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SettingsFile {
    fonts: IndexMap<String, String>,
    sheet: SheetDefaults,
}

/// Preferences passed explicitly to whatever needs them.
#[derive(Debug)]
pub struct Settings {
    fonts: IndexMap<String, FontDesc>,
    pub sheet: SheetDefaults,
    notifier: Notifier,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self {
            fonts: default_fonts(),
            sheet: SheetDefaults::default(),
            notifier: Notifier::new(),
        }
    }

    pub fn from_json5(text: &str) -> anyhow::Result<Self> {
        let file: SettingsFile = json5::from_str(text).context("parsing settings")?;
        let mut settings = Self::new();
        for (key, value) in &file.fonts {
            match settings.fonts.get_mut(key) {
                Some(font) => *font = FontDesc::parse(value, font),
                None => log::debug!("ignoring unknown font key {key:?}"),
            }
        }
        settings.sheet = file.sheet;
        settings.sheet.initial_scale = settings.sheet.initial_scale.clamp(10, 1000);
        Ok(settings)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        let file = SettingsFile {
            fonts: self
                .fonts
                .iter()
                .map(|(key, font)| (key.clone(), font.to_setting()))
                .collect(),
            sheet: self.sheet.clone(),
        };
        serde_json::to_string_pretty(&file).context("serializing settings")
    }

    /// Loads settings from `path`; a missing file yields the defaults.
    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("no settings at {path:?}; using defaults");
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        Self::from_json5(&text).with_context(|| format!("loading settings from {path:?}"))
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let text = self.to_json()?;
        fs::write(path, text).with_context(|| format!("writing {path:?}"))
    }

    pub fn font(&self, key: &str) -> Option<&FontDesc> {
        self.fonts.get(key)
    }

    pub fn fonts(&self) -> impl Iterator<Item = (&str, &FontDesc)> {
        self.fonts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replaces a registered font and announces it. Unknown keys are rejected.
    pub fn set_font(&mut self, key: &str, font: FontDesc) -> bool {
        let Some(slot) = self.fonts.get_mut(key) else {
            return false;
        };
        if *slot == font {
            return false;
        }
        *slot = font;
        self.notifier
            .notify(None, statics::FONT_NOTIFICATION_KEY, Some(&key.to_string()));
        true
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::{FontDesc, FontStyle, Settings};
    use crate::statics;

    #[test]
    fn font_parts_fall_back_individually() {
        let default = FontDesc::new("Default", FontStyle::Bold, 9);
        assert_eq!(
            FontDesc::parse("Serif,2,12", &default),
            FontDesc::new("Serif", FontStyle::Italic, 12)
        );
        assert_eq!(
            FontDesc::parse("Serif,7,500", &default),
            FontDesc::new("Serif", FontStyle::Bold, 200)
        );
        assert_eq!(
            FontDesc::parse("Serif,x,big", &default),
            FontDesc::new("Serif", FontStyle::Bold, 9)
        );
        assert_eq!(FontDesc::parse("Mono", &default).name, "Mono");
        assert_eq!(FontDesc::parse("", &default), default);
        assert_eq!(FontDesc::parse("Serif,0,-4", &default).size, 1);
    }

    #[test]
    fn json5_with_comments_loads() {
        let text = r#"{
            // hand edited
            fonts: { "field.primary": "Serif,1,11", "bogus": "X,0,1", },
            sheet: { initial_scale: 5000 },
        }"#;
        let settings = Settings::from_json5(text).unwrap();
        assert_eq!(
            settings.font(statics::FONT_FIELD_PRIMARY),
            Some(&FontDesc::new("Serif", FontStyle::Bold, 11))
        );
        assert!(settings.font("bogus").is_none());
        assert_eq!(settings.sheet.initial_scale, 1000);
        assert!(!settings.sheet.include_kick_boots);
    }
}
