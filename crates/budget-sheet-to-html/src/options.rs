use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

pub const DEFAULT_IDENTIFIER_COLUMN: &str = "公司简称";
pub const DEFAULT_PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Zero-based sheet rows holding the primary and secondary header labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRows {
    pub primary: usize,
    pub secondary: usize,
}

impl Default for HeaderRows {
    fn default() -> Self {
        Self {
            primary: 11,
            secondary: 12,
        }
    }
}

impl FromStr for HeaderRows {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (primary, secondary) = value
            .split_once(',')
            .ok_or_else(|| format!("invalid header rows '{value}', expected primary,secondary"))?;

        let primary: usize = primary
            .trim()
            .parse()
            .map_err(|_| format!("invalid primary header row: '{primary}'"))?;
        let secondary: usize = secondary
            .trim()
            .parse()
            .map_err(|_| format!("invalid secondary header row: '{secondary}'"))?;

        if secondary <= primary {
            return Err(format!(
                "invalid header rows '{value}': secondary row must follow primary row"
            ));
        }

        Ok(Self { primary, secondary })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub header_rows: HeaderRows,
    pub identifier_column: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            header_rows: HeaderRows::default(),
            identifier_column: DEFAULT_IDENTIFIER_COLUMN.to_string(),
        }
    }
}

/// Page colors. Field names follow the style sheet variables they feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary_blue: String,
    pub secondary_blue: String,
    pub light_blue: String,
    pub light_blue_bg: String,
    pub rise_red: String,
    pub fall_green: String,
    pub neutral_gray: String,
    pub text_dark: String,
    pub text_gray: String,
    pub border_light: String,
    pub attention_orange: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_blue: "#0052cc".to_string(),
            secondary_blue: "#4a90e2".to_string(),
            light_blue: "#74b9ff".to_string(),
            light_blue_bg: "#e6f0ff".to_string(),
            rise_red: "#ff4d4f".to_string(),
            fall_green: "#52c41a".to_string(),
            neutral_gray: "#95a5a6".to_string(),
            text_dark: "#1f1f1f".to_string(),
            text_gray: "#666".to_string(),
            border_light: "#d9d9d9".to_string(),
            attention_orange: "#d46b08".to_string(),
        }
    }
}

impl Theme {
    /// Loads a theme from JSON; missing keys keep their default color.
    ///
    /// Values land inside the page's `<style>` block, so anything that could
    /// end a declaration or the tag itself is rejected.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let theme: Self = serde_json::from_str(json)?;
        theme.validate()?;
        Ok(theme)
    }

    fn colors(&self) -> [(&'static str, &str); 11] {
        [
            ("primary_blue", self.primary_blue.as_str()),
            ("secondary_blue", self.secondary_blue.as_str()),
            ("light_blue", self.light_blue.as_str()),
            ("light_blue_bg", self.light_blue_bg.as_str()),
            ("rise_red", self.rise_red.as_str()),
            ("fall_green", self.fall_green.as_str()),
            ("neutral_gray", self.neutral_gray.as_str()),
            ("text_dark", self.text_dark.as_str()),
            ("text_gray", self.text_gray.as_str()),
            ("border_light", self.border_light.as_str()),
            ("attention_orange", self.attention_orange.as_str()),
        ]
    }

    fn validate(&self) -> Result<(), ReportError> {
        for (name, value) in self.colors() {
            if value.chars().any(|ch| matches!(ch, '<' | '>' | ';' | '{' | '}' | '"')) {
                return Err(ReportError::InvalidOption(format!(
                    "theme color {name} has invalid value '{value}'"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub theme: Theme,
    pub plotly_src: String,
    pub footer: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            plotly_src: DEFAULT_PLOTLY_SRC.to_string(),
            footer: None,
        }
    }
}
