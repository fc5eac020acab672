//! Theme support for the dashboard.
//!
//! Provides the built-in Tokyo Night and default themes.

use ratatui::style::Color;

/// A complete color theme for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Theme name for display and configuration
    pub name: String,
    /// Running packages and info log lines
    pub primary: Color,
    /// Pane titles
    pub accent: Color,
    /// Main text color
    pub text: Color,
    /// Timestamps, hints, pending packages
    pub text_muted: Color,
    /// Background color (Reset uses terminal default)
    pub background: Color,
    /// Border color
    pub border: Color,
    /// Success indicator color
    pub success: Color,
    /// Warning indicator color
    pub warning: Color,
    /// Error indicator color
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::tokyo_night()
    }
}

impl Theme {
    /// Default theme - terminal colors, works on light and dark backgrounds.
    pub fn default_theme() -> Self {
        Self {
            name: "default".to_string(),
            primary: Color::Blue,
            accent: Color::Magenta,
            text: Color::Reset,
            text_muted: Color::DarkGray,
            background: Color::Reset,
            border: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }

    /// Tokyo Night theme.
    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night".to_string(),
            primary: Color::Rgb(122, 162, 247),    // Blue
            accent: Color::Rgb(187, 154, 247),     // Magenta
            text: Color::Rgb(192, 202, 245),       // Foreground
            text_muted: Color::Rgb(86, 95, 137),   // Comment
            background: Color::Rgb(26, 27, 38),    // Background
            border: Color::Rgb(41, 46, 66),        // Highlight
            success: Color::Rgb(158, 206, 106),    // Green
            warning: Color::Rgb(224, 175, 104),    // Yellow
            error: Color::Rgb(247, 118, 142),      // Red
        }
    }

    /// Get a theme by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default_theme()),
            "tokyo-night" | "tokyo_night" => Some(Self::tokyo_night()),
            _ => None,
        }
    }

    /// Theme by name, falling back to Tokyo Night for unknown names.
    pub fn from_config(name: &str) -> Self {
        Self::by_name(name).unwrap_or_else(|| {
            tracing::warn!(theme = name, "Unknown theme, using tokyo-night");
            Self::tokyo_night()
        })
    }

    /// List all available built-in theme names.
    pub fn available_themes() -> Vec<&'static str> {
        vec!["tokyo-night", "default"]
    }
}

/// Parse a hex color string (#RRGGBB or RRGGBB) into a Color.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_tokyo_night() {
        assert_eq!(Theme::default().name, "tokyo-night");
    }

    #[test]
    fn test_theme_by_name() {
        assert!(Theme::by_name("Tokyo-Night").is_some());
        assert!(Theme::by_name("tokyo_night").is_some());
        assert!(Theme::by_name("default").is_some());
        assert!(Theme::by_name("dracula").is_none());
        assert_eq!(Theme::from_config("dracula").name, "tokyo-night");
    }

    #[test]
    fn test_tokyo_night_palette() {
        let theme = Theme::tokyo_night();
        assert_eq!(Some(theme.background), parse_hex_color("#1a1b26"));
        assert_eq!(Some(theme.text), parse_hex_color("#c0caf5"));
        assert_eq!(Some(theme.success), parse_hex_color("#9ece6a"));
        assert_eq!(Some(theme.error), parse_hex_color("#f7768e"));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("00FF00"), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(parse_hex_color("invalid"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
    }

    #[test]
    fn test_all_builtin_themes_valid() {
        for name in Theme::available_themes() {
            let theme = Theme::by_name(name).unwrap_or_else(|| panic!("Theme {} should exist", name));
            assert_eq!(theme.name, name);
        }
    }
}
