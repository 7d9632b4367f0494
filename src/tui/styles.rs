//! Field-themed color palette and styles.
//!
//! Colors chosen for:
//! - High contrast on dark terminals
//! - Greens for growth, earth tones for soil readings

use ratatui::style::{Color, Modifier, Style};

/// Agronomy theme color palette.
pub struct AgroTheme;

impl AgroTheme {
    // === Primary Colors ===

    /// Leaf green - Primary color
    pub const PRIMARY: Color = Color::Rgb(22, 163, 74); // #16A34A

    /// Lighter green for highlights
    pub const PRIMARY_LIGHT: Color = Color::Rgb(74, 222, 128); // #4ADE80

    /// Darker green for accents
    pub const PRIMARY_DARK: Color = Color::Rgb(21, 128, 61); // #15803D

    // === Secondary Colors ===

    /// Soil brown
    pub const SECONDARY: Color = Color::Rgb(120, 83, 52); // #785334

    /// Light stone for borders
    pub const SECONDARY_LIGHT: Color = Color::Rgb(168, 162, 158); // #A8A29E

    // === Semantic Colors ===

    pub const SUCCESS: Color = Color::Rgb(34, 197, 94); // #22C55E

    /// Wheat - Warning/extrapolation
    pub const WARNING: Color = Color::Rgb(234, 179, 8); // #EAB308

    pub const DANGER: Color = Color::Rgb(239, 68, 68); // #EF4444

    /// Sky blue - Info/rainfall
    pub const INFO: Color = Color::Rgb(56, 189, 248); // #38BDF8

    // === Background Colors ===

    pub const BG_DARK: Color = Color::Rgb(20, 24, 18); // #141812

    // === Text Colors ===

    pub const TEXT_PRIMARY: Color = Color::Rgb(250, 250, 249); // #FAFAF9

    pub const TEXT_SECONDARY: Color = Color::Rgb(168, 162, 158); // #A8A29E

    pub const TEXT_MUTED: Color = Color::Rgb(120, 113, 108); // #78716C

    // === Preset Styles ===

    /// Style for titles
    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for subtitles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Style for focused elements
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the text cursor in form fields
    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    /// Style for borders
    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    /// Style for focused borders
    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Style for the top-1 recommendation banner
    #[must_use]
    pub fn highlight() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY_DARK)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key hints
    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key descriptions
    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Gauge style for a probability
    #[must_use]
    pub fn confidence(probability: f64) -> Style {
        if probability >= 0.7 {
            Self::success()
        } else if probability >= 0.3 {
            Self::warning()
        } else {
            Self::danger()
        }
    }

    /// Style for a correlation coefficient, by magnitude
    #[must_use]
    pub fn correlation(r: f64) -> Style {
        let magnitude = r.abs();
        if magnitude >= 0.5 {
            Self::warning()
        } else if magnitude >= 0.15 {
            Self::info()
        } else {
            Self::text_muted()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bands() {
        assert_eq!(AgroTheme::confidence(0.95), AgroTheme::success());
        assert_eq!(AgroTheme::confidence(0.5), AgroTheme::warning());
        assert_eq!(AgroTheme::confidence(0.1), AgroTheme::danger());
    }

    #[test]
    fn test_correlation_bands() {
        assert_eq!(AgroTheme::correlation(-0.74), AgroTheme::warning());
        assert_eq!(AgroTheme::correlation(0.2), AgroTheme::info());
        assert_eq!(AgroTheme::correlation(0.01), AgroTheme::text_muted());
    }
}
