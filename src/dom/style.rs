//! Computed style values consulted by popups.
//!
//! Only the two properties that decide whether a popup (or an element inside
//! it) is perceivable are modelled: `display` and `visibility`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// Display
// ============================================================================

/// Computed `display` value.
///
/// Anything other than `none` counts as displayed; the concrete layout mode is
/// kept for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    /// `display: none`.
    None,
    /// `display: block`.
    #[default]
    Block,
    /// `display: inline`.
    Inline,
    /// Any other layout mode (`flex`, `grid`, `inline-block`, ...).
    Other(String),
}

impl Display {
    /// Returns `true` for `display: none`.
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the CSS keyword.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Block => "block",
            Self::Inline => "inline",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Display {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "" => Err(Error::invalid_argument("empty display value")),
            "none" => Ok(Self::None),
            "block" => Ok(Self::Block),
            "inline" => Ok(Self::Inline),
            _ => Ok(Self::Other(value)),
        }
    }
}

// ============================================================================
// Visibility
// ============================================================================

/// Computed `visibility` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// `visibility: visible`.
    #[default]
    Visible,
    /// `visibility: hidden`.
    Hidden,
    /// `visibility: collapse`.
    Collapse,
}

impl Visibility {
    /// Returns the CSS keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Collapse => "collapse",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" => Ok(Self::Visible),
            "hidden" => Ok(Self::Hidden),
            "collapse" => Ok(Self::Collapse),
            other => Err(Error::invalid_argument(format!(
                "unknown visibility value: {other}"
            ))),
        }
    }
}

// ============================================================================
// ComputedStyle
// ============================================================================

/// The subset of an element's computed style used by popups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    /// Computed `display`.
    pub display: Display,
    /// Computed `visibility`.
    pub visibility: Visibility,
}

impl ComputedStyle {
    /// Returns `true` unless the element is `display: none` or
    /// `visibility: hidden`.
    #[inline]
    #[must_use]
    pub fn is_rendered_visible(&self) -> bool {
        !self.display.is_none() && self.visibility != Visibility::Hidden
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse() {
        assert_eq!("none".parse::<Display>().unwrap(), Display::None);
        assert_eq!(" Block ".parse::<Display>().unwrap(), Display::Block);
        assert_eq!(
            "flex".parse::<Display>().unwrap(),
            Display::Other("flex".to_string())
        );
        assert!("".parse::<Display>().is_err());
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("hidden".parse::<Visibility>().unwrap(), Visibility::Hidden);
        assert!("blurry".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_default_style_is_visible() {
        assert!(ComputedStyle::default().is_rendered_visible());
    }

    #[test]
    fn test_hidden_styles() {
        let none = ComputedStyle {
            display: Display::None,
            ..Default::default()
        };
        let hidden = ComputedStyle {
            visibility: Visibility::Hidden,
            ..Default::default()
        };
        let collapsed = ComputedStyle {
            visibility: Visibility::Collapse,
            ..Default::default()
        };

        assert!(!none.is_rendered_visible());
        assert!(!hidden.is_rendered_visible());
        // Only `hidden` counts; `collapse` is left to layout.
        assert!(collapsed.is_rendered_visible());
    }
}
