use serde::{Deserialize, Serialize};

/// Diagram color theme.
///
/// Switching theme requires the engine to be reconfigured and the diagram rendered again;
/// already-rendered markup is never re-themed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Neutral,
    Forest,
}

impl Theme {
    /// Theme id understood by the rendering engine.
    pub fn engine_name(self) -> &'static str {
        match self {
            Theme::Light => "default",
            Theme::Dark => "dark",
            Theme::Neutral => "neutral",
            Theme::Forest => "forest",
        }
    }

    /// The toolbar toggle flips between light and dark. Neutral and forest count as light.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light | Theme::Neutral | Theme::Forest => Theme::Dark,
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// Solid fill painted under exported content.
    ///
    /// Rendered SVG is transparent; without a fill, raster viewers show it on black or
    /// checkerboard, which makes dark-theme labels unreadable.
    pub fn background(self) -> &'static str {
        if self.is_dark() { "#333333" } else { "#ffffff" }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Neutral => "neutral",
            Theme::Forest => "forest",
        })
    }
}

/// Engine security posture.
///
/// The viewer defaults to [`SecurityLevel::Loose`]: diagram sources are authored by the site
/// owner, so script-bearing markup (click callbacks, links) is allowed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Strict,
    #[default]
    Loose,
    Antiscript,
    Sandbox,
}

impl SecurityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityLevel::Strict => "strict",
            SecurityLevel::Loose => "loose",
            SecurityLevel::Antiscript => "antiscript",
            SecurityLevel::Sandbox => "sandbox",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_light_and_dark() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Forest.toggled(), Theme::Dark);
        assert_eq!(Theme::Neutral.toggled().toggled(), Theme::Light);
    }

    #[test]
    fn light_and_dark_backgrounds_differ() {
        assert_ne!(Theme::Light.background(), Theme::Dark.background());
        assert_eq!(Theme::Forest.background(), Theme::Light.background());
    }

    #[test]
    fn theme_deserializes_from_lowercase_names() {
        let theme: Theme = serde_json::from_str("\"forest\"").unwrap();
        assert_eq!(theme, Theme::Forest);
        assert_eq!(theme.engine_name(), "forest");
        assert_eq!(Theme::Light.engine_name(), "default");
    }
}
