use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use story_store::KeyValueStore;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("Unknown theme '{other}'. Use light or dark.")),
        }
    }
}

/// UI preferences kept beside, not inside, the writing core.
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
}

impl Preferences {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let theme = match store.get(THEME_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|error: String| {
                tracing::warn!(%error, "ignoring stored theme");
                Theme::default()
            }),
            None => Theme::default(),
        };

        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.store.set(THEME_KEY, theme.as_str());
    }
}
