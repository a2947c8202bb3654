use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::constants::{APP_DIR_NAME, DEFAULT_SQUARE_SIZES};

/// Which redaction operator is applied to the confirmed person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionMode {
    Blur,
    Pixelate,
    Combined,
    /// Hard-edged blur of exactly the target, no padding or feathering.
    Rectangle,
}

impl RedactionMode {
    pub const ALL: &[RedactionMode] = &[
        RedactionMode::Blur,
        RedactionMode::Pixelate,
        RedactionMode::Combined,
        RedactionMode::Rectangle,
    ];
}

impl std::fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedactionMode::Blur => write!(f, "blur"),
            RedactionMode::Pixelate => write!(f, "pixelate"),
            RedactionMode::Combined => write!(f, "combined"),
            RedactionMode::Rectangle => write!(f, "rectangle"),
        }
    }
}

impl std::str::FromStr for RedactionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blur" => Ok(RedactionMode::Blur),
            "pixelate" => Ok(RedactionMode::Pixelate),
            "combined" => Ok(RedactionMode::Combined),
            "rectangle" => Ok(RedactionMode::Rectangle),
            other => Err(format!(
                "redaction mode must be blur, pixelate, combined or rectangle, got '{other}'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurSettings {
    pub kernel_size: usize,
    pub sigma: f64,
    pub padding: u32,
    pub fade_size: u32,
    pub mask_kernel_size: usize,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            kernel_size: 99,
            sigma: 30.0,
            padding: 30,
            fade_size: 40,
            mask_kernel_size: 99,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelateSettings {
    pub granularity: u32,
    pub padding: u32,
    pub fade_size: u32,
    pub mask_kernel_size: usize,
}

impl Default for PixelateSettings {
    fn default() -> Self {
        Self {
            granularity: 16,
            padding: 20,
            fade_size: 30,
            mask_kernel_size: 31,
        }
    }
}

/// User-tunable parameters, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: RedactionMode,
    pub blur: BlurSettings,
    pub pixelate: PixelateSettings,
    /// Lowest similarity a matched candidate needs to be ranked.
    pub min_similarity: Option<f64>,
    pub face_confidence: f64,
    pub person_confidence: f64,
    pub match_threshold: f64,
    pub square_sizes: Vec<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: RedactionMode::Combined,
            blur: BlurSettings::default(),
            pixelate: PixelateSettings::default(),
            min_similarity: None,
            face_confidence: 0.5,
            person_confidence: 0.4,
            match_threshold: 0.4,
            square_sizes: DEFAULT_SQUARE_SIZES.to_vec(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads settings from an explicit file; parse and read errors propagate.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Loads the user's settings file, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring unreadable settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("face confidence", self.face_confidence),
            ("person confidence", self.person_confidence),
            ("match threshold", self.match_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be between 0.0 and 1.0, got {value}"));
            }
        }
        if self.blur.kernel_size == 0 {
            return Err("blur kernel size must be positive".into());
        }
        if self.pixelate.granularity == 0 {
            return Err("pixelation granularity must be positive".into());
        }
        if self.square_sizes.is_empty() || self.square_sizes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!(
                "square sizes must be non-empty and strictly ascending, got {:?}",
                self.square_sizes
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_save_and_load_preserve_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let settings = Settings {
            mode: RedactionMode::Pixelate,
            min_similarity: Some(0.5),
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{ "mode": "blur", "blur": { "padding": 5 } }"#).unwrap();

        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded.mode, RedactionMode::Blur);
        assert_eq!(loaded.blur.padding, 5);
        assert_eq!(loaded.blur.kernel_size, BlurSettings::default().kernel_size);
        assert_eq!(loaded.square_sizes, DEFAULT_SQUARE_SIZES);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[rstest]
    #[case::blur("blur", RedactionMode::Blur)]
    #[case::pixelate("Pixelate", RedactionMode::Pixelate)]
    #[case::combined("COMBINED", RedactionMode::Combined)]
    #[case::rectangle("rectangle", RedactionMode::Rectangle)]
    fn test_mode_parses_case_insensitively(#[case] input: &str, #[case] expected: RedactionMode) {
        assert_eq!(input.parse::<RedactionMode>().unwrap(), expected);
    }

    #[test]
    fn test_mode_display_round_trips() {
        for mode in RedactionMode::ALL {
            assert_eq!(mode.to_string().parse::<RedactionMode>().unwrap(), *mode);
        }
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!("smudge".parse::<RedactionMode>().is_err());
    }

    #[rstest]
    #[case::confidence(Settings { face_confidence: 1.5, ..Settings::default() })]
    #[case::granularity(Settings {
        pixelate: PixelateSettings { granularity: 0, ..PixelateSettings::default() },
        ..Settings::default()
    })]
    #[case::unsorted_sizes(Settings { square_sizes: vec![512, 256], ..Settings::default() })]
    #[case::no_sizes(Settings { square_sizes: vec![], ..Settings::default() })]
    fn test_validate_rejects_bad_values(#[case] settings: Settings) {
        assert!(settings.validate().is_err());
    }
}
