use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub field: FieldSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub textures: TextureSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Frame cap; zero follows the display refresh.
    pub fps: f32,
    #[serde(deserialize_with = "deserialize_antialias")]
    pub antialias: AntialiasSetting,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSection {
    pub seed: Option<u64>,
    pub point_scale: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSection {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    pub orbit: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextureSection {
    /// Color texture inputs; `None` uses the built-in hosted set.
    pub colors: Option<Vec<String>>,
    pub mask: Option<String>,
    #[serde(deserialize_with = "deserialize_duration")]
    pub fetch_timeout: Duration,
    pub offline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Point Field".to_string(),
            fps: 0.0,
            antialias: AntialiasSetting::Auto,
        }
    }
}

impl Default for FieldSection {
    fn default() -> Self {
        Self {
            seed: None,
            point_scale: 3000.0,
        }
    }
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            fov: 70.0,
            near: 0.1,
            far: 3000.0,
            distance: 1000.0,
            orbit: true,
        }
    }
}

impl Default for TextureSection {
    fn default() -> Self {
        Self {
            colors: None,
            mask: None,
            fetch_timeout: default_fetch_timeout(),
            offline: false,
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            window: WindowSection::default(),
            field: FieldSection::default(),
            camera: CameraSection::default(),
            textures: TextureSection::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(15)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_antialias<'de, D>(deserializer: D) -> Result<AntialiasSetting, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Str(raw) => parse_antialias(&raw).map_err(de::Error::custom),
        Helper::Num(value) if value < 0 => {
            Err(de::Error::custom("antialias value must be non-negative"))
        }
        Helper::Num(value) => parse_antialias(&value.to_string()).map_err(de::Error::custom),
    }
}

/// Parses `auto`, `off`, or a sample count of 2, 4, 8 or 16.
pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

impl FieldConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FieldConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`FieldConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let window = &self.window;
        if window.width == 0 || window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                window.width, window.height
            )));
        }
        if !window.fps.is_finite() || window.fps < 0.0 {
            return Err(ConfigError::Invalid("window.fps must be a finite number >= 0".into()));
        }

        if !self.field.point_scale.is_finite() || self.field.point_scale <= 0.0 {
            return Err(ConfigError::Invalid(
                "field.point_scale must be greater than zero".into(),
            ));
        }

        let camera = &self.camera;
        if !camera.near.is_finite()
            || !camera.far.is_finite()
            || camera.near <= 0.0
            || camera.near >= camera.far
        {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far (near {}, far {})",
                camera.near, camera.far
            )));
        }
        if !camera.fov.is_finite() || camera.fov <= 0.0 || camera.fov >= 180.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.fov {} must lie strictly between 0 and 180 degrees",
                camera.fov
            )));
        }
        if !camera.distance.is_finite() || camera.distance <= 0.0 {
            return Err(ConfigError::Invalid(
                "camera.distance must be a finite number greater than zero".into(),
            ));
        }

        if let Some(colors) = &self.textures.colors {
            if colors.len() != 4 {
                return Err(ConfigError::Invalid(format!(
                    "textures.colors must list exactly 4 sources, found {}",
                    colors.len()
                )));
            }
            if colors.iter().any(|source| source.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "textures.colors contains an empty source".into(),
                ));
            }
        }
        if let Some(mask) = &self.textures.mask {
            if mask.trim().is_empty() {
                return Err(ConfigError::Invalid("textures.mask must not be empty".into()));
            }
        }

        Ok(())
    }

    /// The four configured color inputs, when set.
    pub fn color_inputs(&self) -> Option<[String; 4]> {
        let colors = self.textures.colors.as_ref()?;
        <[String; 4]>::try_from(colors.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[window]
width = 800
height = 600
title = "Demo"
fps = 30
antialias = 4

[field]
seed = 7
point_scale = 2500.0

[camera]
fov = 60.0
near = 0.5
far = 4000.0
distance = 1200.0
orbit = false

[textures]
colors = ["a.png", "b.png", "https://example.com/c.jpeg", "d.png"]
mask = "mask.png"
fetch_timeout = "2m 30s"
offline = true
"#;

    #[test]
    fn parses_sample_config() {
        let config = FieldConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.fps, 30.0);
        assert_eq!(config.window.antialias, AntialiasSetting::Samples4);
        assert_eq!(config.field.seed, Some(7));
        assert_eq!(config.camera.far, 4000.0);
        assert!(!config.camera.orbit);
        assert_eq!(config.textures.fetch_timeout, Duration::from_secs(150));
        assert!(config.textures.offline);
        let colors = config.color_inputs().unwrap();
        assert_eq!(colors[2], "https://example.com/c.jpeg");
        assert_eq!(config.textures.mask.as_deref(), Some("mask.png"));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = FieldConfig::from_toml_str("").unwrap();
        assert_eq!(config, FieldConfig::default());
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert_eq!(config.field.point_scale, 3000.0);
        assert_eq!(config.camera.fov, 70.0);
        assert_eq!(config.textures.fetch_timeout, Duration::from_secs(15));
        assert!(config.color_inputs().is_none());
    }

    #[test]
    fn numeric_timeout_is_seconds() {
        let config = FieldConfig::from_toml_str("[textures]\nfetch_timeout = 4\n").unwrap();
        assert_eq!(config.textures.fetch_timeout, Duration::from_secs(4));
    }

    #[test]
    fn rejects_wrong_color_count() {
        let err = FieldConfig::from_toml_str("[textures]\ncolors = [\"a\", \"b\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("exactly 4")));
    }

    #[test]
    fn rejects_bad_clip_planes_and_fov() {
        for body in [
            "[camera]\nnear = 0.0\n",
            "[camera]\nnear = 10.0\nfar = 5.0\n",
            "[camera]\nfov = 180.0\n",
            "[camera]\ndistance = -1.0\n",
            "[window]\nwidth = 0\n",
            "[window]\nfps = -1\n",
            "[field]\npoint_scale = 0.0\n",
            "version = 2\n",
        ] {
            let err = FieldConfig::from_toml_str(body).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{body}: {err}");
        }
    }

    #[test]
    fn rejects_non_finite_numbers() {
        for body in [
            "[camera]\nfar = nan\n",
            "[camera]\nfar = inf\n",
            "[camera]\nnear = nan\n",
            "[camera]\ndistance = inf\n",
            "[camera]\ndistance = nan\n",
            "[field]\npoint_scale = inf\n",
            "[window]\nfps = inf\n",
        ] {
            let err = FieldConfig::from_toml_str(body).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{body}: {err}");
        }
    }

    #[test]
    fn rejects_unknown_keys_and_bad_antialias() {
        assert!(matches!(
            FieldConfig::from_toml_str("[window]\nvsync = true\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FieldConfig::from_toml_str("[window]\nantialias = 3\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pointfield.toml");
        assert_eq!(FieldConfig::load_or_default(&path).unwrap(), FieldConfig::default());
        assert!(matches!(
            FieldConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));

        fs::write(&path, "[field]\nseed = 3\n").unwrap();
        assert_eq!(FieldConfig::load_or_default(&path).unwrap().field.seed, Some(3));
    }

    #[test]
    fn parses_antialias_aliases() {
        assert_eq!(parse_antialias("MAX").unwrap(), AntialiasSetting::Auto);
        assert_eq!(parse_antialias("none").unwrap(), AntialiasSetting::Off);
        assert_eq!(parse_antialias(" 16 ").unwrap(), AntialiasSetting::Samples16);
        assert!(parse_antialias("5").is_err());
    }
}
