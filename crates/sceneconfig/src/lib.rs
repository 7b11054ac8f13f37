use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Deepest icosphere subdivision we are willing to upload (~164k vertices).
pub const MAX_SUBDIVISIONS: u32 = 7;

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub amplitude: AmplitudeSection,
    #[serde(default)]
    pub clock: ClockSection,
    #[serde(default)]
    pub material: MaterialSection,
    #[serde(default)]
    pub mesh: MeshSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub lights: LightsSection,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            amplitude: AmplitudeSection::default(),
            clock: ClockSection::default(),
            material: MaterialSection::default(),
            mesh: MeshSection::default(),
            camera: CameraSection::default(),
            lights: LightsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingSetting {
    Linear,
    Smoothstep,
    EaseInOut,
    #[default]
    EaseOutCubic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AmplitudeSection {
    pub initial: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub transition: Duration,
    pub easing: EasingSetting,
    #[serde(deserialize_with = "deserialize_duration")]
    pub debounce: Duration,
}

impl Default for AmplitudeSection {
    fn default() -> Self {
        Self {
            initial: 4.0,
            min: 2.0,
            max: 5.0,
            step: 1.0,
            transition: Duration::from_secs(5),
            easing: EasingSetting::default(),
            debounce: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockSection {
    /// Divisor applied to elapsed seconds before they reach the `time` uniform.
    pub time_scale: f32,
}

impl Default for ClockSection {
    fn default() -> Self {
        Self { time_scale: 5.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaterialSection {
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for MaterialSection {
    fn default() -> Self {
        Self {
            color: Color::new(0x52, 0x6c, 0xff),
            metalness: 0.1,
            roughness: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeshSection {
    pub radius: f32,
    pub subdivisions: u32,
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            radius: 1.0,
            subdivisions: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub position: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Fraction of the remaining orbit velocity removed each frame.
    pub damping: f32,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 2.0],
            fov: 75.0,
            damping: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightsSection {
    pub background: Color,
    pub directional_color: Color,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    pub ambient_color: Color,
    pub ambient_intensity: f32,
}

impl Default for LightsSection {
    fn default() -> Self {
        Self {
            background: Color::new(0x09, 0x0a, 0x0b),
            directional_color: Color::new(0x52, 0x6c, 0xff),
            directional_intensity: 0.6,
            directional_position: [2.0, 2.0, 2.0],
            ambient_color: Color::new(0x42, 0x55, 0xff),
            ambient_intensity: 0.5,
        }
    }
}

/// 8-bit sRGB colour parsed from `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| format!("colour '{trimmed}' must start with '#'"))?;
        if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("colour '{trimmed}' must have the form #rrggbb"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|err| format!("colour '{trimmed}': {err}"))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Channels normalised to `0..=1`, still gamma encoded.
    pub fn to_srgb(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// Channels converted to linear light for shading.
    pub fn to_linear(self) -> [f32; 3] {
        self.to_srgb().map(srgb_to_linear)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Color::parse(&raw).map_err(de::Error::custom)
    }
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

fn default_version() -> u32 {
    1
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
            if v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let amplitude = &self.amplitude;
        for (name, value) in [
            ("amplitude.initial", amplitude.initial),
            ("amplitude.min", amplitude.min),
            ("amplitude.max", amplitude.max),
            ("amplitude.step", amplitude.step),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }
        if amplitude.min >= amplitude.max {
            return Err(ConfigError::Invalid(format!(
                "amplitude.min ({}) must be below amplitude.max ({})",
                amplitude.min, amplitude.max
            )));
        }
        if amplitude.initial < amplitude.min || amplitude.initial > amplitude.max {
            return Err(ConfigError::Invalid(format!(
                "amplitude.initial ({}) must lie within [{}, {}]",
                amplitude.initial, amplitude.min, amplitude.max
            )));
        }
        if amplitude.step <= 0.0 {
            return Err(ConfigError::Invalid(
                "amplitude.step must be greater than zero".into(),
            ));
        }
        if amplitude.transition.is_zero() {
            return Err(ConfigError::Invalid(
                "amplitude.transition must be greater than zero".into(),
            ));
        }

        if !(self.clock.time_scale.is_finite() && self.clock.time_scale > 0.0) {
            return Err(ConfigError::Invalid(
                "clock.time_scale must be greater than zero".into(),
            ));
        }

        for (name, value) in [
            ("material.metalness", self.material.metalness),
            ("material.roughness", self.material.roughness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must lie within [0, 1]")));
            }
        }

        if !(self.mesh.radius.is_finite() && self.mesh.radius > 0.0) {
            return Err(ConfigError::Invalid(
                "mesh.radius must be greater than zero".into(),
            ));
        }
        if self.mesh.subdivisions > MAX_SUBDIVISIONS {
            return Err(ConfigError::Invalid(format!(
                "mesh.subdivisions must be <= {MAX_SUBDIVISIONS}"
            )));
        }

        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(ConfigError::Invalid(
                "camera.fov must lie within (0, 180) degrees".into(),
            ));
        }
        if !(self.camera.damping > 0.0 && self.camera.damping <= 1.0) {
            return Err(ConfigError::Invalid(
                "camera.damping must lie within (0, 1]".into(),
            ));
        }
        if self.camera.position.iter().all(|component| *component == 0.0) {
            return Err(ConfigError::Invalid(
                "camera.position must not coincide with the mesh centre".into(),
            ));
        }

        for (name, value) in [
            ("lights.directional_intensity", self.lights.directional_intensity),
            ("lights.ambient_intensity", self.lights.ambient_intensity),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[amplitude]
initial = 3
min = 1
max = 6
step = 0.5
transition = "2s 500ms"
easing = "smoothstep"
debounce = 0.25

[clock]
time_scale = 2.5

[material]
color = "#ff8800"
metalness = 0.5
roughness = 0.7

[mesh]
subdivisions = 4

[lights]
background = "#000000"
"##;

    #[test]
    fn parses_sample_config() {
        let config = SceneConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.amplitude.initial, 3.0);
        assert_eq!(config.amplitude.step, 0.5);
        assert_eq!(config.amplitude.transition, Duration::from_millis(2500));
        assert_eq!(config.amplitude.debounce, Duration::from_millis(250));
        assert_eq!(config.amplitude.easing, EasingSetting::Smoothstep);
        assert_eq!(config.clock.time_scale, 2.5);
        assert_eq!(config.material.color, Color::new(0xff, 0x88, 0x00));
        assert_eq!(config.mesh.subdivisions, 4);
        assert_eq!(config.mesh.radius, 1.0);
        assert_eq!(config.lights.background, Color::new(0, 0, 0));
        assert_eq!(config.lights.ambient_color, Color::new(0x42, 0x55, 0xff));
    }

    #[test]
    fn empty_document_matches_reference_scene() {
        let config = SceneConfig::from_toml_str("").expect("defaults");
        assert_eq!(config.amplitude.initial, 4.0);
        assert_eq!(config.amplitude.min, 2.0);
        assert_eq!(config.amplitude.max, 5.0);
        assert_eq!(config.amplitude.transition, Duration::from_secs(5));
        assert_eq!(config.amplitude.debounce, Duration::from_millis(100));
        assert_eq!(config.amplitude.easing, EasingSetting::EaseOutCubic);
        assert_eq!(config.clock.time_scale, 5.0);
        assert_eq!(config.material.color.to_string(), "#526cff");
        assert_eq!(config.camera.fov, 75.0);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = SceneConfig::from_toml_str(
            r#"
[amplitude]
min = 5
max = 2
initial = 3
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_initial_outside_bounds() {
        let err = SceneConfig::from_toml_str("[amplitude]\ninitial = 9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_transition() {
        let err = SceneConfig::from_toml_str("[amplitude]\ntransition = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_oversized_duration() {
        let err = SceneConfig::from_toml_str("[amplitude]\ntransition = 1e30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = SceneConfig::from_toml_str("[amplitude]\ndebounce = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SceneConfig::from_toml_str("version = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_colour() {
        let err = SceneConfig::from_toml_str("[material]\ncolor = \"526cff\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_easing() {
        let err = SceneConfig::from_toml_str("[amplitude]\neasing = \"bounce\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn colour_conversion_is_linearised() {
        let white = Color::new(255, 255, 255).to_linear();
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-6));
        let mid = Color::new(128, 128, 128).to_linear()[0];
        assert!((mid - 0.2158).abs() < 1e-3);
    }
}
