//! 设置记录与取值范围
//!
//! 所有数值字段在写入时钳制到声明的范围；`validate()` 用于检查作者配置的默认值。

use serde::{Deserialize, Serialize};

use super::store::{StoreSnapshot, StoreValue};
use crate::error::SettingsError;

/// 持久化键名
pub mod keys {
    pub const MASTER_VOLUME: &str = "settings_masterVolume";
    pub const MUSIC_VOLUME: &str = "settings_musicVolume";
    pub const SFX_VOLUME: &str = "settings_sfxVolume";
    pub const VOICE_VOLUME: &str = "settings_voiceVolume";
    pub const AMBIENT_VOLUME: &str = "settings_ambientVolume";
    pub const MUTED: &str = "settings_muted";

    pub const QUALITY_LEVEL: &str = "settings_qualityLevel";
    pub const FULLSCREEN: &str = "settings_fullscreen";
    pub const RESOLUTION_INDEX: &str = "settings_resolutionIndex";
    pub const TARGET_FRAME_RATE: &str = "settings_targetFrameRate";
    pub const VSYNC: &str = "settings_vsync";
    pub const ANTI_ALIASING: &str = "settings_antiAliasing";
    pub const SHADOW_QUALITY: &str = "settings_shadowQuality";
    pub const TEXTURE_QUALITY: &str = "settings_textureQuality";
    pub const BRIGHTNESS: &str = "settings_brightness";
    pub const GAMMA: &str = "settings_gamma";

    /// 全部键名
    pub const ALL: [&str; 16] = [
        MASTER_VOLUME,
        MUSIC_VOLUME,
        SFX_VOLUME,
        VOICE_VOLUME,
        AMBIENT_VOLUME,
        MUTED,
        QUALITY_LEVEL,
        FULLSCREEN,
        RESOLUTION_INDEX,
        TARGET_FRAME_RATE,
        VSYNC,
        ANTI_ALIASING,
        SHADOW_QUALITY,
        TEXTURE_QUALITY,
        BRIGHTNESS,
        GAMMA,
    ];
}

/// 有效的抗锯齿级别
pub const ANTI_ALIASING_LEVELS: [i32; 4] = [0, 2, 4, 8];

/// 帧率上限的有效范围；`-1` 表示不限制
pub const FRAME_RATE_RANGE: (i32, i32) = (30, 300);

pub const UNLIMITED_FRAME_RATE: i32 = -1;

pub fn clamp_volume(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn clamp_brightness(value: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(0.0, 2.0)
    }
}

pub fn clamp_gamma(value: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(0.5, 2.0)
    }
}

pub fn clamp_texture_quality(value: i32) -> i32 {
    value.clamp(0, 3)
}

/// `<= 0` 视为不限制，其余钳制到 30 - 300
pub fn clamp_frame_rate(value: i32) -> i32 {
    if value <= 0 {
        UNLIMITED_FRAME_RATE
    } else {
        value.clamp(FRAME_RATE_RANGE.0, FRAME_RATE_RANGE.1)
    }
}

/// 量化到最近的有效级别，距离相同时取较高的级别
///
/// 0→0, 1→2, 3→4, 5→4, 6→8, 9→8
pub fn quantize_anti_aliasing(value: i32) -> i32 {
    let value = value.clamp(0, 8);
    ANTI_ALIASING_LEVELS
        .iter()
        .copied()
        .min_by_key(|level| ((level - value).abs(), std::cmp::Reverse(*level)))
        .unwrap_or(0)
}

/// 阴影质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowQuality {
    Off,
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl ShadowQuality {
    pub const ALL: [ShadowQuality; 5] = [
        Self::Off,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Ultra,
    ];

    pub fn as_index(&self) -> i32 {
        *self as i32
    }

    /// 越界的索引钳制到最近的一端
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.clamp(0, 4) as usize]
    }

    /// 映射到后端的阴影参数
    pub fn backend_settings(&self) -> ShadowSettings {
        let (mode, resolution, distance) = match self {
            Self::Off => (ShadowMode::Disabled, ShadowResolution::Low, 0.0),
            Self::Low => (ShadowMode::HardOnly, ShadowResolution::Low, 20.0),
            Self::Medium => (ShadowMode::All, ShadowResolution::Medium, 40.0),
            Self::High => (ShadowMode::All, ShadowResolution::High, 80.0),
            Self::Ultra => (ShadowMode::All, ShadowResolution::VeryHigh, 150.0),
        };
        ShadowSettings {
            mode,
            resolution,
            distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMode {
    Disabled,
    HardOnly,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowResolution {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// 后端阴影参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub mode: ShadowMode,
    pub resolution: ShadowResolution,
    /// 阴影距离（世界单位）
    pub distance: f32,
}

/// 声音设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub voice_volume: f32,
    pub ambient_volume: f32,
    pub muted: bool,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_volume: 0.8,
            sfx_volume: 1.0,
            voice_volume: 1.0,
            ambient_volume: 0.7,
            muted: false,
        }
    }
}

impl SoundSettings {
    pub fn clamped(self) -> Self {
        Self {
            master_volume: clamp_volume(self.master_volume),
            music_volume: clamp_volume(self.music_volume),
            sfx_volume: clamp_volume(self.sfx_volume),
            voice_volume: clamp_volume(self.voice_volume),
            ambient_volume: clamp_volume(self.ambient_volume),
            muted: self.muted,
        }
    }

    /// 实际输出的主音量（静音时为 0）
    pub fn effective_master_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }
}

/// 画面设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub quality_level: i32,
    pub fullscreen: bool,
    pub resolution_index: i32,
    /// `-1` 表示不限制
    pub target_frame_rate: i32,
    pub vsync: bool,
    pub anti_aliasing: i32,
    pub shadow_quality: ShadowQuality,
    pub texture_quality: i32,
    pub brightness: f32,
    pub gamma: f32,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            quality_level: 2,
            fullscreen: true,
            resolution_index: 0,
            target_frame_rate: 60,
            vsync: true,
            anti_aliasing: 2,
            shadow_quality: ShadowQuality::default(),
            texture_quality: 0,
            brightness: 1.0,
            gamma: 1.0,
        }
    }
}

impl GraphicsSettings {
    /// 钳制与环境无关的字段
    ///
    /// 画质级别和分辨率索引的上限取决于运行环境，由设置服务在初始化时处理。
    pub fn clamped(self) -> Self {
        Self {
            quality_level: self.quality_level.max(0),
            resolution_index: self.resolution_index.max(0),
            target_frame_rate: clamp_frame_rate(self.target_frame_rate),
            anti_aliasing: quantize_anti_aliasing(self.anti_aliasing),
            texture_quality: clamp_texture_quality(self.texture_quality),
            brightness: clamp_brightness(self.brightness),
            gamma: clamp_gamma(self.gamma),
            ..self
        }
    }
}

/// 完整的设置记录
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsRecord {
    pub sound: SoundSettings,
    pub graphics: GraphicsSettings,
}

impl SettingsRecord {
    pub fn clamped(self) -> Self {
        Self {
            sound: self.sound.clamped(),
            graphics: self.graphics.clamped(),
        }
    }

    /// 检查每个字段是否在声明的范围内，返回第一个越界的字段
    pub fn validate(&self) -> Result<(), SettingsError> {
        match self.problems().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 所有越界的字段
    pub fn problems(&self) -> Vec<SettingsError> {
        let s = &self.sound;
        let g = &self.graphics;
        let volume = "0.0 - 1.0";
        [
            check_f32(keys::MASTER_VOLUME, s.master_volume, clamp_volume, volume),
            check_f32(keys::MUSIC_VOLUME, s.music_volume, clamp_volume, volume),
            check_f32(keys::SFX_VOLUME, s.sfx_volume, clamp_volume, volume),
            check_f32(keys::VOICE_VOLUME, s.voice_volume, clamp_volume, volume),
            check_f32(keys::AMBIENT_VOLUME, s.ambient_volume, clamp_volume, volume),
            check_i32(keys::QUALITY_LEVEL, g.quality_level, |v| v.max(0), ">= 0"),
            check_i32(keys::RESOLUTION_INDEX, g.resolution_index, |v| v.max(0), ">= 0"),
            check_i32(
                keys::TARGET_FRAME_RATE,
                g.target_frame_rate,
                clamp_frame_rate,
                "-1 或 30 - 300",
            ),
            check_i32(
                keys::ANTI_ALIASING,
                g.anti_aliasing,
                quantize_anti_aliasing,
                "0, 2, 4, 8",
            ),
            check_i32(
                keys::TEXTURE_QUALITY,
                g.texture_quality,
                clamp_texture_quality,
                "0 - 3",
            ),
            check_f32(keys::BRIGHTNESS, g.brightness, clamp_brightness, "0.0 - 2.0"),
            check_f32(keys::GAMMA, g.gamma, clamp_gamma, "0.5 - 2.0"),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }
}

impl SettingsRecord {
    /// 从存储快照读取，缺失或类型不符的键取 `fallback` 中的值
    ///
    /// 读出的值不做钳制，调用方决定是钳制还是校验。
    pub fn from_snapshot(snapshot: &StoreSnapshot, fallback: &SettingsRecord) -> Self {
        let s = &fallback.sound;
        let g = &fallback.graphics;
        let f = |key, default| snapshot.get_f32(key).unwrap_or(default);
        let i = |key, default| snapshot.get_i32(key).unwrap_or(default);
        let b = |key, default| snapshot.get_bool(key).unwrap_or(default);

        Self {
            sound: SoundSettings {
                master_volume: f(keys::MASTER_VOLUME, s.master_volume),
                music_volume: f(keys::MUSIC_VOLUME, s.music_volume),
                sfx_volume: f(keys::SFX_VOLUME, s.sfx_volume),
                voice_volume: f(keys::VOICE_VOLUME, s.voice_volume),
                ambient_volume: f(keys::AMBIENT_VOLUME, s.ambient_volume),
                muted: b(keys::MUTED, s.muted),
            },
            graphics: GraphicsSettings {
                quality_level: i(keys::QUALITY_LEVEL, g.quality_level),
                fullscreen: b(keys::FULLSCREEN, g.fullscreen),
                resolution_index: i(keys::RESOLUTION_INDEX, g.resolution_index),
                target_frame_rate: i(keys::TARGET_FRAME_RATE, g.target_frame_rate),
                vsync: b(keys::VSYNC, g.vsync),
                anti_aliasing: i(keys::ANTI_ALIASING, g.anti_aliasing),
                shadow_quality: snapshot
                    .get_i32(keys::SHADOW_QUALITY)
                    .map_or(g.shadow_quality, ShadowQuality::from_index),
                texture_quality: i(keys::TEXTURE_QUALITY, g.texture_quality),
                brightness: f(keys::BRIGHTNESS, g.brightness),
                gamma: f(keys::GAMMA, g.gamma),
            },
        }
    }

    /// 写入存储快照
    pub fn write_snapshot(&self, snapshot: &mut StoreSnapshot) {
        let s = &self.sound;
        let g = &self.graphics;
        let floats = [
            (keys::MASTER_VOLUME, s.master_volume),
            (keys::MUSIC_VOLUME, s.music_volume),
            (keys::SFX_VOLUME, s.sfx_volume),
            (keys::VOICE_VOLUME, s.voice_volume),
            (keys::AMBIENT_VOLUME, s.ambient_volume),
            (keys::BRIGHTNESS, g.brightness),
            (keys::GAMMA, g.gamma),
        ];
        let ints = [
            (keys::QUALITY_LEVEL, g.quality_level),
            (keys::RESOLUTION_INDEX, g.resolution_index),
            (keys::TARGET_FRAME_RATE, g.target_frame_rate),
            (keys::ANTI_ALIASING, g.anti_aliasing),
            (keys::SHADOW_QUALITY, g.shadow_quality.as_index()),
            (keys::TEXTURE_QUALITY, g.texture_quality),
        ];
        let bools = [
            (keys::MUTED, s.muted),
            (keys::FULLSCREEN, g.fullscreen),
            (keys::VSYNC, g.vsync),
        ];

        for (key, value) in floats {
            snapshot.set(key, StoreValue::Float(value));
        }
        for (key, value) in ints {
            snapshot.set(key, StoreValue::Int(value));
        }
        for (key, value) in bools {
            snapshot.set(key, StoreValue::Bool(value));
        }
    }
}

fn check_f32(
    field: &'static str,
    value: f32,
    clamp: fn(f32) -> f32,
    range: &'static str,
) -> Result<(), SettingsError> {
    if clamp(value) == value {
        Ok(())
    } else {
        Err(SettingsError::InvalidDefaults {
            field,
            value: value.to_string(),
            range,
        })
    }
}

fn check_i32(
    field: &'static str,
    value: i32,
    clamp: fn(i32) -> i32,
    range: &'static str,
) -> Result<(), SettingsError> {
    if clamp(value) == value {
        Ok(())
    } else {
        Err(SettingsError::InvalidDefaults {
            field,
            value: value.to_string(),
            range,
        })
    }
}

/// 作者配置的默认值，与 `SettingsRecord` 结构相同
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsDefaults(SettingsRecord);

impl SettingsDefaults {
    pub fn new(record: SettingsRecord) -> Self {
        Self(record)
    }

    pub fn record(&self) -> &SettingsRecord {
        &self.0
    }

    pub fn sound(&self) -> &SoundSettings {
        &self.0.sound
    }

    pub fn graphics(&self) -> &GraphicsSettings {
        &self.0.graphics
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.0.validate()
    }
}

impl From<SettingsRecord> for SettingsDefaults {
    fn from(record: SettingsRecord) -> Self {
        Self(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anti_aliasing_quantization() {
        let quantized: Vec<i32> = [-3, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 64]
            .into_iter()
            .map(quantize_anti_aliasing)
            .collect();
        assert_eq!(quantized, vec![0, 0, 2, 2, 4, 4, 4, 8, 8, 8, 8, 8]);
    }

    #[test]
    fn test_frame_rate_clamp() {
        assert_eq!(clamp_frame_rate(-5), -1);
        assert_eq!(clamp_frame_rate(0), -1);
        assert_eq!(clamp_frame_rate(10), 30);
        assert_eq!(clamp_frame_rate(144), 144);
        assert_eq!(clamp_frame_rate(1000), 300);
    }

    #[test]
    fn test_float_clamps() {
        assert_eq!(clamp_volume(1.5), 1.0);
        assert_eq!(clamp_volume(-0.1), 0.0);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
        assert_eq!(clamp_brightness(3.0), 2.0);
        assert_eq!(clamp_gamma(0.1), 0.5);
    }

    #[test]
    fn test_shadow_table() {
        assert_eq!(ShadowQuality::Off.backend_settings().mode, ShadowMode::Disabled);
        assert_eq!(
            ShadowQuality::Ultra.backend_settings().resolution,
            ShadowResolution::VeryHigh
        );
        assert_eq!(ShadowQuality::from_index(7), ShadowQuality::Ultra);
        assert_eq!(ShadowQuality::from_index(-1), ShadowQuality::Off);
        assert_eq!(ShadowQuality::High.as_index(), 3);
    }

    #[test]
    fn test_problems_lists_every_field() {
        let mut record = SettingsRecord::default();
        record.sound.music_volume = 1.5;
        record.graphics.anti_aliasing = 3;
        record.graphics.gamma = 0.1;

        let fields: Vec<_> = record
            .problems()
            .into_iter()
            .map(|e| match e {
                SettingsError::InvalidDefaults { field, .. } => field,
                other => panic!("unexpected error: {other}"),
            })
            .collect();
        assert_eq!(fields, [keys::MUSIC_VOLUME, keys::ANTI_ALIASING, keys::GAMMA]);
        assert!(SettingsRecord::default().problems().is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(SettingsRecord::default().validate().is_ok());

        let mut record = SettingsRecord::default();
        record.graphics.anti_aliasing = 3;
        let err = record.validate().unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidDefaults {
                field: keys::ANTI_ALIASING,
                ..
            }
        ));

        let mut record = SettingsRecord::default();
        record.sound.music_volume = 1.2;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_clamped_record() {
        let mut record = SettingsRecord::default();
        record.graphics.brightness = 3.0;
        record.graphics.anti_aliasing = 5;
        record.sound.sfx_volume = -1.0;
        let clamped = record.clamped();
        assert_eq!(clamped.graphics.brightness, 2.0);
        assert_eq!(clamped.graphics.anti_aliasing, 4);
        assert_eq!(clamped.sound.sfx_volume, 0.0);
        assert!(clamped.validate().is_ok());
    }

    #[test]
    fn test_snapshot_fallback_and_write() {
        let mut snapshot = StoreSnapshot::new();
        snapshot.set(keys::MASTER_VOLUME, StoreValue::Float(0.25));
        snapshot.set(keys::SHADOW_QUALITY, StoreValue::Int(4));
        // 类型不符时使用默认值
        snapshot.set(keys::VSYNC, StoreValue::Float(1.0));

        let fallback = SettingsRecord::default();
        let record = SettingsRecord::from_snapshot(&snapshot, &fallback);
        assert_eq!(record.sound.master_volume, 0.25);
        assert_eq!(record.graphics.shadow_quality, ShadowQuality::Ultra);
        assert_eq!(record.graphics.vsync, fallback.graphics.vsync);

        let mut written = StoreSnapshot::new();
        record.write_snapshot(&mut written);
        assert_eq!(written.len(), keys::ALL.len());
        assert_eq!(SettingsRecord::from_snapshot(&written, &SettingsRecord::default()), record);
    }

    #[test]
    fn test_defaults_from_partial_json() {
        let defaults: SettingsDefaults =
            serde_json::from_str(r#"{ "sound": { "master_volume": 0.5 } }"#).unwrap();
        assert_eq!(defaults.sound().master_volume, 0.5);
        assert_eq!(defaults.graphics(), &GraphicsSettings::default());
    }
}
