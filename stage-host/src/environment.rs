//! 无头运行环境：记录被应用的设置值，不驱动真实设备

use std::cell::RefCell;

use stage_runtime::settings::{Resolution, RuntimeEnvironment, ShadowSettings};
use tracing::debug;

use crate::config::DisplayConfig;

/// 最近一次应用到环境的值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedSettings {
    pub master_volume: Option<f32>,
    pub quality_level: Option<i32>,
    pub target_frame_rate: Option<i32>,
    pub vsync: Option<bool>,
    pub anti_aliasing: Option<i32>,
    pub texture_quality: Option<i32>,
    pub shadows: Option<ShadowSettings>,
    pub resolution: Option<(Resolution, bool)>,
    pub display_curve: Option<(f32, f32)>,
}

/// 无头运行环境
#[derive(Debug)]
pub struct HeadlessEnvironment {
    resolutions: Vec<Resolution>,
    quality_levels: Vec<String>,
    applied: RefCell<AppliedSettings>,
}

impl HeadlessEnvironment {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            resolutions: display.resolutions.clone(),
            quality_levels: display.quality_levels.clone(),
            applied: RefCell::new(AppliedSettings::default()),
        }
    }

    pub fn applied(&self) -> AppliedSettings {
        self.applied.borrow().clone()
    }
}

impl Default for HeadlessEnvironment {
    fn default() -> Self {
        Self::new(&DisplayConfig::default())
    }
}

impl RuntimeEnvironment for HeadlessEnvironment {
    fn set_master_volume(&self, volume: f32) {
        debug!(volume, "主音量");
        self.applied.borrow_mut().master_volume = Some(volume);
    }

    fn set_quality_level(&self, level: i32) {
        let name = usize::try_from(level)
            .ok()
            .and_then(|i| self.quality_levels.get(i))
            .map_or("?", String::as_str);
        debug!(level, name, "画质级别");
        self.applied.borrow_mut().quality_level = Some(level);
    }

    fn set_target_frame_rate(&self, fps: i32) {
        debug!(fps, "帧率上限");
        self.applied.borrow_mut().target_frame_rate = Some(fps);
    }

    fn set_vsync(&self, enabled: bool) {
        debug!(enabled, "垂直同步");
        self.applied.borrow_mut().vsync = Some(enabled);
    }

    fn set_anti_aliasing(&self, samples: i32) {
        debug!(samples, "抗锯齿");
        self.applied.borrow_mut().anti_aliasing = Some(samples);
    }

    fn set_texture_quality(&self, level: i32) {
        debug!(level, "纹理质量");
        self.applied.borrow_mut().texture_quality = Some(level);
    }

    fn set_shadows(&self, shadows: ShadowSettings) {
        debug!(mode = ?shadows.mode, distance = shadows.distance, "阴影");
        self.applied.borrow_mut().shadows = Some(shadows);
    }

    fn set_resolution(&self, resolution: Resolution, fullscreen: bool) {
        debug!(%resolution, fullscreen, "分辨率");
        self.applied.borrow_mut().resolution = Some((resolution, fullscreen));
    }

    fn set_display_curve(&self, brightness: f32, gamma: f32) {
        debug!(brightness, gamma, "亮度 / 伽马");
        self.applied.borrow_mut().display_curve = Some((brightness, gamma));
    }

    fn available_resolutions(&self) -> Vec<Resolution> {
        self.resolutions.clone()
    }

    fn quality_level_names(&self) -> Vec<String> {
        self.quality_levels.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_runtime::settings::ShadowQuality;

    #[test]
    fn test_records_applied_values() {
        let env = HeadlessEnvironment::default();
        env.set_master_volume(0.5);
        env.set_shadows(ShadowQuality::High.backend_settings());
        env.set_resolution(Resolution::new(1920, 1080, 60), false);

        let applied = env.applied();
        assert_eq!(applied.master_volume, Some(0.5));
        assert_eq!(applied.shadows.map(|s| s.distance), Some(80.0));
        assert_eq!(applied.resolution.map(|(r, _)| r.width), Some(1920));
        assert_eq!(applied.vsync, None);
    }

    #[test]
    fn test_pass_through_lists() {
        let env = HeadlessEnvironment::default();
        assert_eq!(env.available_resolutions().len(), 4);
        assert_eq!(env.quality_level_names()[0], "Very Low");
    }
}
