//! 运行环境接口：设置最终生效的地方（音频、画面、显示）

use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::ShadowSettings;

/// 显示分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    /// 刷新率（Hz）
    pub refresh_rate: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32, refresh_rate: u32) -> Self {
        Self {
            width,
            height,
            refresh_rate,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} @ {}Hz", self.width, self.height, self.refresh_rate)
    }
}

/// 运行环境
///
/// 设置服务与宿主共享同一个环境实例，方法都取 `&self`，实现方自行处理内部可变性。
pub trait RuntimeEnvironment {
    fn set_master_volume(&self, volume: f32);

    fn set_quality_level(&self, level: i32);

    /// `-1` 表示不限制
    fn set_target_frame_rate(&self, fps: i32);

    fn set_vsync(&self, enabled: bool);

    fn set_anti_aliasing(&self, samples: i32);

    fn set_texture_quality(&self, level: i32);

    fn set_shadows(&self, shadows: ShadowSettings);

    fn set_resolution(&self, resolution: Resolution, fullscreen: bool);

    /// 亮度与伽马由后处理使用，没有后处理的环境可以忽略
    fn set_display_curve(&self, _brightness: f32, _gamma: f32) {}

    fn available_resolutions(&self) -> Vec<Resolution>;

    fn quality_level_names(&self) -> Vec<String>;
}
