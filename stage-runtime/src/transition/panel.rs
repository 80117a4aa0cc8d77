//! # Panel 模块
//!
//! 面板宿主接口。过渡控制器只通过这些接口修改面板：
//!
//! - `CanvasGroup`: 整体透明度、可交互、是否拦截点击
//! - `Transformable`: 布局变换（缩放、锚点位置）
//! - `Focusable`: 显示完成后获得键盘焦点的元素

use std::cell::Cell;
use std::rc::Rc;

use crate::error::FocusError;
use crate::tween::target::{Fadeable, TransformCell, Transformable};

/// 面板的透明度控制器
pub trait CanvasGroup: Fadeable {
    fn interactable(&self) -> bool;
    fn set_interactable(&self, value: bool);
    fn blocks_raycasts(&self) -> bool;
    fn set_blocks_raycasts(&self, value: bool);
}

/// 可获得焦点的 UI 元素
pub trait Focusable {
    fn focus(&self) -> Result<(), FocusError>;
}

/// 面板宿主
pub trait PanelHost {
    fn name(&self) -> &str;

    /// 透明度控制器，缺失时控制器构造失败
    fn canvas_group(&self) -> Option<Rc<dyn CanvasGroup>>;

    /// 布局变换，缺失时控制器构造失败
    fn rect_transform(&self) -> Option<Rc<dyn Transformable>>;

    fn set_active(&self, active: bool);

    fn is_active(&self) -> bool;
}

/// 内存中的透明度控制器
#[derive(Debug)]
pub struct GroupCell {
    alpha: Cell<f32>,
    interactable: Cell<bool>,
    blocks_raycasts: Cell<bool>,
}

impl Default for GroupCell {
    fn default() -> Self {
        Self {
            alpha: Cell::new(1.0),
            interactable: Cell::new(true),
            blocks_raycasts: Cell::new(true),
        }
    }
}

impl Fadeable for GroupCell {
    fn alpha(&self) -> f32 {
        self.alpha.get()
    }

    fn set_alpha(&self, value: f32) {
        self.alpha.set(value);
    }
}

impl CanvasGroup for GroupCell {
    fn interactable(&self) -> bool {
        self.interactable.get()
    }

    fn set_interactable(&self, value: bool) {
        self.interactable.set(value);
    }

    fn blocks_raycasts(&self) -> bool {
        self.blocks_raycasts.get()
    }

    fn set_blocks_raycasts(&self, value: bool) {
        self.blocks_raycasts.set(value);
    }
}

/// 内存中的面板
///
/// 无头宿主和测试使用；组件可以单独去掉以模拟配置错误。
#[derive(Debug)]
pub struct PanelElement {
    name: String,
    group: Option<Rc<GroupCell>>,
    rect: Option<Rc<TransformCell>>,
    active: Cell<bool>,
}

impl PanelElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: Some(Rc::new(GroupCell::default())),
            rect: Some(Rc::new(TransformCell::default())),
            active: Cell::new(true),
        }
    }

    pub fn without_canvas_group(mut self) -> Self {
        self.group = None;
        self
    }

    pub fn without_rect_transform(mut self) -> Self {
        self.rect = None;
        self
    }

    pub fn group(&self) -> Option<&GroupCell> {
        self.group.as_deref()
    }

    pub fn rect(&self) -> Option<&TransformCell> {
        self.rect.as_deref()
    }
}

impl PanelHost for PanelElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn canvas_group(&self) -> Option<Rc<dyn CanvasGroup>> {
        self.group.clone().map(|g| g as Rc<dyn CanvasGroup>)
    }

    fn rect_transform(&self) -> Option<Rc<dyn Transformable>> {
        self.rect.clone().map(|r| r as Rc<dyn Transformable>)
    }

    fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}
