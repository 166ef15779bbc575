//! 视图变换
//!
//! 逻辑坐标 → 设备坐标：
//!
//! ```text
//! device = pan + R(rotation) · (zoom · (x, -y))
//! ```
//!
//! 设备坐标 Y 轴向下，所以先翻转 Y。缩放系数由累计的滚轮格数决定：
//! `zoom = zoom_base ^ notches`，格数是整数，缩放回相同格数时系数精确恢复。
//! 视图变换只在渲染时使用，从不修改存储的几何。

use crate::config::KernelConfig;
use crate::math::{normalize_angle, Point2, Vector2};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 视口尺寸（设备像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// 四个角点（设备坐标）
    pub fn corners(&self) -> [Point2; 4] {
        let (w, h) = (self.width as f64, self.height as f64);
        [
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }
}

/// 视图变换的可哈希快照，用作光栅缓存键的一部分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pan: (u64, u64),
    zoom_notches: i32,
    zoom_base: u64,
    rotation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// 平移（设备像素）
    pub pan: Vector2,
    /// 累计滚轮格数
    zoom_notches: i32,
    zoom_base: f64,
    max_zoom_notches: i32,
    /// 旋转角，[0, 2π)
    rotation: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::from_config(&KernelConfig::default())
    }
}

impl ViewTransform {
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            pan: Vector2::zeros(),
            zoom_notches: 0,
            zoom_base: config.zoom_base,
            max_zoom_notches: config.max_zoom_notches,
            rotation: 0.0,
        }
    }

    /// 以视口中心为逻辑原点
    pub fn centered(config: &KernelConfig, viewport: &Viewport) -> Self {
        let mut view = Self::from_config(config);
        view.pan = viewport.center().coords;
        view
    }

    pub fn zoom(&self) -> f64 {
        self.zoom_base.powi(self.zoom_notches)
    }

    pub fn zoom_notches(&self) -> i32 {
        self.zoom_notches
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn cache_key(&self) -> ViewKey {
        ViewKey {
            pan: (self.pan.x.to_bits(), self.pan.y.to_bits()),
            zoom_notches: self.zoom_notches,
            zoom_base: self.zoom_base.to_bits(),
            rotation: self.rotation.to_bits(),
        }
    }

    pub fn to_device(&self, logical: &Point2) -> Point2 {
        let z = self.zoom();
        let (sin, cos) = self.rotation.sin_cos();
        let (x, y) = (logical.x * z, -logical.y * z);
        Point2::new(
            self.pan.x + x * cos - y * sin,
            self.pan.y + x * sin + y * cos,
        )
    }

    pub fn to_logical(&self, device: &Point2) -> Point2 {
        let z = self.zoom();
        let (sin, cos) = self.rotation.sin_cos();
        let (dx, dy) = (device.x - self.pan.x, device.y - self.pan.y);
        let x = dx * cos + dy * sin;
        let y = -dx * sin + dy * cos;
        Point2::new(x / z, -y / z)
    }

    /// 逻辑长度 → 设备像素长度
    pub fn scale_length(&self, length: f64) -> f64 {
        length * self.zoom()
    }

    /// 逻辑角 → 设备角（设备坐标 Y 向下，atan2 意义下）
    pub fn device_angle(&self, logical_angle: f64) -> f64 {
        normalize_angle(self.rotation - logical_angle)
    }

    /// 设备角 → 逻辑角
    pub fn logical_angle(&self, device_angle: f64) -> f64 {
        normalize_angle(self.rotation - device_angle)
    }

    /// 齐次坐标矩阵，与 [`Self::to_device`] 等价
    pub fn to_matrix(&self) -> Matrix3<f64> {
        let z = self.zoom();
        let (sin, cos) = self.rotation.sin_cos();
        Matrix3::new(
            z * cos, z * sin, self.pan.x,
            z * sin, -z * cos, self.pan.y,
            0.0, 0.0, 1.0,
        )
    }

    pub fn pan_by(&mut self, delta: Vector2) {
        self.pan += delta;
    }

    /// 按滚轮格数缩放；超出 ±max_zoom_notches 时截断
    pub fn zoom_by(&mut self, notches: i32) {
        let max = self.max_zoom_notches;
        self.zoom_notches = self.zoom_notches.saturating_add(notches).clamp(-max, max);
        debug!("zoom notches = {}, factor = {}", self.zoom_notches, self.zoom());
    }

    /// 以设备点 `anchor` 为中心缩放，光标下的逻辑点保持不动
    pub fn zoom_at(&mut self, notches: i32, anchor: Point2) {
        let fixed = self.to_logical(&anchor);
        self.zoom_by(notches);
        let moved = self.to_device(&fixed);
        self.pan += anchor - moved;
    }

    pub fn rotate_by(&mut self, delta: f64) {
        self.rotation = normalize_angle(self.rotation + delta);
        debug!("view rotation = {}", self.rotation);
    }

    /// 绕设备点 `anchor` 旋转视图
    pub fn rotate_at(&mut self, delta: f64, anchor: Point2) {
        let fixed = self.to_logical(&anchor);
        self.rotate_by(delta);
        let moved = self.to_device(&fixed);
        self.pan += anchor - moved;
    }

    /// 视口覆盖的逻辑坐标范围
    pub fn visible_bounds(&self, viewport: &Viewport) -> crate::math::BoundingBox2 {
        crate::math::BoundingBox2::from_points(viewport.corners().map(|c| self.to_logical(&c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: Point2, b: Point2) -> bool {
        let scale = 1.0_f64.max(a.coords.norm()).max(b.coords.norm());
        (a - b).norm() <= 1e-9 * scale
    }

    #[test]
    fn test_y_axis_flipped() {
        let view = ViewTransform::centered(&KernelConfig::default(), &Viewport::new(200, 100));
        let d = view.to_device(&Point2::new(10.0, 10.0));
        assert_eq!(d, Point2::new(110.0, 40.0));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let mut view = ViewTransform::default();
        view.rotate_by(FRAC_PI_2);
        // 逻辑 +X 在屏幕上指向下方
        let d = view.to_device(&Point2::new(1.0, 0.0));
        assert!(close(d, Point2::new(0.0, 1.0)));
        assert!((view.device_angle(0.0) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_matches_to_device() {
        let mut view = ViewTransform::default();
        view.pan_by(Vector2::new(30.0, -12.0));
        view.zoom_by(3);
        view.rotate_by(0.7);
        let p = Point2::new(4.0, -9.0);
        let m = view.to_matrix().transform_point(&p);
        assert!(close(m, view.to_device(&p)));
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut view = ViewTransform::default();
        view.rotate_by(0.3);
        let anchor = Point2::new(120.0, 80.0);
        let before = view.to_logical(&anchor);
        view.zoom_at(4, anchor);
        assert!(close(view.to_logical(&anchor), before));
    }

    #[test]
    fn test_zoom_clamped() {
        let mut view = ViewTransform::default();
        view.zoom_by(1000);
        assert_eq!(view.zoom_notches(), 60);
        assert!(view.zoom() > 0.0);
    }

    #[test]
    fn test_zoom_restore_breaks_at_limit() {
        let mut view = ViewTransform::default();
        view.zoom_by(55);
        view.zoom_by(10);
        assert_eq!(view.zoom_notches(), 60);
        // 截断掉的 5 格不会被反向缩放找回
        view.zoom_by(-10);
        assert_eq!(view.zoom_notches(), 50);

        view.zoom_by(-200);
        assert_eq!(view.zoom_notches(), -60);
        view.zoom_by(i32::MAX);
        assert_eq!(view.zoom_notches(), 60);
    }

    proptest! {
        #[test]
        fn zoom_then_unzoom_restores(start in -20i32..20, n in -20i32..20) {
            let mut view = ViewTransform::default();
            view.zoom_by(start);
            let before = view.zoom();
            view.zoom_by(n);
            view.zoom_by(-n);
            prop_assert_eq!(view.zoom(), before);
        }

        #[test]
        fn device_logical_round_trip(
            px in -1.0e4f64..1.0e4,
            py in -1.0e4f64..1.0e4,
            pan_x in -1.0e3f64..1.0e3,
            pan_y in -1.0e3f64..1.0e3,
            notches in -30i32..30,
            rotation in 0.0f64..std::f64::consts::TAU,
        ) {
            let mut view = ViewTransform::default();
            view.pan_by(Vector2::new(pan_x, pan_y));
            view.zoom_by(notches);
            view.rotate_by(rotation);
            let p = Point2::new(px, py);
            let back = view.to_device(&view.to_logical(&p));
            prop_assert!(close(back, p), "{:?} -> {:?}", p, back);
        }
    }
}
