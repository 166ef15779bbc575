//! 内核配置

use crate::construct::ArcSide;
use crate::properties::Style;
use serde::{Deserialize, Serialize};

/// 内核可调参数
///
/// 所有字段都有默认值，JSON 配置中缺失的字段取默认。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// 每个滚轮格的缩放倍率
    pub zoom_base: f64,
    pub max_zoom_notches: i32,
    /// 点选容差（设备像素）
    pub hit_tolerance_px: f64,
    /// 贝塞尔展平容差（设备像素）
    pub flatness_tolerance_px: f64,
    /// 期望的网格间距（设备像素）
    pub grid_target_spacing_px: f64,
    pub tick_length_px: f64,
    /// 虚线图案缩放
    pub dash_scale: f64,
    pub default_style: Style,
    /// 交互构造正多边形时的边数
    pub polygon_sides: usize,
    /// 正多边形边数上限
    pub max_polygon_sides: usize,
    /// 交互构造圆角多段线时的圆角半径
    pub rounding_radius: f64,
    pub arc_side: ArcSide,
    /// 交互构造矩形时的旋转角（弧度）
    pub rectangle_rotation: f64,
    /// 标注文本的小数位数
    pub label_precision: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            zoom_base: 1.15,
            max_zoom_notches: 60,
            hit_tolerance_px: 5.0,
            flatness_tolerance_px: 0.25,
            grid_target_spacing_px: 50.0,
            tick_length_px: 4.0,
            dash_scale: 1.0,
            default_style: Style::default(),
            polygon_sides: 6,
            max_polygon_sides: 1024,
            rounding_radius: 10.0,
            arc_side: ArcSide::Left,
            rectangle_rotation: 0.0,
            label_precision: 2,
        }
    }
}
