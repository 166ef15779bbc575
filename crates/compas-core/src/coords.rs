//! 输入坐标约定：笛卡尔 / 极坐标
//!
//! 极坐标点以 `(r, θ)` 形式存放在 [`Point2`] 的 `x`/`y` 分量中，θ 为弧度，
//! 相对于 `origin` 度量。

use crate::math::{normalize_angle, Point2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CoordinateMode {
    #[default]
    Cartesian,
    Polar,
}

/// 极坐标 → 笛卡尔
pub fn polar_to_cartesian(origin: Point2, radius: f64, angle: f64) -> Point2 {
    Point2::new(origin.x + radius * angle.cos(), origin.y + radius * angle.sin())
}

/// 笛卡尔 → 极坐标，返回 `(r, θ)`，θ ∈ [0, 2π)
pub fn cartesian_to_polar(origin: Point2, point: Point2) -> (f64, f64) {
    let v = point - origin;
    (v.norm(), normalize_angle(v.y.atan2(v.x)))
}

/// 在两种坐标约定之间转换
pub fn convert(point: Point2, from: CoordinateMode, to: CoordinateMode, origin: Point2) -> Point2 {
    match (from, to) {
        (CoordinateMode::Cartesian, CoordinateMode::Cartesian)
        | (CoordinateMode::Polar, CoordinateMode::Polar) => point,
        (CoordinateMode::Polar, CoordinateMode::Cartesian) => {
            polar_to_cartesian(origin, point.x, point.y)
        }
        (CoordinateMode::Cartesian, CoordinateMode::Polar) => {
            let (r, theta) = cartesian_to_polar(origin, point);
            Point2::new(r, theta)
        }
    }
}
