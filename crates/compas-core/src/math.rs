//! 数学基础类型
//!
//! 基于 nalgebra 的二维点/向量别名，以及包围盒和角度工具函数。

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// 几何比较容差
pub const EPSILON: f64 = 1e-9;

/// 将角度归一化到 [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid 对极小的负数可能返回 TAU 本身
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// 从 `from` 逆时针转到 `to` 的角度，范围 [0, 2π)
pub fn ccw_delta(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// 以 `center` 为中心把点旋转 `angle` 弧度
pub fn rotate_point(point: Point2, center: Point2, angle: f64) -> Point2 {
    let (sin, cos) = angle.sin_cos();
    let v = point - center;
    Point2::new(
        center.x + v.x * cos - v.y * sin,
        center.y + v.x * sin + v.y * cos,
    )
}

/// 两点中点
pub fn midpoint(a: Point2, b: Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// 点到线段的距离
pub fn distance_to_segment(point: &Point2, start: &Point2, end: &Point2) -> f64 {
    let v = end - start;
    let w = point - start;

    let c1 = w.dot(&v);
    if c1 <= 0.0 {
        return (point - start).norm();
    }

    let c2 = v.dot(&v);
    if c2 <= c1 {
        return (point - end).norm();
    }

    let b = c1 / c2;
    let pb = start + v * b;
    (point - pb).norm()
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 空包围盒（任何点加入后即变为有效）
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::MAX, f64::MAX),
            max: Point2::new(f64::MIN, f64::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(
            Point2::new(self.min.x - margin, self.min.y - margin),
            Point2::new(self.max.x + margin, self.max.y + margin),
        )
    }

    pub fn contains(&self, point: &Point2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &BoundingBox2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}
