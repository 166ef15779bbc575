//! 几何图元定义
//!
//! 支持的规范化图元：
//! - 线段 (Segment)
//! - 圆 (Circle)
//! - 圆弧 (Arc)
//! - 样条曲线 (Spline)：贝塞尔 / 圆角多段线
//! - 多边形 (Polygon)：自由 / 外接 / 内切
//! - 矩形 (Rectangle)
//!
//! 这里只保存“规范参数”，与构造方式无关。构造方式到规范参数的转换见
//! [`crate::construct`]。

use crate::construct;
use crate::math::{
    ccw_delta, distance_to_segment, midpoint, normalize_angle, rotate_point, BoundingBox2,
    Point2, EPSILON,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// 图元种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Segment,
    Circle,
    Arc,
    Spline,
    Polygon,
    Rectangle,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Segment => "Segment",
            ShapeKind::Circle => "Circle",
            ShapeKind::Arc => "Arc",
            ShapeKind::Spline => "Spline",
            ShapeKind::Polygon => "Polygon",
            ShapeKind::Rectangle => "Rectangle",
        }
    }
}

/// 几何类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Segment(Segment),
    Circle(Circle),
    Arc(Arc),
    Spline(Spline),
    Polygon(Polygon),
    Rectangle(Rectangle),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Segment(_) => ShapeKind::Segment,
            Geometry::Circle(_) => ShapeKind::Circle,
            Geometry::Arc(_) => ShapeKind::Arc,
            Geometry::Spline(_) => ShapeKind::Spline,
            Geometry::Polygon(_) => ShapeKind::Polygon,
            Geometry::Rectangle(_) => ShapeKind::Rectangle,
        }
    }

    /// 获取几何的类型名称
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// 获取几何的包围盒
    pub fn bounding_box(&self) -> BoundingBox2 {
        match self {
            Geometry::Segment(s) => s.bounding_box(),
            Geometry::Circle(c) => c.bounding_box(),
            Geometry::Arc(a) => a.bounding_box(),
            Geometry::Spline(s) => s.bounding_box(),
            Geometry::Polygon(p) => BoundingBox2::from_points(p.vertices.iter().copied()),
            Geometry::Rectangle(r) => BoundingBox2::from_points(r.corners),
        }
    }

    /// 检查点是否在几何轮廓上（考虑容差）
    pub fn contains_point(&self, point: &Point2, tolerance: f64) -> bool {
        if !self.bounding_box().expanded(tolerance).contains(point) {
            return false;
        }
        match self {
            Geometry::Segment(s) => s.distance_to_point(point) <= tolerance,
            Geometry::Circle(c) => c.distance_to_point(point).abs() <= tolerance,
            Geometry::Arc(a) => a.distance_to_point(point) <= tolerance,
            Geometry::Spline(s) => s.distance_to_point(point, tolerance / 4.0) <= tolerance,
            Geometry::Polygon(p) => closed_outline_distance(&p.vertices, point) <= tolerance,
            Geometry::Rectangle(r) => closed_outline_distance(&r.corners, point) <= tolerance,
        }
    }

    /// 旋转时使用的参考中心
    pub fn reference_center(&self) -> Point2 {
        match self {
            Geometry::Segment(s) => s.midpoint(),
            Geometry::Circle(c) => c.center,
            Geometry::Arc(a) => a.center,
            Geometry::Spline(s) => centroid(&s.control_points),
            Geometry::Polygon(p) => p.center(),
            Geometry::Rectangle(r) => r.center(),
        }
    }

    /// 绕 `center` 旋转 `angle` 弧度
    pub fn rotate_about(&mut self, center: Point2, angle: f64) {
        let rot = |p: &mut Point2| *p = rotate_point(*p, center, angle);
        match self {
            Geometry::Segment(s) => {
                rot(&mut s.start);
                rot(&mut s.end);
            }
            Geometry::Circle(c) => rot(&mut c.center),
            Geometry::Arc(a) => {
                rot(&mut a.center);
                a.start_angle = normalize_angle(a.start_angle + angle);
                a.end_angle = normalize_angle(a.end_angle + angle);
            }
            Geometry::Spline(s) => s.control_points.iter_mut().for_each(rot),
            Geometry::Polygon(p) => {
                p.vertices.iter_mut().for_each(rot);
                if let Some(circle) = p.generating_circle.as_mut() {
                    rot(&mut circle.center);
                }
            }
            Geometry::Rectangle(r) => r.corners.iter_mut().for_each(rot),
        }
    }

    /// 尺寸标注：锚点（逻辑坐标）与文本
    pub fn measurement_label(&self, precision: usize) -> Option<(Point2, String)> {
        match self {
            Geometry::Segment(s) => Some((s.midpoint(), format!("{:.*}", precision, s.length()))),
            Geometry::Circle(c) => Some((c.center, format!("R{:.*}", precision, c.radius))),
            Geometry::Arc(a) => Some((
                a.point_at_angle(a.start_angle + a.sweep_angle() / 2.0),
                format!("R{:.*}", precision, a.radius),
            )),
            Geometry::Polygon(p) => {
                let anchor = p.center();
                match &p.generating_circle {
                    Some(c) => Some((
                        anchor,
                        format!("n={} R{:.*}", p.vertices.len(), precision, c.radius),
                    )),
                    None => Some((anchor, format!("P{:.*}", precision, p.perimeter()))),
                }
            }
            Geometry::Rectangle(r) => Some((
                r.center(),
                format!("{:.*}×{:.*}", precision, r.width(), precision, r.height()),
            )),
            Geometry::Spline(_) => None,
        }
    }
}

fn centroid(points: &[Point2]) -> Point2 {
    if points.is_empty() {
        return Point2::origin();
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2::new(sx / n, sy / n)
}

fn closed_outline_distance(points: &[Point2], point: &Point2) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| distance_to_segment(point, &points[i], &points[(i + 1) % n]))
        .fold(f64::MAX, f64::min)
}

fn open_outline_distance(points: &[Point2], point: &Point2) -> f64 {
    match points {
        [] => f64::MAX,
        [single] => (point - single).norm(),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(point, &w[0], &w[1]))
            .fold(f64::MAX, f64::min),
    }
}

/// 线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// 计算线段中点
    pub fn midpoint(&self) -> Point2 {
        midpoint(self.start, self.end)
    }

    /// 计算点到线段的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        distance_to_segment(point, &self.start, &self.end)
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.start, self.end])
    }
}

/// 圆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// 计算周长
    pub fn circumference(&self) -> f64 {
        TAU * self.radius
    }

    /// 计算点到圆的距离（负值表示在圆内）
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        (point - self.center).norm() - self.radius
    }

    /// 获取圆上指定角度的点
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.center.x - self.radius, self.center.y - self.radius),
            Point2::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }
}

/// 圆弧
///
/// 从 `start_angle` 逆时针扫到 `end_angle`，两个角度都归一化到 [0, 2π)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    /// 起始角度（弧度）
    pub start_angle: f64,
    /// 终止角度（弧度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle: normalize_angle(start_angle),
            end_angle: normalize_angle(end_angle),
        }
    }

    /// 逆时针扫过的角度，范围 [0, 2π)
    pub fn sweep_angle(&self) -> f64 {
        ccw_delta(self.start_angle, self.end_angle)
    }

    /// 计算弧长
    pub fn length(&self) -> f64 {
        self.sweep_angle() * self.radius
    }

    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    pub fn start_point(&self) -> Point2 {
        self.point_at_angle(self.start_angle)
    }

    pub fn end_point(&self) -> Point2 {
        self.point_at_angle(self.end_angle)
    }

    /// 检查角度是否在弧的范围内
    pub fn contains_angle(&self, angle: f64) -> bool {
        let delta = ccw_delta(self.start_angle, angle);
        delta <= self.sweep_angle() + EPSILON || TAU - delta <= EPSILON
    }

    /// 计算点到圆弧的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        let angle = (point.y - self.center.y).atan2(point.x - self.center.x);
        if self.contains_angle(angle) {
            ((point - self.center).norm() - self.radius).abs()
        } else {
            // 返回到端点的最小距离
            let d1 = (point - self.start_point()).norm();
            let d2 = (point - self.end_point()).norm();
            d1.min(d2)
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::from_points([self.start_point(), self.end_point()]);

        // 检查象限点
        for angle in [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2] {
            if self.contains_angle(angle) {
                bbox.expand_to_include(&self.point_at_angle(angle));
            }
        }

        bbox
    }
}

/// 样条种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplineKind {
    /// 任意阶贝塞尔曲线
    Bezier,
    /// 内部顶点倒圆角的多段线
    RoundedPolyline,
}

/// 圆角多段线展开后的路径元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathElement {
    Segment(Segment),
    Arc(Arc),
}

/// 样条曲线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    pub control_points: Vec<Point2>,
    pub kind: SplineKind,
    /// 圆角半径（仅 RoundedPolyline 使用）
    pub rounding_radius: f64,
}

impl Spline {
    pub fn bezier(control_points: Vec<Point2>) -> Self {
        Self {
            control_points,
            kind: SplineKind::Bezier,
            rounding_radius: 0.0,
        }
    }

    pub fn rounded_polyline(points: Vec<Point2>, rounding_radius: f64) -> Self {
        Self {
            control_points: points,
            kind: SplineKind::RoundedPolyline,
            rounding_radius,
        }
    }

    /// 圆角多段线的直线段与圆角弧
    ///
    /// 贝塞尔样条返回控制多边形。
    pub fn path_elements(&self) -> crate::error::Result<Vec<PathElement>> {
        match self.kind {
            SplineKind::RoundedPolyline => {
                construct::fillet_polyline(&self.control_points, self.rounding_radius)
            }
            SplineKind::Bezier => Ok(self
                .control_points
                .windows(2)
                .map(|w| PathElement::Segment(Segment::new(w[0], w[1])))
                .collect()),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        // 贝塞尔曲线位于控制点凸包内，圆角路径位于原折线凸包内
        BoundingBox2::from_points(self.control_points.iter().copied())
    }

    fn distance_to_point(&self, point: &Point2, flatness: f64) -> f64 {
        match self.kind {
            SplineKind::Bezier => {
                let flat = flatten_bezier(&self.control_points, flatness.max(EPSILON));
                open_outline_distance(&flat, point)
            }
            SplineKind::RoundedPolyline => match self.path_elements() {
                Ok(elements) => elements
                    .iter()
                    .map(|e| match e {
                        PathElement::Segment(s) => s.distance_to_point(point),
                        PathElement::Arc(a) => a.distance_to_point(point),
                    })
                    .fold(f64::MAX, f64::min),
                Err(_) => open_outline_distance(&self.control_points, point),
            },
        }
    }
}

/// 以 t 参数计算贝塞尔曲线上的点（de Casteljau）
pub fn bezier_point(control: &[Point2], t: f64) -> Point2 {
    let mut tmp: Vec<Point2> = control.to_vec();
    let n = tmp.len();
    for level in 1..n {
        for i in 0..n - level {
            tmp[i] = tmp[i] + (tmp[i + 1] - tmp[i]) * t;
        }
    }
    tmp.first().copied().unwrap_or_else(Point2::origin)
}

/// 递归 de Casteljau 细分，直到控制多边形与弦的偏差不超过 `tolerance`
///
/// 返回包含首尾端点的折线。贝塞尔曲线在仿射变换下不变，所以调用方可以先把
/// 控制点变换到设备坐标，再以像素为单位指定容差。
pub fn flatten_bezier(control: &[Point2], tolerance: f64) -> Vec<Point2> {
    const MAX_DEPTH: u32 = 16;

    let mut out = Vec::new();
    match control {
        [] => return out,
        [p] => {
            out.push(*p);
            return out;
        }
        _ => {}
    }
    out.push(control[0]);
    subdivide(control, tolerance, MAX_DEPTH, &mut out);
    out
}

fn subdivide(control: &[Point2], tolerance: f64, depth: u32, out: &mut Vec<Point2>) {
    let first = control[0];
    let last = control[control.len() - 1];
    let flat = control[1..control.len() - 1]
        .iter()
        .all(|p| distance_to_segment(p, &first, &last) <= tolerance);
    if flat || depth == 0 {
        out.push(last);
        return;
    }

    // 在 t = 0.5 处拆分：左半取每层首点，右半取每层末点
    let n = control.len();
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    let mut level: Vec<Point2> = control.to_vec();
    left.push(level[0]);
    right.push(level[n - 1]);
    for _ in 1..n {
        level = level.windows(2).map(|w| midpoint(w[0], w[1])).collect();
        left.push(level[0]);
        right.push(level[level.len() - 1]);
    }
    right.reverse();

    subdivide(&left, tolerance, depth - 1, out);
    subdivide(&right, tolerance, depth - 1, out);
}

/// 多边形标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonTag {
    /// 任意顶点
    Free,
    /// 顶点落在生成圆上
    Circumscribed,
    /// 边与生成圆相切
    Inscribed,
}

/// 多边形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point2>,
    pub tag: PolygonTag,
    /// 生成圆（正多边形时存在）
    pub generating_circle: Option<Circle>,
}

impl Polygon {
    /// 生成圆圆心，自由多边形取顶点平均值
    pub fn center(&self) -> Point2 {
        self.generating_circle
            .as_ref()
            .map(|c| c.center)
            .unwrap_or_else(|| centroid(&self.vertices))
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| (self.vertices[(i + 1) % n] - self.vertices[i]).norm())
            .sum()
    }
}

/// 矩形（四个角点，逆时针）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub corners: [Point2; 4],
}

impl Rectangle {
    pub fn center(&self) -> Point2 {
        midpoint(self.corners[0], self.corners[2])
    }

    pub fn width(&self) -> f64 {
        (self.corners[1] - self.corners[0]).norm()
    }

    pub fn height(&self) -> f64 {
        (self.corners[3] - self.corners[0]).norm()
    }

    /// 第一条边相对 X 轴的角度
    pub fn rotation(&self) -> f64 {
        let e = self.corners[1] - self.corners[0];
        normalize_angle(e.y.atan2(e.x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_length() {
        let seg = Segment::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((seg.length() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_arc_sweep_wraps() {
        let arc = Arc::new(Point2::origin(), 1.0, 3.0 * FRAC_PI_2, FRAC_PI_2);
        assert!((arc.sweep_angle() - PI).abs() < EPSILON);
        assert!(arc.contains_angle(0.0));
        assert!(!arc.contains_angle(PI));
    }

    #[test]
    fn test_arc_bounding_box_quadrants() {
        let arc = Arc::new(Point2::origin(), 2.0, 0.0, PI);
        let bbox = arc.bounding_box();
        assert!((bbox.max.y - 2.0).abs() < EPSILON);
        assert!((bbox.min.x + 2.0).abs() < EPSILON);
        assert!(bbox.min.y.abs() < EPSILON);
    }

    #[test]
    fn test_flatten_bezier_endpoints_and_flatness() {
        let control = [
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 100.0),
            Point2::new(100.0, 0.0),
        ];
        let flat = flatten_bezier(&control, 0.25);
        assert_eq!(flat.first(), Some(&control[0]));
        assert_eq!(flat.last(), Some(&control[2]));
        assert!(flat.len() > 8);
        // 每个折线顶点都在曲线上，中点 t=0.5 对应 (50, 50)
        let mid = bezier_point(&control, 0.5);
        assert!((mid - Point2::new(50.0, 50.0)).norm() < EPSILON);
        assert!(flat.iter().any(|p| (p - mid).norm() < EPSILON));
    }

    #[test]
    fn test_flatten_straight_bezier_is_single_segment() {
        let control = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        assert_eq!(flatten_bezier(&control, 0.1).len(), 2);
    }

    #[test]
    fn test_rectangle_outline_hit() {
        let rect = Geometry::Rectangle(Rectangle {
            corners: [
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 2.0),
                Point2::new(0.0, 2.0),
            ],
        });
        assert!(rect.contains_point(&Point2::new(2.0, 0.05), 0.1));
        assert!(!rect.contains_point(&Point2::new(2.0, 1.0), 0.1));
    }

    #[test]
    fn test_rotate_arc_keeps_sweep() {
        let mut g = Geometry::Arc(Arc::new(Point2::new(1.0, 0.0), 1.0, 0.0, FRAC_PI_2));
        g.rotate_about(Point2::origin(), PI);
        let Geometry::Arc(a) = g else { panic!("expected arc") };
        assert!((a.center - Point2::new(-1.0, 0.0)).norm() < EPSILON);
        assert!((a.start_angle - PI).abs() < EPSILON);
        assert!((a.sweep_angle() - FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_labels() {
        let seg = Geometry::Segment(Segment::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)));
        let (anchor, text) = seg.measurement_label(2).unwrap();
        assert_eq!(text, "5.00");
        assert_eq!(anchor, Point2::new(1.5, 2.0));
        let circle = Geometry::Circle(Circle::new(Point2::origin(), 1.5));
        assert_eq!(circle.measurement_label(1).unwrap().1, "R1.5");
    }
}
