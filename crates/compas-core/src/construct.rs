//! 几何构造器
//!
//! 每种构造方式是一个纯函数：输入点/数值 → 规范几何参数，或 [`CadError`]。
//!
//! | 图元 | 构造方式 |
//! |------|----------|
//! | 线段 | 两点 |
//! | 圆   | 圆心+半径、三点 |
//! | 圆弧 | 三点、弦+半径 |
//! | 样条 | 贝塞尔、圆角多段线 |
//! | 多边形 | 自由、外接、内切 |
//! | 矩形 | 按边、从中心 |

use crate::error::{CadError, Result};
use crate::geometry::{
    Arc, Circle, Geometry, PathElement, Polygon, PolygonTag, Rectangle, Segment, ShapeKind,
    Spline, SplineKind,
};
use crate::math::{ccw_delta, midpoint, rotate_point, Point2, Vector2, EPSILON};
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use tracing::warn;

/// 共线判定的相对容差（相对于点集尺度的平方）
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// 构造方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstructionMethod {
    SegmentTwoPoints,
    CircleCenterRadius,
    CircleThreePoints,
    ArcThreePoints,
    ArcRadiusChord,
    SplineBezier,
    SplineRoundedPolyline,
    PolygonFree,
    PolygonCircumscribed,
    PolygonInscribed,
    RectangleBySides,
    RectangleFromCenter,
}

/// 构造方式需要的点数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointCount {
    /// 恰好 n 个点后自动完成
    Exact(usize),
    /// 至少 n 个点，需要显式结束
    AtLeast(usize),
}

impl ConstructionMethod {
    pub const ALL: [ConstructionMethod; 12] = [
        ConstructionMethod::SegmentTwoPoints,
        ConstructionMethod::CircleCenterRadius,
        ConstructionMethod::CircleThreePoints,
        ConstructionMethod::ArcThreePoints,
        ConstructionMethod::ArcRadiusChord,
        ConstructionMethod::SplineBezier,
        ConstructionMethod::SplineRoundedPolyline,
        ConstructionMethod::PolygonFree,
        ConstructionMethod::PolygonCircumscribed,
        ConstructionMethod::PolygonInscribed,
        ConstructionMethod::RectangleBySides,
        ConstructionMethod::RectangleFromCenter,
    ];

    pub fn kind(&self) -> ShapeKind {
        match self {
            ConstructionMethod::SegmentTwoPoints => ShapeKind::Segment,
            ConstructionMethod::CircleCenterRadius | ConstructionMethod::CircleThreePoints => {
                ShapeKind::Circle
            }
            ConstructionMethod::ArcThreePoints | ConstructionMethod::ArcRadiusChord => {
                ShapeKind::Arc
            }
            ConstructionMethod::SplineBezier | ConstructionMethod::SplineRoundedPolyline => {
                ShapeKind::Spline
            }
            ConstructionMethod::PolygonFree
            | ConstructionMethod::PolygonCircumscribed
            | ConstructionMethod::PolygonInscribed => ShapeKind::Polygon,
            ConstructionMethod::RectangleBySides | ConstructionMethod::RectangleFromCenter => {
                ShapeKind::Rectangle
            }
        }
    }

    /// 构造树中显示的名称
    pub fn display_name(&self) -> &'static str {
        match self {
            ConstructionMethod::SegmentTwoPoints => "Line",
            ConstructionMethod::CircleCenterRadius => "Circle",
            ConstructionMethod::CircleThreePoints => "Circle by 3 Points",
            ConstructionMethod::ArcThreePoints => "Arc by 3 Points",
            ConstructionMethod::ArcRadiusChord => "Arc by Radius-Chord",
            ConstructionMethod::SplineBezier => "Bezier Curve",
            ConstructionMethod::SplineRoundedPolyline => "Rounded Polyline",
            ConstructionMethod::PolygonFree => "Polygon",
            ConstructionMethod::PolygonCircumscribed => "Circumscribed Polygon",
            ConstructionMethod::PolygonInscribed => "Inscribed Polygon",
            ConstructionMethod::RectangleBySides => "Rectangle",
            ConstructionMethod::RectangleFromCenter => "Rectangle from Center",
        }
    }

    /// 交互构造时需要点击的点数
    pub fn point_count(&self) -> PointCount {
        match self {
            ConstructionMethod::SegmentTwoPoints
            | ConstructionMethod::CircleCenterRadius
            | ConstructionMethod::ArcRadiusChord
            | ConstructionMethod::PolygonCircumscribed
            | ConstructionMethod::PolygonInscribed
            | ConstructionMethod::RectangleBySides
            | ConstructionMethod::RectangleFromCenter => PointCount::Exact(2),
            ConstructionMethod::CircleThreePoints | ConstructionMethod::ArcThreePoints => {
                PointCount::Exact(3)
            }
            ConstructionMethod::SplineBezier | ConstructionMethod::SplineRoundedPolyline => {
                PointCount::AtLeast(2)
            }
            ConstructionMethod::PolygonFree => PointCount::AtLeast(3),
        }
    }
}

/// 弦+半径圆弧的凸出方向（相对于从起点指向终点的弦）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArcSide {
    #[default]
    Left,
    Right,
}

/// 构造输入（构造方式 + 原始参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstructionInput {
    Segment {
        start: Point2,
        end: Point2,
    },
    CircleCenterRadius {
        center: Point2,
        radius: f64,
    },
    CircleThreePoints {
        p1: Point2,
        p2: Point2,
        p3: Point2,
    },
    ArcThreePoints {
        start: Point2,
        through: Point2,
        end: Point2,
    },
    ArcRadiusChord {
        chord_start: Point2,
        chord_end: Point2,
        radius: f64,
        side: ArcSide,
    },
    SplineBezier {
        control_points: Vec<Point2>,
    },
    SplineRoundedPolyline {
        points: Vec<Point2>,
        rounding_radius: f64,
    },
    PolygonFree {
        vertices: Vec<Point2>,
    },
    PolygonRegular {
        circle: Circle,
        sides: usize,
        /// `Circumscribed` 或 `Inscribed`
        tag: PolygonTag,
        /// 第一个顶点的角度
        start_angle: f64,
    },
    RectangleBySides {
        corner: Point2,
        width: f64,
        height: f64,
        rotation: f64,
    },
    RectangleFromCenter {
        center: Point2,
        width: f64,
        height: f64,
        rotation: f64,
    },
}

impl ConstructionInput {
    pub fn method(&self) -> ConstructionMethod {
        match self {
            ConstructionInput::Segment { .. } => ConstructionMethod::SegmentTwoPoints,
            ConstructionInput::CircleCenterRadius { .. } => ConstructionMethod::CircleCenterRadius,
            ConstructionInput::CircleThreePoints { .. } => ConstructionMethod::CircleThreePoints,
            ConstructionInput::ArcThreePoints { .. } => ConstructionMethod::ArcThreePoints,
            ConstructionInput::ArcRadiusChord { .. } => ConstructionMethod::ArcRadiusChord,
            ConstructionInput::SplineBezier { .. } => ConstructionMethod::SplineBezier,
            ConstructionInput::SplineRoundedPolyline { .. } => {
                ConstructionMethod::SplineRoundedPolyline
            }
            ConstructionInput::PolygonFree { .. } => ConstructionMethod::PolygonFree,
            ConstructionInput::PolygonRegular { tag, .. } => match tag {
                PolygonTag::Inscribed => ConstructionMethod::PolygonInscribed,
                _ => ConstructionMethod::PolygonCircumscribed,
            },
            ConstructionInput::RectangleBySides { .. } => ConstructionMethod::RectangleBySides,
            ConstructionInput::RectangleFromCenter { .. } => {
                ConstructionMethod::RectangleFromCenter
            }
        }
    }
}

/// 警告级别的构造条件（不阻止对象创建）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionWarning {
    ZeroLengthSegment,
}

/// 构造结果
#[derive(Debug, Clone, PartialEq)]
pub struct Constructed {
    pub geometry: Geometry,
    pub warnings: Vec<ConstructionWarning>,
}

impl From<Geometry> for Constructed {
    fn from(geometry: Geometry) -> Self {
        Self {
            geometry,
            warnings: Vec::new(),
        }
    }
}

/// 运行构造输入对应的构造器
pub fn build(input: &ConstructionInput) -> Result<Constructed> {
    match input {
        ConstructionInput::Segment { start, end } => segment(*start, *end),
        ConstructionInput::CircleCenterRadius { center, radius } => {
            circle_center_radius(*center, *radius).map(|c| Geometry::Circle(c).into())
        }
        ConstructionInput::CircleThreePoints { p1, p2, p3 } => {
            circle_three_points(*p1, *p2, *p3).map(|c| Geometry::Circle(c).into())
        }
        ConstructionInput::ArcThreePoints {
            start,
            through,
            end,
        } => arc_three_points(*start, *through, *end).map(|a| Geometry::Arc(a).into()),
        ConstructionInput::ArcRadiusChord {
            chord_start,
            chord_end,
            radius,
            side,
        } => arc_radius_chord(*chord_start, *chord_end, *radius, *side)
            .map(|a| Geometry::Arc(a).into()),
        ConstructionInput::SplineBezier { control_points } => {
            spline_bezier(control_points).map(|s| Geometry::Spline(s).into())
        }
        ConstructionInput::SplineRoundedPolyline {
            points,
            rounding_radius,
        } => spline_rounded_polyline(points, *rounding_radius).map(|s| Geometry::Spline(s).into()),
        ConstructionInput::PolygonFree { vertices } => {
            polygon_free(vertices).map(|p| Geometry::Polygon(p).into())
        }
        ConstructionInput::PolygonRegular {
            circle,
            sides,
            tag,
            start_angle,
        } => polygon_regular(circle, *sides, *tag, *start_angle)
            .map(|p| Geometry::Polygon(p).into()),
        ConstructionInput::RectangleBySides {
            corner,
            width,
            height,
            rotation,
        } => rectangle_by_sides(*corner, *width, *height, *rotation)
            .map(|r| Geometry::Rectangle(r).into()),
        ConstructionInput::RectangleFromCenter {
            center,
            width,
            height,
            rotation,
        } => rectangle_from_center(*center, *width, *height, *rotation)
            .map(|r| Geometry::Rectangle(r).into()),
    }
}

fn check_finite(points: &[Point2]) -> Result<()> {
    match points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        Some(p) => Err(CadError::invalid(format!("non-finite coordinate ({}, {})", p.x, p.y))),
        None => Ok(()),
    }
}

fn check_scalar(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CadError::invalid(format!("{} must be finite, got {}", name, value)))
    }
}

fn check_radius(radius: f64) -> Result<()> {
    check_scalar("radius", radius)?;
    if radius <= 0.0 {
        return Err(CadError::degenerate(format!("radius must be > 0, got {}", radius)));
    }
    Ok(())
}

/// 两点线段；零长度线段允许创建，但附带警告
pub fn segment(start: Point2, end: Point2) -> Result<Constructed> {
    check_finite(&[start, end])?;
    let mut warnings = Vec::new();
    if (end - start).norm() < EPSILON {
        warn!("zero-length segment at ({}, {})", start.x, start.y);
        warnings.push(ConstructionWarning::ZeroLengthSegment);
    }
    Ok(Constructed {
        geometry: Geometry::Segment(Segment::new(start, end)),
        warnings,
    })
}

pub fn circle_center_radius(center: Point2, radius: f64) -> Result<Circle> {
    check_finite(&[center])?;
    check_radius(radius)?;
    Ok(Circle::new(center, radius))
}

/// 外心：两条中垂线的交点
///
/// 中垂线方程 `(p2 - p1)·X = (p2 - p1)·m12`，`(p3 - p2)·X = (p3 - p2)·m23`，
/// 解 2×2 线性方程组。行列式近似为 0（三点共线）时返回 `DegenerateGeometry`。
pub fn circumcenter(p1: Point2, p2: Point2, p3: Point2) -> Result<Point2> {
    check_finite(&[p1, p2, p3])?;
    let a = p2 - p1;
    let b = p3 - p2;

    let scale = a.norm().max(b.norm()).max((p3 - p1).norm());
    let det = a.x * b.y - a.y * b.x;
    if scale < EPSILON || det.abs() <= COLLINEAR_TOLERANCE * scale * scale {
        return Err(CadError::degenerate("points are collinear"));
    }

    let m = Matrix2::new(a.x, a.y, b.x, b.y);
    let rhs = Vector2::new(a.dot(&midpoint(p1, p2).coords), b.dot(&midpoint(p2, p3).coords));
    let inv = m
        .try_inverse()
        .ok_or_else(|| CadError::degenerate("points are collinear"))?;
    let c = inv * rhs;
    Ok(Point2::new(c.x, c.y))
}

pub fn circle_three_points(p1: Point2, p2: Point2, p3: Point2) -> Result<Circle> {
    let center = circumcenter(p1, p2, p3)?;
    Ok(Circle::new(center, (p1 - center).norm()))
}

/// 三点圆弧：从起点经过中间点到终点
pub fn arc_three_points(start: Point2, through: Point2, end: Point2) -> Result<Arc> {
    let center = circumcenter(start, through, end)?;
    let radius = (start - center).norm();

    let angle_of = |p: Point2| (p.y - center.y).atan2(p.x - center.x);
    let a_start = angle_of(start);
    let a_through = angle_of(through);
    let a_end = angle_of(end);

    // 逆时针扫过中间点则保持方向，否则交换起止角
    if ccw_delta(a_start, a_through) <= ccw_delta(a_start, a_end) {
        Ok(Arc::new(center, radius, a_start, a_end))
    } else {
        Ok(Arc::new(center, radius, a_end, a_start))
    }
}

/// 弦+半径圆弧
///
/// 圆心位于弦的中垂线上，距弦 `sqrt(r² - (c/2)²)`；两个可能的圆心中，
/// 取使劣弧向 `side` 一侧凸出的那个（圆心在另一侧）。
pub fn arc_radius_chord(
    chord_start: Point2,
    chord_end: Point2,
    radius: f64,
    side: ArcSide,
) -> Result<Arc> {
    check_finite(&[chord_start, chord_end])?;
    check_radius(radius)?;

    let chord = chord_end - chord_start;
    let chord_len = chord.norm();
    if chord_len < EPSILON {
        return Err(CadError::degenerate("chord has zero length"));
    }
    let half = chord_len / 2.0;
    if radius < half - EPSILON {
        return Err(CadError::degenerate(format!(
            "radius {} is smaller than half the chord {}",
            radius, half
        )));
    }

    let height = (radius * radius - half * half).max(0.0).sqrt();
    let left = Vector2::new(-chord.y, chord.x) / chord_len;
    let mid = midpoint(chord_start, chord_end);
    let angle_of = |c: Point2, p: Point2| (p.y - c.y).atan2(p.x - c.x);

    match side {
        ArcSide::Left => {
            let center = mid - left * height;
            Ok(Arc::new(
                center,
                radius,
                angle_of(center, chord_end),
                angle_of(center, chord_start),
            ))
        }
        ArcSide::Right => {
            let center = mid + left * height;
            Ok(Arc::new(
                center,
                radius,
                angle_of(center, chord_start),
                angle_of(center, chord_end),
            ))
        }
    }
}

pub fn spline_bezier(control_points: &[Point2]) -> Result<Spline> {
    check_finite(control_points)?;
    if control_points.len() < 2 {
        return Err(CadError::degenerate("bezier spline needs at least 2 control points"));
    }
    Ok(Spline::bezier(control_points.to_vec()))
}

pub fn spline_rounded_polyline(points: &[Point2], rounding_radius: f64) -> Result<Spline> {
    check_finite(points)?;
    check_scalar("rounding radius", rounding_radius)?;
    if rounding_radius < 0.0 {
        return Err(CadError::invalid("rounding radius must not be negative"));
    }
    if points.len() < 2 {
        return Err(CadError::degenerate("polyline needs at least 2 points"));
    }
    fillet_polyline(points, rounding_radius)?;
    Ok(Spline::rounded_polyline(points.to_vec(), rounding_radius))
}

/// 把折线的每个内部顶点替换为半径 `radius` 的圆角弧
///
/// 圆角半径超过相邻较短边的一半，或切线长超过它（相邻圆角重叠）时失败。
/// 共线顶点保持原样。
pub fn fillet_polyline(points: &[Point2], radius: f64) -> Result<Vec<PathElement>> {
    let mut elements = Vec::new();
    let Some(&first) = points.first() else {
        return Ok(elements);
    };

    let mut cursor = first;
    let push_segment = |elements: &mut Vec<PathElement>, from: Point2, to: Point2| {
        if (to - from).norm() > EPSILON {
            elements.push(PathElement::Segment(Segment::new(from, to)));
        }
    };

    for i in 1..points.len().saturating_sub(1) {
        let (prev, vertex, next) = (points[i - 1], points[i], points[i + 1]);
        let to_prev = prev - vertex;
        let to_next = next - vertex;
        let (len_prev, len_next) = (to_prev.norm(), to_next.norm());
        if len_prev < EPSILON || len_next < EPSILON {
            return Err(CadError::degenerate(format!("duplicate vertex at index {}", i)));
        }

        let limit = len_prev.min(len_next) / 2.0;
        if radius > limit {
            return Err(CadError::degenerate(format!(
                "rounding radius {} exceeds half of the shorter segment ({}) at vertex {}",
                radius, limit, i
            )));
        }

        let u1 = to_prev / len_prev;
        let u2 = to_next / len_next;
        let alpha = u1.dot(&u2).clamp(-1.0, 1.0).acos();

        if radius < EPSILON || PI - alpha < 1e-9 {
            push_segment(&mut elements, cursor, vertex);
            cursor = vertex;
            continue;
        }
        if alpha < 1e-9 {
            return Err(CadError::degenerate(format!("polyline reverses at vertex {}", i)));
        }

        let tangent_len = radius / (alpha / 2.0).tan();
        if tangent_len > limit + EPSILON {
            return Err(CadError::degenerate(format!(
                "fillet at vertex {} needs {} of each adjacent segment, only {} available",
                i, tangent_len, limit
            )));
        }

        let t1 = vertex + u1 * tangent_len;
        let t2 = vertex + u2 * tangent_len;
        let bisector = (u1 + u2).normalize();
        let center = vertex + bisector * (radius / (alpha / 2.0).sin());

        let a1 = (t1.y - center.y).atan2(t1.x - center.x);
        let a2 = (t2.y - center.y).atan2(t2.x - center.x);
        let arc = if ccw_delta(a1, a2) <= PI {
            Arc::new(center, radius, a1, a2)
        } else {
            Arc::new(center, radius, a2, a1)
        };

        push_segment(&mut elements, cursor, t1);
        elements.push(PathElement::Arc(arc));
        cursor = t2;
    }

    if let Some(&last) = points.last() {
        push_segment(&mut elements, cursor, last);
    }
    Ok(elements)
}

pub fn polygon_free(vertices: &[Point2]) -> Result<Polygon> {
    check_finite(vertices)?;
    if vertices.len() < 3 {
        return Err(CadError::degenerate(format!(
            "polygon needs at least 3 vertices, got {}",
            vertices.len()
        )));
    }
    Ok(Polygon {
        vertices: vertices.to_vec(),
        tag: PolygonTag::Free,
        generating_circle: None,
    })
}

/// 正多边形
///
/// `Circumscribed`：顶点落在生成圆上，顶点距圆心 = r；
/// `Inscribed`：边与生成圆相切，顶点距圆心 = r / cos(π/n)。
pub fn polygon_regular(
    circle: &Circle,
    sides: usize,
    tag: PolygonTag,
    start_angle: f64,
) -> Result<Polygon> {
    check_finite(&[circle.center])?;
    check_radius(circle.radius)?;
    check_scalar("start angle", start_angle)?;
    if sides < 3 {
        return Err(CadError::degenerate(format!(
            "polygon needs at least 3 sides, got {}",
            sides
        )));
    }

    let n = sides as f64;
    let vertex_radius = match tag {
        PolygonTag::Circumscribed => circle.radius,
        PolygonTag::Inscribed => circle.radius / (PI / n).cos(),
        PolygonTag::Free => {
            return Err(CadError::invalid("regular polygon must be circumscribed or inscribed"))
        }
    };

    let step = TAU / n;
    let vertices = (0..sides)
        .map(|k| {
            let a = start_angle + step * k as f64;
            Point2::new(
                circle.center.x + vertex_radius * a.cos(),
                circle.center.y + vertex_radius * a.sin(),
            )
        })
        .collect();

    Ok(Polygon {
        vertices,
        tag,
        generating_circle: Some(circle.clone()),
    })
}

fn check_extent(width: f64, height: f64, rotation: f64) -> Result<()> {
    check_scalar("width", width)?;
    check_scalar("height", height)?;
    check_scalar("rotation", rotation)?;
    if width.abs() < EPSILON || height.abs() < EPSILON {
        return Err(CadError::degenerate(format!(
            "rectangle sides must be non-zero, got {} x {}",
            width, height
        )));
    }
    Ok(())
}

/// 按边构造：`corner` 为一个角点，宽高可为负（向左/向下），
/// 之后绕 `corner` 旋转 `rotation`
pub fn rectangle_by_sides(corner: Point2, width: f64, height: f64, rotation: f64) -> Result<Rectangle> {
    check_finite(&[corner])?;
    check_extent(width, height, rotation)?;

    let (x0, x1) = (width.min(0.0), width.max(0.0));
    let (y0, y1) = (height.min(0.0), height.max(0.0));
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
        .map(|(dx, dy)| rotate_point(Point2::new(corner.x + dx, corner.y + dy), corner, rotation));
    Ok(Rectangle { corners })
}

/// 从中心构造，之后绕中心旋转 `rotation`
pub fn rectangle_from_center(center: Point2, width: f64, height: f64, rotation: f64) -> Result<Rectangle> {
    check_finite(&[center])?;
    check_extent(width, height, rotation)?;

    let (hw, hh) = (width.abs() / 2.0, height.abs() / 2.0);
    let corners = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
        .map(|(dx, dy)| rotate_point(Point2::new(center.x + dx, center.y + dy), center, rotation));
    Ok(Rectangle { corners })
}

/// 校验直接编辑得到的规范参数
pub fn validate(geometry: &Geometry) -> Result<()> {
    match geometry {
        Geometry::Segment(s) => check_finite(&[s.start, s.end]),
        Geometry::Circle(c) => {
            check_finite(&[c.center])?;
            check_radius(c.radius)
        }
        Geometry::Arc(a) => {
            check_finite(&[a.center])?;
            check_radius(a.radius)?;
            check_scalar("start angle", a.start_angle)?;
            check_scalar("end angle", a.end_angle)?;
            if a.sweep_angle() < EPSILON {
                return Err(CadError::degenerate("arc has zero sweep"));
            }
            Ok(())
        }
        Geometry::Spline(s) => match s.kind {
            SplineKind::Bezier => spline_bezier(&s.control_points).map(|_| ()),
            SplineKind::RoundedPolyline => {
                spline_rounded_polyline(&s.control_points, s.rounding_radius).map(|_| ())
            }
        },
        Geometry::Polygon(p) => {
            polygon_free(&p.vertices)?;
            if let Some(circle) = &p.generating_circle {
                check_finite(&[circle.center])?;
                check_radius(circle.radius)?;
            }
            Ok(())
        }
        Geometry::Rectangle(r) => {
            check_finite(&r.corners)?;
            let e1 = r.corners[1] - r.corners[0];
            let e2 = r.corners[3] - r.corners[0];
            let opposite = r.corners[2] - r.corners[1];
            let scale = e1.norm().max(e2.norm());
            if e1.norm() < EPSILON || e2.norm() < EPSILON {
                return Err(CadError::degenerate("rectangle has a zero-length side"));
            }
            if e1.dot(&e2).abs() > 1e-9 * scale * scale || (opposite - e2).norm() > 1e-9 * scale {
                return Err(CadError::invalid("corners do not form a rectangle"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::normalize_angle;
    use std::f64::consts::FRAC_PI_2;

    fn assert_point(p: Point2, x: f64, y: f64) {
        assert!((p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9, "got {:?}", p);
    }

    #[test]
    fn test_circle_three_points() {
        let c = circle_three_points(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.0),
        )
        .unwrap();
        assert_point(c.center, 1.0, 0.0);
        assert!((c.radius - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_three_points_collinear() {
        let result = circle_three_points(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        );
        assert!(matches!(result, Err(CadError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_circle_center_radius_rejects_zero() {
        assert!(matches!(
            circle_center_radius(Point2::origin(), 0.0),
            Err(CadError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            circle_center_radius(Point2::origin(), f64::NAN),
            Err(CadError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_length_segment_warns() {
        let built = segment(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)).unwrap();
        assert_eq!(built.warnings, vec![ConstructionWarning::ZeroLengthSegment]);
        assert!(segment(Point2::origin(), Point2::new(1.0, 0.0))
            .unwrap()
            .warnings
            .is_empty());
    }

    #[test]
    fn test_arc_three_points_ccw() {
        // 从 (1,0) 经 (0,1) 到 (-1,0)：上半圆，逆时针
        let arc = arc_three_points(
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(-1.0, 0.0),
        )
        .unwrap();
        assert_point(arc.center, 0.0, 0.0);
        assert!(arc.start_angle.abs() < 1e-9);
        assert!((arc.end_angle - PI).abs() < 1e-9);
        assert!(arc.contains_angle(FRAC_PI_2));
    }

    #[test]
    fn test_arc_three_points_cw_input_is_swapped() {
        // 从 (1,0) 经 (0,-1) 到 (-1,0)：下半圆，顺时针输入
        let arc = arc_three_points(
            Point2::new(1.0, 0.0),
            Point2::new(0.0, -1.0),
            Point2::new(-1.0, 0.0),
        )
        .unwrap();
        assert!((arc.start_angle - PI).abs() < 1e-9);
        assert!(arc.end_angle.abs() < 1e-9 || (arc.end_angle - TAU).abs() < 1e-9);
        assert!(arc.contains_angle(3.0 * FRAC_PI_2));
        assert!(!arc.contains_angle(FRAC_PI_2));
    }

    #[test]
    fn test_arc_radius_chord_sides() {
        let p1 = Point2::new(-1.0, 0.0);
        let p2 = Point2::new(1.0, 0.0);
        let r = 2.0_f64;
        let h = (r * r - 1.0).sqrt();

        let left = arc_radius_chord(p1, p2, r, ArcSide::Left).unwrap();
        assert_point(left.center, 0.0, -h);
        assert!(left.contains_angle(FRAC_PI_2));
        assert!(left.sweep_angle() < PI);

        let right = arc_radius_chord(p1, p2, r, ArcSide::Right).unwrap();
        assert_point(right.center, 0.0, h);
        assert!(right.contains_angle(3.0 * FRAC_PI_2));
        assert!(right.sweep_angle() < PI);
    }

    #[test]
    fn test_arc_radius_chord_too_small() {
        let result = arc_radius_chord(
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            1.9,
            ArcSide::Left,
        );
        assert!(matches!(result, Err(CadError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_arc_radius_chord_semicircle() {
        let arc = arc_radius_chord(
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            2.0,
            ArcSide::Left,
        )
        .unwrap();
        assert_point(arc.center, 2.0, 0.0);
        assert!((arc.sweep_angle() - PI).abs() < 1e-9);
    }

    #[test]
    fn test_regular_polygons() {
        let unit = Circle::new(Point2::origin(), 1.0);
        let inscribed = polygon_regular(&unit, 6, PolygonTag::Inscribed, 0.0).unwrap();
        let circumscribed = polygon_regular(&unit, 6, PolygonTag::Circumscribed, 0.0).unwrap();
        let expected = 1.0 / (PI / 6.0).cos();
        for v in &inscribed.vertices {
            assert!((v.coords.norm() - expected).abs() < 1e-12);
        }
        for v in &circumscribed.vertices {
            assert!((v.coords.norm() - 1.0).abs() < 1e-12);
        }
        assert_eq!(inscribed.vertices.len(), 6);
        assert_eq!(inscribed.generating_circle, Some(unit));
    }

    #[test]
    fn test_polygon_vertex_counts() {
        let unit = Circle::new(Point2::origin(), 1.0);
        assert!(polygon_regular(&unit, 2, PolygonTag::Inscribed, 0.0).is_err());
        assert!(matches!(
            polygon_free(&[Point2::origin(), Point2::new(1.0, 0.0)]),
            Err(CadError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_rectangle_modes_normalize() {
        let by_sides = rectangle_by_sides(Point2::new(4.0, 3.0), -4.0, -2.0, 0.0).unwrap();
        let from_center = rectangle_from_center(Point2::new(2.0, 2.0), 4.0, 2.0, 0.0).unwrap();
        assert_eq!(by_sides.corners, from_center.corners);
        assert_point(by_sides.corners[0], 0.0, 1.0);
        assert!(validate(&Geometry::Rectangle(by_sides)).is_ok());
    }

    #[test]
    fn test_rectangle_rotation() {
        let rect = rectangle_from_center(Point2::origin(), 2.0, 2.0, FRAC_PI_2).unwrap();
        assert_point(rect.corners[0], 1.0, -1.0);
        assert!((normalize_angle(rect.rotation()) - FRAC_PI_2).abs() < 1e-9);
        assert!(rectangle_by_sides(Point2::origin(), 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_fillet_right_angle() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
        ];
        let path = fillet_polyline(&points, 2.0).unwrap();
        assert_eq!(path.len(), 3);
        let PathElement::Arc(arc) = &path[1] else { panic!("expected fillet arc") };
        assert_point(arc.center, 8.0, 2.0);
        assert!((arc.radius - 2.0).abs() < 1e-12);
        assert!((arc.sweep_angle() - FRAC_PI_2).abs() < 1e-9);
        let PathElement::Segment(first) = &path[0] else { panic!("expected segment") };
        assert_point(first.end, 8.0, 0.0);
    }

    #[test]
    fn test_fillet_radius_too_large() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 10.0),
        ];
        assert!(matches!(
            spline_rounded_polyline(&points, 2.5),
            Err(CadError::DegenerateGeometry(_))
        ));
        assert!(spline_rounded_polyline(&points, 2.0).is_ok());
    }

    #[test]
    fn test_fillet_collinear_vertex_passes_through() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
        ];
        let path = fillet_polyline(&points, 1.0).unwrap();
        assert!(path.iter().all(|e| matches!(e, PathElement::Segment(_))));
    }

    #[test]
    fn test_validate_rejects_skewed_rectangle() {
        let rect = Geometry::Rectangle(Rectangle {
            corners: [
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(3.0, 1.0),
                Point2::new(1.0, 1.0),
            ],
        });
        assert!(matches!(validate(&rect), Err(CadError::InvalidParameter(_))));
    }

    #[test]
    fn test_build_reports_method() {
        let input = ConstructionInput::PolygonRegular {
            circle: Circle::new(Point2::origin(), 1.0),
            sides: 5,
            tag: PolygonTag::Inscribed,
            start_angle: 0.0,
        };
        assert_eq!(input.method(), ConstructionMethod::PolygonInscribed);
        assert_eq!(input.method().kind(), ShapeKind::Polygon);
        let built = build(&input).unwrap();
        assert_eq!(built.geometry.kind(), ShapeKind::Polygon);
    }
}
