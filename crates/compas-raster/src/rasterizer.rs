//! 对象光栅化
//!
//! 把规范几何变换到设备空间后扫描转换为像素：
//! - 直线段、折线、多边形、矩形：Bresenham，宽线用法向平移复制
//! - 圆、圆弧：中点画圆，圆弧按像素的逻辑角度过滤，宽线用同心半径
//! - 贝塞尔：设备空间 de Casteljau 细分到展平容差后按折线处理
//! - 圆角多段线：直线段与圆角弧分别光栅化，虚线相位连续

use crate::bresenham::{clip_segment, midpoint_circle, thick_line};
use crate::dash::DashPattern;
use crate::primitive::{PixelSet, RenderPrimitive};
use compas_core::config::KernelConfig;
use compas_core::entity::ShapeObject;
use compas_core::geometry::{flatten_bezier, Geometry, PathElement, SplineKind};
use compas_core::math::{ccw_delta, BoundingBox2, Point2};
use compas_core::properties::Style;
use compas_core::view::{ViewTransform, Viewport};
use std::f64::consts::{PI, TAU};
use tracing::warn;

/// 超过这个设备半径时，圆/圆弧改为按角度采样成折线再裁剪
const MAX_MIDPOINT_RADIUS_PX: f64 = 16384.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Rasterizer {
    pub flatness_tolerance_px: f64,
    pub dash_scale: f64,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::from_config(&KernelConfig::default())
    }
}

/// 单个对象的描边状态
struct Stroke<'a> {
    pixels: PixelSet,
    width: u32,
    dash: DashPattern,
    clip: (Point2, Point2),
    view: &'a ViewTransform,
    flatness: f64,
}

impl Stroke<'_> {
    /// 设备空间折线；返回终点处的累计弧长
    ///
    /// 每段先裁剪到 `clip` 再切虚线，裁掉部分的长度计入相位，
    /// 所以工作量只与可见长度有关。
    fn polyline(&mut self, points: &[Point2], start: f64) -> f64 {
        if let [p] = points {
            if self.dash.is_on(start) {
                self.pixels.extend(thick_line(*p, *p, self.width, self.clip));
            }
            return start;
        }

        let mut distance = start;
        for w in points.windows(2) {
            let (a, b) = (w[0], w[1]);
            if let Some((ca, cb)) = clip_segment(a, b, self.clip.0, self.clip.1) {
                let skipped = (ca - a).norm();
                let (pieces, _) = self.dash.split_polyline(&[ca, cb], distance + skipped);
                for piece in pieces {
                    for pair in piece.windows(2) {
                        self.pixels.extend(thick_line(pair[0], pair[1], self.width, self.clip));
                    }
                }
            }
            distance += (b - a).norm();
        }
        distance
    }

    /// 逻辑空间的圆或圆弧；`range` 为 (起始角, 扫角)，None 表示整圆
    fn circle_arc(&mut self, center: Point2, radius: f64, range: Option<(f64, f64)>, start: f64) -> f64 {
        let (start_angle, sweep) = range.unwrap_or((0.0, TAU));
        let c = self.view.to_device(&center);
        let r = self.view.scale_length(radius);
        let end = start + r * sweep;

        let half = (self.width as f64 - 1.0) / 2.0;
        let reach = r + half + 1.0;
        let device_box = BoundingBox2::new(
            Point2::new(c.x - reach, c.y - reach),
            Point2::new(c.x + reach, c.y + reach),
        );
        if !device_box.intersects(&BoundingBox2::new(self.clip.0, self.clip.1)) {
            return end;
        }

        if r > MAX_MIDPOINT_RADIUS_PX {
            let step = 2.0 * (1.0 - self.flatness / r).clamp(-1.0, 1.0).acos();
            // 只采样落在裁剪框张角内的参数区间 [t0, t1]，t 为相对起始角的转角
            let spans = match self.visible_window(c) {
                Some((lo, width)) => {
                    let d = ccw_delta(start_angle, lo);
                    vec![(d, d + width), (d - TAU, d + width - TAU)]
                }
                None => vec![(0.0, sweep)],
            };
            for (t0, t1) in spans {
                let (t0, t1) = (t0.max(0.0), t1.min(sweep));
                if t1 <= t0 {
                    continue;
                }
                let n = (((t1 - t0) / step.max(1e-6)).ceil() as usize).max(1);
                let points: Vec<Point2> = (0..=n)
                    .map(|i| {
                        let a = start_angle + t0 + (t1 - t0) * i as f64 / n as f64;
                        self.view.to_device(&Point2::new(
                            center.x + radius * a.cos(),
                            center.y + radius * a.sin(),
                        ))
                    })
                    .collect();
                self.polyline(&points, start + r * t0);
            }
            return end;
        }

        let (cx, cy) = (c.x.round() as i64, c.y.round() as i64);
        let steps = (half * 2.0).round() as i64;
        for k in 0..=steps {
            let rr = (r - half + k as f64 * 0.5).max(0.0);
            for (px, py) in midpoint_circle(cx, cy, rr) {
                let device_angle = (py as f64 - c.y).atan2(px as f64 - c.x);
                let logical = self.view.logical_angle(device_angle);
                let delta = ccw_delta(start_angle, logical);
                if range.is_some() && delta > sweep + 1e-9 && TAU - delta > 1e-9 {
                    continue;
                }
                let along = if TAU - delta <= 1e-9 { 0.0 } else { delta };
                if self.dash.is_on(start + r * along) {
                    self.pixels.insert(px, py);
                }
            }
        }
        end
    }

    /// 设备圆心 `c` 在裁剪框外时，框在圆心处张开的逻辑角区间 (起始角, 张角)
    ///
    /// 凸框不含圆心时张角小于 π，圆与框的交集全部落在这个区间里。
    fn visible_window(&self, c: Point2) -> Option<(f64, f64)> {
        let (min, max) = self.clip;
        if (min.x..=max.x).contains(&c.x) && (min.y..=max.y).contains(&c.y) {
            return None;
        }
        let corners = [min, Point2::new(max.x, min.y), max, Point2::new(min.x, max.y)];
        let angles = corners.map(|p| self.view.logical_angle((p.y - c.y).atan2(p.x - c.x)));
        let base = angles[0];
        let (lo, hi) = angles.iter().fold((0.0f64, 0.0f64), |(lo, hi), a| {
            let d = (a - base + PI).rem_euclid(TAU) - PI;
            (lo.min(d), hi.max(d))
        });
        Some((base + lo, hi - lo))
    }
}

impl Rasterizer {
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            flatness_tolerance_px: config.flatness_tolerance_px,
            dash_scale: config.dash_scale,
        }
    }

    /// 光栅化文档对象
    pub fn rasterize(
        &self,
        object: &ShapeObject,
        style: &Style,
        view: &ViewTransform,
        viewport: &Viewport,
    ) -> Vec<RenderPrimitive> {
        let mut primitive = self.rasterize_geometry(&object.geometry, style, view, viewport);
        primitive.object = Some(object.id);
        vec![primitive]
    }

    /// 光栅化任意几何（预览也走这里）
    pub fn rasterize_geometry(
        &self,
        geometry: &Geometry,
        style: &Style,
        view: &ViewTransform,
        viewport: &Viewport,
    ) -> RenderPrimitive {
        let width = style.stroke_width_px();
        let margin = width as f64 + 1.0;
        let mut stroke = Stroke {
            pixels: PixelSet::new(*viewport),
            width,
            dash: DashPattern::for_line_type(style.line_type, self.dash_scale),
            clip: (
                Point2::new(-margin, -margin),
                Point2::new(viewport.width as f64 + margin, viewport.height as f64 + margin),
            ),
            view,
            flatness: self.flatness_tolerance_px,
        };
        let dev = |p: &Point2| view.to_device(p);

        match geometry {
            Geometry::Segment(s) => {
                stroke.polyline(&[dev(&s.start), dev(&s.end)], 0.0);
            }
            Geometry::Circle(c) => {
                stroke.circle_arc(c.center, c.radius, None, 0.0);
            }
            Geometry::Arc(a) => {
                stroke.circle_arc(a.center, a.radius, Some((a.start_angle, a.sweep_angle())), 0.0);
            }
            Geometry::Spline(s) => match s.kind {
                SplineKind::Bezier => {
                    let control: Vec<Point2> = s.control_points.iter().map(dev).collect();
                    let flat = flatten_bezier(&control, self.flatness_tolerance_px);
                    stroke.polyline(&flat, 0.0);
                }
                SplineKind::RoundedPolyline => match s.path_elements() {
                    Ok(elements) => {
                        let mut distance = 0.0;
                        for element in &elements {
                            distance = match element {
                                PathElement::Segment(seg) => {
                                    stroke.polyline(&[dev(&seg.start), dev(&seg.end)], distance)
                                }
                                PathElement::Arc(arc) => stroke.circle_arc(
                                    arc.center,
                                    arc.radius,
                                    Some((arc.start_angle, arc.sweep_angle())),
                                    distance,
                                ),
                            };
                        }
                    }
                    Err(e) => {
                        warn!("rounded polyline falls back to straight segments: {}", e);
                        let points: Vec<Point2> = s.control_points.iter().map(dev).collect();
                        stroke.polyline(&points, 0.0);
                    }
                },
            },
            Geometry::Polygon(p) => {
                let points: Vec<Point2> =
                    p.vertices.iter().chain(p.vertices.first()).map(dev).collect();
                stroke.polyline(&points, 0.0);
            }
            Geometry::Rectangle(r) => {
                let points: Vec<Point2> = r.corners.iter().chain(&r.corners[..1]).map(dev).collect();
                stroke.polyline(&points, 0.0);
            }
        }

        RenderPrimitive {
            object: None,
            color: style.color,
            spans: stroke.pixels.into_spans(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compas_core::geometry::{Arc, Circle, Segment, Spline};
    use compas_core::properties::LineType;
    use std::time::{Duration, Instant};

    fn setup() -> (ViewTransform, Viewport) {
        let viewport = Viewport::new(200, 200);
        (ViewTransform::centered(&KernelConfig::default(), &viewport), viewport)
    }

    #[test]
    fn test_segment_pixels_match_bresenham() {
        let (view, viewport) = setup();
        let seg = Geometry::Segment(Segment::new(Point2::new(0.0, 0.0), Point2::new(5.0, 2.0)));
        let prim = Rasterizer::default().rasterize_geometry(&seg, &Style::default(), &view, &viewport);
        // 设备坐标 (100,100) → (105,98)
        let expected = crate::bresenham::line(100, 100, 105, 98);
        assert_eq!(prim.pixel_count(), expected.len());
        for (x, y) in expected {
            assert!(prim.contains(x, y));
        }
    }

    #[test]
    fn test_thickness_widens_stroke() {
        let (view, viewport) = setup();
        let seg = Geometry::Segment(Segment::new(Point2::new(-50.0, -20.0), Point2::new(50.0, 30.0)));
        let r = Rasterizer::default();
        let thin = r.rasterize_geometry(&seg, &Style::default(), &view, &viewport);
        let thick = r.rasterize_geometry(&seg, &Style::default().with_thickness(3.0), &view, &viewport);
        let doubled = r.rasterize_geometry(
            &seg,
            &Style::default().with_thickness(3.0).with_line_type(LineType::SolidThick),
            &view,
            &viewport,
        );
        assert!(thick.pixel_count() > thin.pixel_count() * 2);
        assert!(doubled.pixel_count() > thick.pixel_count());
    }

    #[test]
    fn test_dashed_segment_has_gaps() {
        let (view, viewport) = setup();
        let seg = Geometry::Segment(Segment::new(Point2::new(-60.0, 0.0), Point2::new(60.0, 0.0)));
        let r = Rasterizer::default();
        let solid = r.rasterize_geometry(&seg, &Style::default(), &view, &viewport);
        let dashed = r.rasterize_geometry(
            &seg,
            &Style::default().with_line_type(LineType::Dashed),
            &view,
            &viewport,
        );
        assert!(dashed.pixel_count() < solid.pixel_count());
        // 第一划 [0,10)，第一个间隙 (10,15)
        assert!(dashed.contains(45, 100));
        assert!(!dashed.contains(52, 100));
    }

    /// 在 `row` 行上检查虚线相位：`distance(x)` 给出像素 x 处的弧长
    fn assert_dash_phase(prim: &RenderPrimitive, row: i64, distance: impl Fn(f64) -> f64) {
        let dash = DashPattern::for_line_type(LineType::Dashed, 1.0);
        let mut checked = 0;
        for x in 0..800 {
            let d = distance(x as f64).rem_euclid(dash.period());
            // 避开划/隙边界附近的取整歧义
            if (1.5..8.5).contains(&d) {
                assert!(prim.contains(x, row), "pixel {} should be on (phase {})", x, d);
                checked += 1;
            } else if (11.5..13.5).contains(&d) {
                assert!(!prim.contains(x, row), "pixel {} should be off (phase {})", x, d);
                checked += 1;
            }
        }
        assert!(checked > 300);
    }

    #[test]
    fn test_long_dashed_segment_at_max_zoom() {
        let viewport = Viewport::new(800, 600);
        let mut view = ViewTransform::centered(&KernelConfig::default(), &viewport);
        view.zoom_by(60);
        let seg = Geometry::Segment(Segment::new(Point2::new(-1.0e4, 0.0), Point2::new(1.0e4, 0.0)));
        let style = Style::default().with_line_type(LineType::Dashed);

        let begin = Instant::now();
        let prim = Rasterizer::default().rasterize_geometry(&seg, &style, &view, &viewport);
        assert!(begin.elapsed() < Duration::from_secs(1), "took {:?}", begin.elapsed());

        // 屏幕外被裁掉的长度仍然计入相位
        let start_x = view.to_device(&Point2::new(-1.0e4, 0.0)).x;
        assert!(start_x < -1.0e7);
        assert_dash_phase(&prim, 300, |x| x - start_x);
        assert!(prim.pixel_count() < 800);
    }

    #[test]
    fn test_huge_dashed_circle_samples_visible_part() {
        let viewport = Viewport::new(800, 600);
        let mut view = ViewTransform::centered(&KernelConfig::default(), &viewport);
        view.zoom_by(60);
        // 顶点落在原点，设备半径远超中点画圆的上限
        let circle = Geometry::Circle(Circle::new(Point2::new(0.0, -1.0e4), 1.0e4));
        let r = view.scale_length(1.0e4);
        assert!(r > MAX_MIDPOINT_RADIUS_PX);

        let raster = Rasterizer::default();
        let begin = Instant::now();
        let solid = raster.rasterize_geometry(&circle, &Style::default(), &view, &viewport);
        let dashed = raster.rasterize_geometry(
            &circle,
            &Style::default().with_line_type(LineType::Dashed),
            &view,
            &viewport,
        );
        assert!(begin.elapsed() < Duration::from_secs(1), "took {:?}", begin.elapsed());

        assert!(solid.contains(0, 300));
        assert!(solid.contains(400, 300));
        assert!(solid.contains(799, 300));
        // 逆时针经过顶点时设备 x 递减
        assert_dash_phase(&dashed, 300, |x| r * PI / 2.0 + (400.0 - x));
    }

    #[test]
    fn test_arc_keeps_only_its_angles() {
        let (view, viewport) = setup();
        let arc = Geometry::Arc(Arc::new(Point2::origin(), 40.0, 0.0, PI / 2.0));
        let prim = Rasterizer::default().rasterize_geometry(&arc, &Style::default(), &view, &viewport);
        // 逻辑第一象限 → 设备右上方
        assert!(prim.contains(140, 100));
        assert!(prim.contains(100, 60));
        for (x, y) in prim.pixels() {
            assert!(x >= 99 && y <= 101, "({}, {}) outside the quadrant", x, y);
        }
    }

    #[test]
    fn test_circle_follows_zoom() {
        let (mut view, viewport) = setup();
        let circle = Geometry::Circle(Circle::new(Point2::origin(), 20.0));
        let r = Rasterizer::default();
        let before = r.rasterize_geometry(&circle, &Style::default(), &view, &viewport);
        view.zoom_by(5);
        let after = r.rasterize_geometry(&circle, &Style::default(), &view, &viewport);
        assert!(after.pixel_count() > before.pixel_count());
    }

    #[test]
    fn test_offscreen_circle_is_empty() {
        let (view, viewport) = setup();
        let circle = Geometry::Circle(Circle::new(Point2::new(5000.0, 5000.0), 10.0));
        let prim = Rasterizer::default().rasterize_geometry(&circle, &Style::default(), &view, &viewport);
        assert!(prim.spans.is_empty());
    }

    #[test]
    fn test_rounded_polyline_draws_fillet() {
        let (view, viewport) = setup();
        let spline = Geometry::Spline(Spline::rounded_polyline(
            vec![
                Point2::new(-50.0, 0.0),
                Point2::new(50.0, 0.0),
                Point2::new(50.0, 50.0),
            ],
            20.0,
        ));
        let prim = Rasterizer::default().rasterize_geometry(&spline, &Style::default(), &view, &viewport);
        // 尖角 (50,0) → 设备 (150,100) 被圆角替代
        assert!(!prim.contains(150, 100));
        assert!(prim.contains(120, 100));
        assert!(prim.contains(150, 70));
    }
}
