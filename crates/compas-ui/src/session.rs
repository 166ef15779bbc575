//! 构造会话状态机
//!
//! ```text
//!            begin(method)
//!   Idle ───────────────────► Pending { method, points, value }
//!    ▲                            │  push_point / push_value / finish
//!    │   对象已创建 / cancel       │
//!    └────────────────────────────┘
//! ```
//!
//! 构造失败时清空已输入的点，但保留构造方式，等待重新输入。
//! 进行中的构造只存在于会话里，从不进入文档。

use crate::action::{PreviewGeometry, SessionOutcome};
use compas_core::config::KernelConfig;
use compas_core::construct::{self, ArcSide, ConstructionInput, ConstructionMethod, PointCount};
use compas_core::document::Document;
use compas_core::error::CadError;
use compas_core::geometry::{Circle, Geometry, PolygonTag, Segment};
use compas_core::math::{midpoint, rotate_point, Point2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 进行中的构造
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConstruction {
    pub method: ConstructionMethod,
    pub points: Vec<Point2>,
    /// 数值输入：半径、圆角半径或多边形边数，取决于构造方式
    pub value: Option<f64>,
    /// 矩形的宽高输入
    pub dimensions: Option<(f64, f64)>,
}

impl PendingConstruction {
    fn new(method: ConstructionMethod) -> Self {
        Self {
            method,
            points: Vec::new(),
            value: None,
            dimensions: None,
        }
    }

    fn clear_input(&mut self) {
        self.points.clear();
        self.value = None;
        self.dimensions = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Pending(PendingConstruction),
}

/// 构造方式是否接受数值输入
fn accepts_value(method: ConstructionMethod) -> bool {
    matches!(
        method,
        ConstructionMethod::CircleCenterRadius
            | ConstructionMethod::ArcRadiusChord
            | ConstructionMethod::SplineRoundedPolyline
            | ConstructionMethod::PolygonCircumscribed
            | ConstructionMethod::PolygonInscribed
    )
}

/// 按矩形旋转角把对角向量转回矩形自身坐标系
fn unrotated(from: Point2, to: Point2, rotation: f64) -> (f64, f64) {
    let local = rotate_point(to, from, -rotation) - from;
    (local.x, local.y)
}

/// 把已收集的输入组装成构造输入
///
/// `finishing` 为 true 时可变点数的构造也可以完成。信息不足时返回 None。
fn assemble(
    pending: &PendingConstruction,
    points: &[Point2],
    finishing: bool,
    config: &KernelConfig,
) -> Option<ConstructionInput> {
    use ConstructionMethod::*;

    let value = pending.value;
    match (pending.method, points) {
        (SegmentTwoPoints, [start, end]) => Some(ConstructionInput::Segment {
            start: *start,
            end: *end,
        }),
        (CircleCenterRadius, [center]) => value.map(|radius| {
            ConstructionInput::CircleCenterRadius {
                center: *center,
                radius,
            }
        }),
        (CircleCenterRadius, [center, on_circle]) => Some(ConstructionInput::CircleCenterRadius {
            center: *center,
            radius: (*on_circle - *center).norm(),
        }),
        (CircleThreePoints, [p1, p2, p3]) => Some(ConstructionInput::CircleThreePoints {
            p1: *p1,
            p2: *p2,
            p3: *p3,
        }),
        (ArcThreePoints, [start, through, end]) => Some(ConstructionInput::ArcThreePoints {
            start: *start,
            through: *through,
            end: *end,
        }),
        (ArcRadiusChord, [a, b]) => value.map(|radius| ConstructionInput::ArcRadiusChord {
            chord_start: *a,
            chord_end: *b,
            radius,
            side: config.arc_side,
        }),
        // 第三点决定凸出方向，到弦中点的距离作为半径（不小于半弦长）
        (ArcRadiusChord, [a, b, pick]) => {
            let chord = *b - *a;
            let offset = *pick - *a;
            let side = if chord.x * offset.y - chord.y * offset.x >= 0.0 {
                ArcSide::Left
            } else {
                ArcSide::Right
            };
            let radius = (*pick - midpoint(*a, *b)).norm().max(chord.norm() / 2.0);
            Some(ConstructionInput::ArcRadiusChord {
                chord_start: *a,
                chord_end: *b,
                radius,
                side,
            })
        }
        (SplineBezier, pts) if finishing && pts.len() >= 2 => {
            Some(ConstructionInput::SplineBezier {
                control_points: pts.to_vec(),
            })
        }
        (SplineRoundedPolyline, pts) if finishing && pts.len() >= 2 => {
            Some(ConstructionInput::SplineRoundedPolyline {
                points: pts.to_vec(),
                rounding_radius: value.unwrap_or(config.rounding_radius),
            })
        }
        (PolygonFree, pts) if finishing && pts.len() >= 3 => Some(ConstructionInput::PolygonFree {
            vertices: pts.to_vec(),
        }),
        (PolygonCircumscribed | PolygonInscribed, [center, on_circle]) => {
            let v = *on_circle - *center;
            // push_value 已保证是不超过上限的非负整数
            let sides = value.map(|n| n as usize).unwrap_or(config.polygon_sides);
            Some(ConstructionInput::PolygonRegular {
                circle: Circle::new(*center, v.norm()),
                sides,
                tag: if pending.method == PolygonInscribed {
                    PolygonTag::Inscribed
                } else {
                    PolygonTag::Circumscribed
                },
                start_angle: v.y.atan2(v.x),
            })
        }
        (RectangleBySides, [corner]) => {
            pending
                .dimensions
                .map(|(width, height)| ConstructionInput::RectangleBySides {
                    corner: *corner,
                    width,
                    height,
                    rotation: config.rectangle_rotation,
                })
        }
        (RectangleBySides, [corner, opposite]) => {
            let (width, height) = unrotated(*corner, *opposite, config.rectangle_rotation);
            Some(ConstructionInput::RectangleBySides {
                corner: *corner,
                width,
                height,
                rotation: config.rectangle_rotation,
            })
        }
        (RectangleFromCenter, [center]) => {
            pending
                .dimensions
                .map(|(width, height)| ConstructionInput::RectangleFromCenter {
                    center: *center,
                    width,
                    height,
                    rotation: config.rectangle_rotation,
                })
        }
        (RectangleFromCenter, [center, corner]) => {
            let (dx, dy) = unrotated(*center, *corner, config.rectangle_rotation);
            Some(ConstructionInput::RectangleFromCenter {
                center: *center,
                width: 2.0 * dx.abs(),
                height: 2.0 * dy.abs(),
                rotation: config.rectangle_rotation,
            })
        }
        _ => None,
    }
}

/// 交互构造会话
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructionSession {
    state: SessionState,
}

impl ConstructionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    pub fn method(&self) -> Option<ConstructionMethod> {
        match &self.state {
            SessionState::Pending(p) => Some(p.method),
            SessionState::Idle => None,
        }
    }

    /// 当前构造是否接受数值输入
    pub fn accepts_value(&self) -> bool {
        self.method().is_some_and(accepts_value)
    }

    /// 当前步骤是否可以输入矩形宽高
    pub fn expects_dimensions(&self) -> bool {
        matches!(
            self.method(),
            Some(ConstructionMethod::RectangleBySides | ConstructionMethod::RectangleFromCenter)
        ) && self.points().len() == 1
    }

    /// 已输入的点
    pub fn points(&self) -> &[Point2] {
        match &self.state {
            SessionState::Pending(p) => &p.points,
            SessionState::Idle => &[],
        }
    }

    /// 开始新的构造；正在进行的构造被丢弃
    pub fn begin(&mut self, method: ConstructionMethod) {
        debug!("begin {}", method.display_name());
        self.state = SessionState::Pending(PendingConstruction::new(method));
    }

    /// 取消，回到空闲；文档不受影响
    pub fn cancel(&mut self) -> SessionOutcome {
        match std::mem::take(&mut self.state) {
            SessionState::Idle => SessionOutcome::Ignored,
            SessionState::Pending(p) => {
                debug!("cancel {} with {} points", p.method.display_name(), p.points.len());
                SessionOutcome::Cancelled
            }
        }
    }

    pub fn push_point(&mut self, point: Point2, document: &mut Document) -> SessionOutcome {
        let SessionState::Pending(pending) = &mut self.state else {
            return SessionOutcome::Ignored;
        };
        pending.points.push(point);
        self.try_complete(document, false)
    }

    pub fn push_value(&mut self, value: f64, document: &mut Document) -> SessionOutcome {
        if !self.accepts_value() {
            return SessionOutcome::Ignored;
        }
        let SessionState::Pending(pending) = &mut self.state else {
            return SessionOutcome::Ignored;
        };
        if !value.is_finite() {
            return SessionOutcome::Failed(CadError::invalid(format!(
                "value must be finite, got {}",
                value
            )));
        }
        if matches!(
            pending.method,
            ConstructionMethod::PolygonCircumscribed | ConstructionMethod::PolygonInscribed
        ) {
            let max = document.config().max_polygon_sides;
            if value.fract() != 0.0 || value < 0.0 || value > max as f64 {
                let err = CadError::invalid(format!(
                    "polygon sides must be a whole number up to {}, got {}",
                    max, value
                ));
                warn!("{}", err);
                return SessionOutcome::Failed(err);
            }
        }
        pending.value = Some(value);
        self.try_complete(document, false)
    }

    /// 矩形的宽高输入，需要先给出角点或中心
    pub fn push_dimensions(
        &mut self,
        width: f64,
        height: f64,
        document: &mut Document,
    ) -> SessionOutcome {
        if !self.expects_dimensions() {
            return SessionOutcome::Ignored;
        }
        let SessionState::Pending(pending) = &mut self.state else {
            return SessionOutcome::Ignored;
        };
        pending.dimensions = Some((width, height));
        self.try_complete(document, false)
    }

    /// 结束可变点数的构造（贝塞尔、圆角多段线、自由多边形）
    pub fn finish(&mut self, document: &mut Document) -> SessionOutcome {
        let SessionState::Pending(pending) = &mut self.state else {
            return SessionOutcome::Ignored;
        };
        match pending.method.point_count() {
            PointCount::Exact(_) => SessionOutcome::Ignored,
            PointCount::AtLeast(min) if pending.points.len() < min => {
                let err = CadError::degenerate(format!(
                    "{} needs at least {} points, got {}",
                    pending.method.display_name(),
                    min,
                    pending.points.len()
                ));
                warn!("{}", err);
                pending.clear_input();
                SessionOutcome::Failed(err)
            }
            PointCount::AtLeast(_) => self.try_complete(document, true),
        }
    }

    fn try_complete(&mut self, document: &mut Document, finishing: bool) -> SessionOutcome {
        let SessionState::Pending(pending) = &mut self.state else {
            return SessionOutcome::Ignored;
        };
        let Some(input) = assemble(pending, &pending.points, finishing, document.config()) else {
            return SessionOutcome::Continue;
        };

        match document.create_object(&input) {
            Ok((id, warnings)) => {
                self.state = SessionState::Idle;
                SessionOutcome::Created { id, warnings }
            }
            Err(err) => {
                warn!("{} failed: {}", pending.method.display_name(), err);
                pending.clear_input();
                SessionOutcome::Failed(err)
            }
        }
    }

    /// 当前步骤的提示文本
    pub fn prompt(&self) -> &'static str {
        use ConstructionMethod::*;

        let SessionState::Pending(pending) = &self.state else {
            return "命令:";
        };
        let n = pending.points.len();
        match (pending.method, n) {
            (SegmentTwoPoints, 0) => "指定起点:",
            (SegmentTwoPoints, _) => "指定终点:",
            (CircleCenterRadius, 0) => "指定圆心:",
            (CircleCenterRadius, _) => "指定圆上一点 或 输入半径:",
            (CircleThreePoints | ArcThreePoints, 0) => "指定第一点:",
            (CircleThreePoints | ArcThreePoints, 1) => "指定第二点:",
            (CircleThreePoints | ArcThreePoints, _) => "指定第三点:",
            (ArcRadiusChord, 0) => "指定弦起点:",
            (ArcRadiusChord, 1) => "指定弦终点:",
            (ArcRadiusChord, _) => "输入半径 或 指定凸出方向上的点:",
            (SplineBezier, _) => "指定控制点 (右键结束):",
            (SplineRoundedPolyline, _) => "指定折线顶点 (右键结束) 或 输入圆角半径:",
            (PolygonFree, _) => "指定顶点 (右键结束):",
            (PolygonCircumscribed | PolygonInscribed, 0) => "指定生成圆圆心 或 输入边数:",
            (PolygonCircumscribed | PolygonInscribed, _) => "指定圆上一点 (第一个顶点方向):",
            (RectangleBySides, 0) => "指定角点:",
            (RectangleFromCenter, 0) => "指定中心:",
            (RectangleBySides | RectangleFromCenter, _) => "指定对角点 或 输入宽,高:",
        }
    }

    /// 以光标位置作为下一个输入点时的预览
    pub fn preview(&self, cursor: Point2, config: &KernelConfig) -> Vec<PreviewGeometry> {
        let SessionState::Pending(pending) = &self.state else {
            return Vec::new();
        };
        let mut previews = Vec::new();

        let mut points = pending.points.clone();
        points.push(cursor);
        match assemble(pending, &points, true, config).map(|input| construct::build(&input)) {
            Some(Ok(built)) => previews.push(PreviewGeometry::new(built.geometry)),
            _ => {
                // 无法成形时画出已输入点之间的参考折线
                for w in points.windows(2) {
                    previews.push(PreviewGeometry::reference(Geometry::Segment(Segment::new(
                        w[0], w[1],
                    ))));
                }
            }
        }
        previews
    }
}
