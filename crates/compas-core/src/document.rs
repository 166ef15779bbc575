//! 文档：对象序列、默认样式与视图
//!
//! 对象按插入顺序存放，顺序即绘制顺序和点选优先级（后插入的在上层）。
//! 默认样式只有一份；`StyleRef::Inherited` 的对象在每次读取时都解析到它。

use crate::config::KernelConfig;
use crate::construct::{self, ConstructionInput, ConstructionMethod, ConstructionWarning};
use crate::entity::{ObjectId, ShapeObject};
use crate::error::{CadError, Result};
use crate::geometry::{Geometry, PolygonTag, SplineKind};
use crate::math::Point2;
use crate::properties::{Style, StyleRef, StyleScope};
use crate::view::ViewTransform;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 构造树中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRow {
    pub index: usize,
    pub id: ObjectId,
    pub name: &'static str,
    /// 参数摘要
    pub summary: String,
    pub line_type: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    objects: Vec<ShapeObject>,
    default_style: Style,
    pub view: ViewTransform,
    config: KernelConfig,
    next_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl Document {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            objects: Vec::new(),
            default_style: config.default_style,
            view: ViewTransform::from_config(&config),
            config,
            next_id: 1,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn default_style(&self) -> &Style {
        &self.default_style
    }

    pub fn objects(&self) -> &[ShapeObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, id: ObjectId) -> Option<&ShapeObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut ShapeObject> {
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(CadError::UnknownObjectReference(id))
    }

    /// 对象的有效样式（继承的对象解析到当前默认样式）
    pub fn effective_style<'a>(&'a self, object: &'a ShapeObject) -> &'a Style {
        object.effective_style(&self.default_style)
    }

    /// 运行构造器，成功后插入新对象
    ///
    /// 警告不阻止创建，随新对象的 ID 一起返回给调用方。
    pub fn create_object(
        &mut self,
        input: &ConstructionInput,
    ) -> Result<(ObjectId, Vec<ConstructionWarning>)> {
        self.check_limits(input)?;
        let built = construct::build(input)?;
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let method = input.method();
        debug!("create {} {} ({} warnings)", method.display_name(), id, built.warnings.len());
        self.objects.push(ShapeObject::new(id, method, built.geometry));
        Ok((id, built.warnings))
    }

    /// 超出配置上限的构造输入在分配顶点之前就拒绝
    fn check_limits(&self, input: &ConstructionInput) -> Result<()> {
        if let ConstructionInput::PolygonRegular { sides, .. } = input {
            let max = self.config.max_polygon_sides;
            if *sides > max {
                return Err(CadError::invalid(format!(
                    "polygon sides must be at most {}, got {}",
                    max, sides
                )));
            }
        }
        Ok(())
    }

    /// 用新的构造输入重算几何，图元种类必须不变
    pub fn edit_geometry(&mut self, id: ObjectId, input: &ConstructionInput) -> Result<()> {
        self.check_limits(input)?;
        let object = self.object_mut(id)?;
        let method = input.method();
        if method.kind() != object.kind() {
            return Err(CadError::invalid(format!(
                "cannot edit {} {} with a {} construction",
                object.kind().name(),
                id,
                method.kind().name()
            )));
        }
        let built = construct::build(input)?;
        object.method = method;
        object.geometry = built.geometry;
        object.touch();
        debug!("edit geometry {} via {}", id, method.display_name());
        Ok(())
    }

    /// 直接设置规范参数（属性面板编辑）
    pub fn set_geometry(&mut self, id: ObjectId, geometry: Geometry) -> Result<()> {
        construct::validate(&geometry)?;
        let object = self.object_mut(id)?;
        if geometry.kind() != object.kind() {
            return Err(CadError::invalid(format!(
                "cannot replace {} {} with a {}",
                object.kind().name(),
                id,
                geometry.type_name()
            )));
        }
        object.geometry = geometry;
        object.touch();
        debug!("set geometry {}", id);
        Ok(())
    }

    /// 修改样式
    ///
    /// `ThisOnly` 把目标对象转为自有样式；`Default` 替换默认样式，所有继承
    /// 默认样式的对象立即受影响，持有自有样式的对象不变。
    pub fn edit_style(
        &mut self,
        target: Option<ObjectId>,
        style: Style,
        scope: StyleScope,
    ) -> Result<()> {
        style.validate()?;
        match scope {
            StyleScope::ThisOnly => {
                let id = target.ok_or_else(|| {
                    CadError::invalid("object style edit needs a target object")
                })?;
                let object = self.object_mut(id)?;
                object.style = StyleRef::Owned(style);
                object.touch();
                debug!("style {} -> owned {:?}", id, style);
            }
            StyleScope::Default => {
                if let Some(id) = target {
                    self.object_mut(id)?;
                }
                self.default_style = style;
                let mut affected = 0;
                for object in self.objects.iter_mut().filter(|o| o.style.is_inherited()) {
                    object.touch();
                    affected += 1;
                }
                debug!("default style -> {:?}, {} objects inherit it", style, affected);
            }
        }
        Ok(())
    }

    /// 恢复为继承默认样式
    pub fn reset_style(&mut self, id: ObjectId) -> Result<()> {
        let object = self.object_mut(id)?;
        if !object.style.is_inherited() {
            object.style = StyleRef::Inherited;
            object.touch();
        }
        Ok(())
    }

    /// 绕对象的参考中心旋转（角度制）
    pub fn rotate_object(&mut self, id: ObjectId, degrees: f64) -> Result<()> {
        if !degrees.is_finite() {
            return Err(CadError::invalid(format!("rotation must be finite, got {}", degrees)));
        }
        let object = self.object_mut(id)?;
        let center = object.geometry.reference_center();
        object.geometry.rotate_about(center, degrees.to_radians());
        object.touch();
        debug!("rotate {} by {}°", id, degrees);
        Ok(())
    }

    pub fn set_show_label(&mut self, id: ObjectId, show: bool) -> Result<()> {
        let object = self.object_mut(id)?;
        if object.show_label != show {
            object.show_label = show;
            object.touch();
        }
        Ok(())
    }

    pub fn delete_object(&mut self, id: ObjectId) -> Result<ShapeObject> {
        let index = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or(CadError::UnknownObjectReference(id))?;
        debug!("delete {}", id);
        Ok(self.objects.remove(index))
    }

    /// 点选：返回设备点容差范围内最上层的对象
    pub fn hit_test(&self, device_point: Point2) -> Option<ObjectId> {
        let zoom = self.view.zoom();
        let logical = self.view.to_logical(&device_point);
        self.objects.iter().rev().find_map(|object| {
            let half_width = self.effective_style(object).stroke_width_px() as f64 / 2.0;
            let tolerance = (self.config.hit_tolerance_px + half_width) / zoom;
            object
                .geometry
                .contains_point(&logical, tolerance)
                .then_some(object.id)
        })
    }

    /// 构造树：每个对象一行
    pub fn construction_tree(&self) -> Vec<TreeRow> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| TreeRow {
                index,
                id: object.id,
                name: object.method.display_name(),
                summary: parameter_summary(
                    object.method,
                    &object.geometry,
                    self.config.label_precision,
                ),
                line_type: self.effective_style(object).line_type.name(),
            })
            .collect()
    }
}

fn fmt_point(p: &Point2, precision: usize) -> String {
    format!("({:.*}, {:.*})", precision, p.x, precision, p.y)
}

fn parameter_summary(method: ConstructionMethod, geometry: &Geometry, precision: usize) -> String {
    let pt = |p: &Point2| fmt_point(p, precision);
    match geometry {
        Geometry::Segment(s) => format!("{} - {}", pt(&s.start), pt(&s.end)),
        Geometry::Circle(c) => format!("C{} R{:.*}", pt(&c.center), precision, c.radius),
        Geometry::Arc(a) => format!(
            "C{} R{:.*} {:.*}°..{:.*}°",
            pt(&a.center),
            precision,
            a.radius,
            precision,
            a.start_angle.to_degrees(),
            precision,
            a.end_angle.to_degrees()
        ),
        Geometry::Spline(s) => match s.kind {
            SplineKind::Bezier => format!("{} control points", s.control_points.len()),
            SplineKind::RoundedPolyline => format!(
                "{} points, r={:.*}",
                s.control_points.len(),
                precision,
                s.rounding_radius
            ),
        },
        Geometry::Polygon(p) => match (&p.tag, &p.generating_circle) {
            (PolygonTag::Free, _) | (_, None) => format!("{} vertices", p.vertices.len()),
            (_, Some(c)) => format!(
                "n={} C{} R{:.*}",
                p.vertices.len(),
                pt(&c.center),
                precision,
                c.radius
            ),
        },
        Geometry::Rectangle(r) => {
            let size = format!("{:.*} x {:.*}", precision, r.width(), precision, r.height());
            match method {
                ConstructionMethod::RectangleFromCenter => format!("C{} {}", pt(&r.center()), size),
                _ => format!("{} {}", pt(&r.corners[0]), size),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Segment};
    use crate::properties::{Color, LineType};

    fn segment(x1: f64, y1: f64, x2: f64, y2: f64) -> ConstructionInput {
        ConstructionInput::Segment {
            start: Point2::new(x1, y1),
            end: Point2::new(x2, y2),
        }
    }

    #[test]
    fn test_default_thickness_propagates_to_inheriting_only() {
        let mut doc = Document::default();
        let inherited = doc.create_object(&segment(0.0, 0.0, 10.0, 0.0)).unwrap().0;
        let owned = doc.create_object(&segment(0.0, 5.0, 10.0, 5.0)).unwrap().0;
        doc.edit_style(Some(owned), Style::default().with_thickness(1.0), StyleScope::ThisOnly)
            .unwrap();

        let owned_revision = doc.object(owned).unwrap().revision;
        let inherited_revision = doc.object(inherited).unwrap().revision;

        doc.edit_style(None, Style::default().with_thickness(3.0), StyleScope::Default)
            .unwrap();

        let a = doc.object(inherited).unwrap();
        let b = doc.object(owned).unwrap();
        assert_eq!(doc.effective_style(a).stroke_width_px(), 3);
        assert_eq!(doc.effective_style(b).stroke_width_px(), 1);
        assert_eq!(a.revision, inherited_revision + 1);
        assert_eq!(b.revision, owned_revision);
    }

    #[test]
    fn test_reset_style_relinks_to_default() {
        let mut doc = Document::default();
        let id = doc.create_object(&segment(0.0, 0.0, 1.0, 0.0)).unwrap().0;
        let red = Style::default().with_color(Color::RED);
        doc.edit_style(Some(id), red, StyleScope::ThisOnly).unwrap();
        assert_eq!(doc.effective_style(doc.object(id).unwrap()).color, Color::RED);

        doc.reset_style(id).unwrap();
        doc.edit_style(
            None,
            Style::default().with_line_type(LineType::Dashed),
            StyleScope::Default,
        )
        .unwrap();
        let style = doc.effective_style(doc.object(id).unwrap());
        assert_eq!(style.line_type, LineType::Dashed);
        assert_eq!(style.color, Color::BLACK);
    }

    #[test]
    fn test_invalid_thickness_rejected() {
        let mut doc = Document::default();
        let result = doc.edit_style(
            None,
            Style::default().with_thickness(0.0),
            StyleScope::Default,
        );
        assert!(matches!(result, Err(CadError::InvalidParameter(_))));
        assert_eq!(doc.default_style().thickness, 1.0);
    }

    #[test]
    fn test_unknown_object_reference() {
        let mut doc = Document::default();
        let missing = ObjectId(42);
        assert_eq!(
            doc.delete_object(missing),
            Err(CadError::UnknownObjectReference(missing))
        );
        assert!(matches!(
            doc.rotate_object(missing, 90.0),
            Err(CadError::UnknownObjectReference(_))
        ));
        assert!(matches!(
            doc.edit_style(Some(missing), Style::default(), StyleScope::ThisOnly),
            Err(CadError::UnknownObjectReference(_))
        ));
    }

    #[test]
    fn test_failed_construction_leaves_document_unchanged() {
        let mut doc = Document::default();
        let result = doc.create_object(&ConstructionInput::CircleCenterRadius {
            center: Point2::origin(),
            radius: -1.0,
        });
        assert!(matches!(result, Err(CadError::DegenerateGeometry(_))));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_edit_geometry_same_kind_only() {
        let mut doc = Document::default();
        let id = doc
            .create_object(&ConstructionInput::CircleCenterRadius {
                center: Point2::origin(),
                radius: 1.0,
            })
            .unwrap()
            .0;
        doc.edit_geometry(
            id,
            &ConstructionInput::CircleThreePoints {
                p1: Point2::new(0.0, 0.0),
                p2: Point2::new(2.0, 0.0),
                p3: Point2::new(1.0, 1.0),
            },
        )
        .unwrap();
        let obj = doc.object(id).unwrap();
        assert_eq!(obj.method, ConstructionMethod::CircleThreePoints);
        assert_eq!(obj.revision, 1);

        let wrong = doc.edit_geometry(id, &segment(0.0, 0.0, 1.0, 1.0));
        assert!(matches!(wrong, Err(CadError::InvalidParameter(_))));
        assert!(doc
            .set_geometry(id, Geometry::Circle(Circle::new(Point2::origin(), 0.0)))
            .is_err());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut doc = Document::default();
        let below = doc.create_object(&segment(-10.0, 0.0, 10.0, 0.0)).unwrap().0;
        let above = doc.create_object(&segment(0.0, -10.0, 0.0, 10.0)).unwrap().0;
        let origin = doc.view.to_device(&Point2::origin());
        assert_eq!(doc.hit_test(origin), Some(above));

        let on_below = doc.view.to_device(&Point2::new(8.0, 0.0));
        assert_eq!(doc.hit_test(on_below), Some(below));
        let empty = doc.view.to_device(&Point2::new(8.0, 8.0));
        assert_eq!(doc.hit_test(empty), None);
    }

    #[test]
    fn test_rotate_object_about_midpoint() {
        let mut doc = Document::default();
        let id = doc.create_object(&segment(0.0, 0.0, 2.0, 0.0)).unwrap().0;
        doc.rotate_object(id, 90.0).unwrap();
        let Geometry::Segment(Segment { start, end }) = &doc.object(id).unwrap().geometry else {
            panic!("expected segment");
        };
        assert!((start - Point2::new(1.0, -1.0)).norm() < 1e-12);
        assert!((end - Point2::new(1.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_create_reports_warnings() {
        let mut doc = Document::default();
        let (id, warnings) = doc.create_object(&segment(3.0, 3.0, 3.0, 3.0)).unwrap();
        assert_eq!(warnings, vec![ConstructionWarning::ZeroLengthSegment]);
        assert!(doc.object(id).is_some());

        let (_, warnings) = doc.create_object(&segment(0.0, 0.0, 3.0, 3.0)).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_polygon_sides_limit() {
        let mut doc = Document::default();
        let polygon = |sides| ConstructionInput::PolygonRegular {
            circle: Circle::new(Point2::origin(), 1.0),
            sides,
            tag: PolygonTag::Circumscribed,
            start_angle: 0.0,
        };
        let result = doc.create_object(&polygon(usize::MAX));
        assert!(matches!(result, Err(CadError::InvalidParameter(_))));
        assert!(doc.is_empty());

        let (id, _) = doc.create_object(&polygon(1024)).unwrap();
        assert!(matches!(
            doc.edit_geometry(id, &polygon(1025)),
            Err(CadError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_construction_tree_rows() {
        let mut doc = Document::default();
        doc.create_object(&ConstructionInput::CircleThreePoints {
            p1: Point2::new(0.0, 0.0),
            p2: Point2::new(2.0, 0.0),
            p3: Point2::new(1.0, 1.0),
        })
        .unwrap();
        doc.create_object(&segment(0.0, 0.0, 1.0, 0.0)).unwrap();

        let rows = doc.construction_tree();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Circle by 3 Points");
        assert_eq!(rows[0].summary, "C(1.00, 0.00) R1.00");
        assert_eq!(rows[1].name, "Line");
        assert_eq!(rows[1].line_type, "Solid");
    }
}
