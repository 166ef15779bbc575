//! 文档中的图形对象

use crate::construct::ConstructionMethod;
use crate::geometry::{Geometry, ShapeKind};
use crate::properties::{Style, StyleRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 对象唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 图形对象
///
/// 几何始终是完全解析后的规范参数；样式通过 [`StyleRef`] 引用默认样式或自有样式。
/// `revision` 在几何或有效样式每次变化时递增，作为光栅缓存的键。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeObject {
    pub id: ObjectId,
    pub method: ConstructionMethod,
    pub geometry: Geometry,
    pub style: StyleRef,
    /// 是否显示尺寸标注
    pub show_label: bool,
    pub revision: u64,
}

impl ShapeObject {
    pub(crate) fn new(id: ObjectId, method: ConstructionMethod, geometry: Geometry) -> Self {
        Self {
            id,
            method,
            geometry,
            style: StyleRef::Inherited,
            show_label: false,
            revision: 0,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.method.kind()
    }

    /// 解析有效样式
    pub fn effective_style<'a>(&'a self, default: &'a Style) -> &'a Style {
        self.style.resolve(default)
    }

    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Circle;
    use crate::math::Point2;

    #[test]
    fn test_object_id_display() {
        assert_eq!(ObjectId(7).to_string(), "#7");
    }

    #[test]
    fn test_kind_follows_method() {
        let obj = ShapeObject::new(
            ObjectId(1),
            ConstructionMethod::CircleThreePoints,
            Geometry::Circle(Circle::new(Point2::origin(), 1.0)),
        );
        assert_eq!(obj.kind(), ShapeKind::Circle);
        assert!(obj.style.is_inherited());
        assert_eq!(obj.revision, 0);
    }
}
