//! Compas 二维几何建模内核
//!
//! 把高层构造意图（两点线段、三点圆、弦+半径圆弧……）计算为精确的规范几何参数，
//! 以可编辑对象的形式保存，并在平移/缩放/旋转视图下提供坐标变换。
//!
//! # 架构设计
//!
//! - `construct`: 构造器，纯函数，输入 → 规范几何或 [`error::CadError`]
//! - `document`: 对象序列、默认样式与视图
//! - `properties`: 线型、线宽、颜色，`StyleRef` 实现默认样式的实时继承
//! - `view` / `coords`: 设备坐标与逻辑坐标、笛卡尔与极坐标之间的转换
//!
//! # 示例
//!
//! ```rust
//! use compas_core::prelude::*;
//!
//! let mut doc = Document::default();
//! let (id, warnings) = doc
//!     .create_object(&ConstructionInput::CircleThreePoints {
//!         p1: Point2::new(0.0, 0.0),
//!         p2: Point2::new(2.0, 0.0),
//!         p3: Point2::new(1.0, 1.0),
//!     })
//!     .unwrap();
//! assert!(warnings.is_empty());
//! assert_eq!(doc.object(id).unwrap().kind(), ShapeKind::Circle);
//! ```

pub mod config;
pub mod construct;
pub mod coords;
pub mod document;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod input_parser;
pub mod math;
pub mod properties;
pub mod view;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::config::KernelConfig;
    pub use crate::construct::{
        ArcSide, ConstructionInput, ConstructionMethod, ConstructionWarning, PointCount,
    };
    pub use crate::coords::CoordinateMode;
    pub use crate::document::{Document, TreeRow};
    pub use crate::entity::{ObjectId, ShapeObject};
    pub use crate::error::{CadError, Result};
    pub use crate::geometry::{
        Arc, Circle, Geometry, PathElement, Polygon, PolygonTag, Rectangle, Segment, ShapeKind,
        Spline, SplineKind,
    };
    pub use crate::input_parser::{InputParser, InputValue, ParseError};
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::properties::{Color, LineType, Style, StyleRef, StyleScope};
    pub use crate::view::{ViewTransform, Viewport};
}
