//! Compas 光栅化器
//!
//! 几何 → 像素是单向的：从不根据像素反推几何。
//!
//! - `bresenham`: 整数增量直线与中点画圆
//! - `dash`: 线型对应的虚线图案（设备像素）
//! - `rasterizer`: 单个对象的扫描转换
//! - `grid`: 坐标轴与刻度叠加层
//! - `renderer`: 帧渲染与按对象的光栅缓存

pub mod bresenham;
pub mod dash;
pub mod grid;
pub mod primitive;
pub mod rasterizer;
pub mod renderer;

pub use dash::DashPattern;
pub use grid::GridOverlay;
pub use primitive::{Frame, PixelSpan, RenderPrimitive, TextAnchor};
pub use rasterizer::Rasterizer;
pub use renderer::{CacheStats, Renderer};
