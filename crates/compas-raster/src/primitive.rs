//! 渲染输出：像素扫描段、图元、标注锚点

use compas_core::entity::ObjectId;
use compas_core::math::Point2;
use compas_core::properties::Color;
use compas_core::view::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 同一行上连续的像素 `[x_start, x_end]`（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSpan {
    pub y: i64,
    pub x_start: i64,
    pub x_end: i64,
}

impl PixelSpan {
    pub fn len(&self) -> usize {
        (self.x_end - self.x_start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.x_end < self.x_start
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        y == self.y && x >= self.x_start && x <= self.x_end
    }
}

/// 一组同色像素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPrimitive {
    /// 来源对象；网格和预览为 None
    pub object: Option<ObjectId>,
    pub color: Color,
    pub spans: Vec<PixelSpan>,
}

impl RenderPrimitive {
    pub fn pixel_count(&self) -> usize {
        self.spans.iter().map(PixelSpan::len).sum()
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.spans.iter().any(|s| s.contains(x, y))
    }

    /// 展开为 `(x, y)` 像素
    pub fn pixels(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.spans
            .iter()
            .flat_map(|s| (s.x_start..=s.x_end).map(move |x| (x, s.y)))
    }
}

/// 尺寸标注文本（设备坐标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnchor {
    pub object: ObjectId,
    pub position: Point2,
    pub text: String,
}

/// 一帧的全部输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub primitives: Vec<RenderPrimitive>,
    pub grid: Vec<RenderPrimitive>,
    pub labels: Vec<TextAnchor>,
}

impl Frame {
    pub fn primitive_for(&self, id: ObjectId) -> Option<&RenderPrimitive> {
        self.primitives.iter().find(|p| p.object == Some(id))
    }
}

/// 去重并裁剪到视口的像素集合，按 (y, x) 排序后合并为扫描段
#[derive(Debug, Clone)]
pub struct PixelSet {
    pixels: BTreeSet<(i64, i64)>,
    viewport: Viewport,
}

impl PixelSet {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            pixels: BTreeSet::new(),
            viewport,
        }
    }

    pub fn insert(&mut self, x: i64, y: i64) {
        if self.viewport.contains(x, y) {
            self.pixels.insert((y, x));
        }
    }

    pub fn extend(&mut self, pixels: impl IntoIterator<Item = (i64, i64)>) {
        for (x, y) in pixels {
            self.insert(x, y);
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn into_spans(self) -> Vec<PixelSpan> {
        let mut spans: Vec<PixelSpan> = Vec::new();
        for (y, x) in self.pixels {
            match spans.last_mut() {
                Some(last) if last.y == y && last.x_end + 1 == x => last.x_end = x,
                _ => spans.push(PixelSpan {
                    y,
                    x_start: x,
                    x_end: x,
                }),
            }
        }
        spans
    }
}
