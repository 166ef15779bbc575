//! 帧渲染器
//!
//! 对每个对象按 `(revision, 视图, 视口)` 缓存光栅结果。几何或有效样式变化时
//! 对象的 revision 递增（包括默认样式修改影响到的继承对象），视图变化时视图键
//! 改变，两者都会让缓存失效。

use crate::grid::GridOverlay;
use crate::primitive::{Frame, RenderPrimitive, TextAnchor};
use crate::rasterizer::Rasterizer;
use compas_core::config::KernelConfig;
use compas_core::document::Document;
use compas_core::entity::ObjectId;
use compas_core::geometry::Geometry;
use compas_core::properties::Style;
use compas_core::view::{ViewKey, ViewTransform, Viewport};
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Clone)]
struct CacheEntry {
    revision: u64,
    view: ViewKey,
    viewport: Viewport,
    primitives: Vec<RenderPrimitive>,
}

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub cached_objects: usize,
}

pub struct Renderer {
    rasterizer: Rasterizer,
    grid: GridOverlay,
    pub grid_visible: bool,
    label_precision: usize,
    cache: HashMap<ObjectId, CacheEntry>,
    stats: CacheStats,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_config(&KernelConfig::default())
    }
}

impl Renderer {
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            rasterizer: Rasterizer::from_config(config),
            grid: GridOverlay::from_config(config),
            grid_visible: true,
            label_precision: config.label_precision,
            cache: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    /// 替换光栅参数，清空缓存
    pub fn set_rasterizer(&mut self, rasterizer: Rasterizer) {
        self.rasterizer = rasterizer;
        self.invalidate_all();
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cached_objects: self.cache.len(),
            ..self.stats
        }
    }

    /// 渲染一帧：对象图元（按插入顺序）、网格和尺寸标注
    pub fn render_frame(&mut self, document: &Document, viewport: &Viewport) -> Frame {
        let view = &document.view;
        let view_key = view.cache_key();

        let alive: HashSet<ObjectId> = document.objects().iter().map(|o| o.id).collect();
        self.cache.retain(|id, _| alive.contains(id));

        let mut frame = Frame::default();
        for object in document.objects() {
            let hit = self.cache.get(&object.id).filter(|entry| {
                entry.revision == object.revision
                    && entry.view == view_key
                    && entry.viewport == *viewport
            });

            match hit {
                Some(entry) => {
                    self.stats.hits += 1;
                    frame.primitives.extend(entry.primitives.iter().cloned());
                }
                None => {
                    self.stats.misses += 1;
                    trace!("raster cache miss {} rev {}", object.id, object.revision);
                    let style = document.effective_style(object);
                    let primitives = self.rasterizer.rasterize(object, style, view, viewport);
                    frame.primitives.extend(primitives.iter().cloned());
                    self.cache.insert(
                        object.id,
                        CacheEntry {
                            revision: object.revision,
                            view: view_key,
                            viewport: *viewport,
                            primitives,
                        },
                    );
                }
            }

            if object.show_label {
                if let Some((anchor, text)) =
                    object.geometry.measurement_label(self.label_precision)
                {
                    frame.labels.push(TextAnchor {
                        object: object.id,
                        position: view.to_device(&anchor),
                        text,
                    });
                }
            }
        }

        if self.grid_visible {
            frame.grid = self.grid.render(view, viewport);
        }
        frame
    }

    /// 预览几何（不缓存）
    pub fn render_preview(
        &self,
        geometry: &Geometry,
        style: &Style,
        view: &ViewTransform,
        viewport: &Viewport,
    ) -> RenderPrimitive {
        self.rasterizer.rasterize_geometry(geometry, style, view, viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compas_core::construct::ConstructionInput;
    use compas_core::math::Point2;
    use compas_core::properties::StyleScope;

    fn doc_with_segments() -> (Document, ObjectId, ObjectId, Viewport) {
        let viewport = Viewport::new(300, 200);
        let config = KernelConfig::default();
        let mut doc = Document::new(config.clone());
        doc.view = ViewTransform::centered(&config, &viewport);
        let a = doc
            .create_object(&ConstructionInput::Segment {
                start: Point2::new(-100.0, 0.0),
                end: Point2::new(100.0, 20.0),
            })
            .unwrap()
            .0;
        let b = doc
            .create_object(&ConstructionInput::Segment {
                start: Point2::new(-100.0, -40.0),
                end: Point2::new(100.0, -20.0),
            })
            .unwrap()
            .0;
        (doc, a, b, viewport)
    }

    #[test]
    fn test_cache_hits_until_revision_changes() {
        let (mut doc, a, _, viewport) = doc_with_segments();
        let mut renderer = Renderer::default();
        renderer.render_frame(&doc, &viewport);
        renderer.render_frame(&doc, &viewport);
        assert_eq!(renderer.cache_stats().hits, 2);
        assert_eq!(renderer.cache_stats().misses, 2);

        doc.rotate_object(a, 10.0).unwrap();
        renderer.render_frame(&doc, &viewport);
        assert_eq!(renderer.cache_stats().misses, 3);

        doc.view.zoom_by(1);
        renderer.render_frame(&doc, &viewport);
        assert_eq!(renderer.cache_stats().misses, 5);
    }

    #[test]
    fn test_default_style_edit_rerenders_inheriting_objects() {
        let (mut doc, a, b, viewport) = doc_with_segments();
        doc.edit_style(Some(b), Style::default(), StyleScope::ThisOnly).unwrap();
        let mut renderer = Renderer::default();
        let before = renderer.render_frame(&doc, &viewport);

        doc.edit_style(None, Style::default().with_thickness(4.0), StyleScope::Default)
            .unwrap();
        let after = renderer.render_frame(&doc, &viewport);

        let count = |frame: &Frame, id| frame.primitive_for(id).unwrap().pixel_count();
        assert!(count(&after, a) > count(&before, a) * 3);
        assert_eq!(count(&after, b), count(&before, b));
    }

    #[test]
    fn test_deleted_objects_leave_cache() {
        let (mut doc, a, _, viewport) = doc_with_segments();
        let mut renderer = Renderer::default();
        renderer.render_frame(&doc, &viewport);
        doc.delete_object(a).unwrap();
        let frame = renderer.render_frame(&doc, &viewport);
        assert_eq!(frame.primitives.len(), 1);
        assert_eq!(renderer.cache_stats().cached_objects, 1);
    }

    #[test]
    fn test_labels_and_grid() {
        let (mut doc, a, _, viewport) = doc_with_segments();
        doc.set_show_label(a, true).unwrap();
        let mut renderer = Renderer::default();
        let frame = renderer.render_frame(&doc, &viewport);
        assert_eq!(frame.labels.len(), 1);
        assert_eq!(frame.labels[0].object, a);
        // 中点 (0, 10) → 设备 (150, 90)
        assert!((frame.labels[0].position - Point2::new(150.0, 90.0)).norm() < 1e-9);
        assert_eq!(frame.grid.len(), 2);

        renderer.grid_visible = false;
        assert!(renderer.render_frame(&doc, &viewport).grid.is_empty());
    }
}
