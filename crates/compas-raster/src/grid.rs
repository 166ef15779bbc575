//! 坐标轴与刻度叠加层
//!
//! 不是文档对象，每次渲染时按当前视图重新生成。刻度间距取 1/2/5 × 10^k 的
//! 逻辑单位，使其在屏幕上接近 `grid_target_spacing_px`。

use crate::bresenham::thick_line;
use crate::primitive::{PixelSet, RenderPrimitive};
use compas_core::config::KernelConfig;
use compas_core::math::{Point2, Vector2};
use compas_core::properties::Color;
use compas_core::view::{ViewTransform, Viewport};

/// 单轴最多生成的刻度数
const MAX_TICKS: i64 = 4096;

/// 与 `target` 在对数尺度上最接近的 1/2/5 × 10^k
pub fn nice_spacing(target: f64) -> f64 {
    if !target.is_finite() || target <= 0.0 {
        return 1.0;
    }
    let power = 10f64.powi(target.log10().floor() as i32);
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * power)
        .min_by(|a, b| {
            let da = (a / target).ln().abs();
            let db = (b / target).ln().abs();
            da.total_cmp(&db)
        })
        .unwrap_or(power)
}

#[derive(Debug, Clone)]
pub struct GridOverlay {
    pub target_spacing_px: f64,
    pub tick_length_px: f64,
    pub axis_color: Color,
    pub tick_color: Color,
}

impl GridOverlay {
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            target_spacing_px: config.grid_target_spacing_px,
            tick_length_px: config.tick_length_px,
            axis_color: Color::AXIS,
            tick_color: Color::GRID,
        }
    }

    /// 当前视图下的刻度间距（逻辑单位）
    pub fn spacing(&self, view: &ViewTransform) -> f64 {
        nice_spacing(self.target_spacing_px / view.zoom())
    }

    /// 生成坐标轴和刻度两个图元
    pub fn render(&self, view: &ViewTransform, viewport: &Viewport) -> Vec<RenderPrimitive> {
        let bounds = view.visible_bounds(viewport);
        let clip = (
            Point2::new(-1.0, -1.0),
            Point2::new(viewport.width as f64 + 1.0, viewport.height as f64 + 1.0),
        );
        let spacing = self.spacing(view);

        let mut axes = PixelSet::new(*viewport);
        let mut ticks = PixelSet::new(*viewport);

        // X 轴 (y = 0) 与 Y 轴 (x = 0)
        let axis_defs = [
            (bounds.min.y <= 0.0 && bounds.max.y >= 0.0, bounds.min.x, bounds.max.x, true),
            (bounds.min.x <= 0.0 && bounds.max.x >= 0.0, bounds.min.y, bounds.max.y, false),
        ];
        for (visible, lo, hi, horizontal) in axis_defs {
            if !visible {
                continue;
            }
            let at = |t: f64| {
                if horizontal {
                    Point2::new(t, 0.0)
                } else {
                    Point2::new(0.0, t)
                }
            };
            let a = view.to_device(&at(lo));
            let b = view.to_device(&at(hi));
            axes.extend(thick_line(a, b, 1, clip));

            // 刻度垂直于轴（设备空间）
            let dir = b - a;
            let len = dir.norm();
            if len < 1e-9 {
                continue;
            }
            let normal = Vector2::new(-dir.y, dir.x) / len * (self.tick_length_px / 2.0);
            let first = (lo / spacing).ceil() as i64;
            let last = (hi / spacing).floor() as i64;
            if last - first > MAX_TICKS {
                continue;
            }
            for k in first..=last {
                if k == 0 {
                    continue;
                }
                let center = view.to_device(&at(k as f64 * spacing));
                ticks.extend(thick_line(center - normal, center + normal, 1, clip));
            }
        }

        vec![
            RenderPrimitive {
                object: None,
                color: self.axis_color,
                spans: axes.into_spans(),
            },
            RenderPrimitive {
                object: None,
                color: self.tick_color,
                spans: ticks.into_spans(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_spacing() {
        assert_eq!(nice_spacing(50.0), 50.0);
        assert_eq!(nice_spacing(25.0), 20.0);
        assert_eq!(nice_spacing(0.8), 1.0);
        assert!((nice_spacing(0.003) - 0.002).abs() < 1e-12);
        assert_eq!(nice_spacing(-1.0), 1.0);
    }

    #[test]
    fn test_spacing_tracks_zoom() {
        let overlay = GridOverlay::from_config(&KernelConfig::default());
        let mut view = ViewTransform::default();
        let base = overlay.spacing(&view);
        view.zoom_by(30);
        let zoomed = overlay.spacing(&view);
        assert!(zoomed < base);
        let px = zoomed * view.zoom();
        assert!(px > 20.0 && px < 125.0, "{} px", px);
    }

    #[test]
    fn test_axes_through_origin() {
        let viewport = Viewport::new(200, 100);
        let view = ViewTransform::centered(&KernelConfig::default(), &viewport);
        let overlay = GridOverlay::from_config(&KernelConfig::default());
        let prims = overlay.render(&view, &viewport);
        assert_eq!(prims.len(), 2);
        // X 轴在设备 y = 50，Y 轴在设备 x = 100
        assert!(prims[0].contains(10, 50));
        assert!(prims[0].contains(100, 10));
        // 逻辑 x = 50 处的刻度
        assert!(prims[1].contains(150, 51) || prims[1].contains(150, 49));
    }
}
