//! Bresenham 系列整数增量光栅化
//!
//! - [`line`]: 全八分区直线，通过交换主轴和步进符号处理
//! - [`thick_line`]: 沿法线方向以半像素步长平移复制单像素路径
//! - [`midpoint_circle`]: 中点画圆，只计算一个八分区，再做 8 向镜像

use compas_core::math::{Point2, Vector2};

/// 单像素直线，包含两个端点
///
/// 判别量只依赖 |dx| 与 |dy|，步进方向由符号决定，所以把两个端点
/// 关于原点对称后得到的像素序列也关于原点对称。
pub fn line(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<(i64, i64)> {
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x1 >= x0 { 1 } else { -1 };
    let sy = if y1 >= y0 { 1 } else { -1 };

    // 主轴：变化量较大的轴
    let steep = dy > dx;
    let (d_major, d_minor) = if steep { (dy, dx) } else { (dx, dy) };

    let mut pixels = Vec::with_capacity(d_major as usize + 1);
    let (mut x, mut y) = (x0, y0);
    let mut err = 2 * d_minor - d_major;
    for _ in 0..=d_major {
        pixels.push((x, y));
        if err > 0 {
            if steep {
                x += sx;
            } else {
                y += sy;
            }
            err -= 2 * d_major;
        }
        err += 2 * d_minor;
        if steep {
            y += sy;
        } else {
            x += sx;
        }
    }
    pixels
}

/// Liang-Barsky 裁剪，矩形为 `[min, max]`
pub fn clip_segment(p0: Point2, p1: Point2, min: Point2, max: Point2) -> Option<(Point2, Point2)> {
    let d = p1 - p0;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-d.x, p0.x - min.x),
        (d.x, max.x - p0.x),
        (-d.y, p0.y - min.y),
        (d.y, max.y - p0.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((p0 + d * t0, p0 + d * t1))
}

fn round_pixel(p: Point2) -> (i64, i64) {
    (p.x.round() as i64, p.y.round() as i64)
}

/// 宽度为 `width` 像素的直线，端点为设备坐标
///
/// 在 `[-(w-1)/2, (w-1)/2]` 内以半像素为步长取法向偏移，每个偏移复制一条
/// 单像素 Bresenham 路径。半像素步长保证陡峭斜率下相邻副本之间不留缝。
/// 线段先裁剪到 `clip` 矩形。
pub fn thick_line(p0: Point2, p1: Point2, width: u32, clip: (Point2, Point2)) -> Vec<(i64, i64)> {
    let half = (width.max(1) as f64 - 1.0) / 2.0;
    let dir = p1 - p0;
    let len = dir.norm();

    if len < 1e-9 {
        // 零长度：以端点为中心的方块
        let (cx, cy) = round_pixel(p0);
        let r = half.ceil() as i64;
        return (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (cx + dx, cy + dy)))
            .collect();
    }

    let normal = Vector2::new(-dir.y, dir.x) / len;
    let steps = (half * 2.0).round() as i64;
    let mut pixels = Vec::new();
    for k in 0..=steps {
        let offset = -half + k as f64 * 0.5;
        let shift = normal * offset;
        if let Some((a, b)) = clip_segment(p0 + shift, p1 + shift, clip.0, clip.1) {
            let (ax, ay) = round_pixel(a);
            let (bx, by) = round_pixel(b);
            pixels.extend(line(ax, ay, bx, by));
        }
    }
    pixels
}

/// 中点画圆：圆心 `(cx, cy)`，半径 `radius` 像素（可为小数）
///
/// 在 x ∈ [0, y] 的八分区内用中点判别量逐步推进，每个点镜像到 8 个八分区。
pub fn midpoint_circle(cx: i64, cy: i64, radius: f64) -> Vec<(i64, i64)> {
    if radius < 0.5 {
        return vec![(cx, cy)];
    }

    let mut x: i64 = 0;
    let mut y: i64 = radius.round() as i64;
    // 判别量 f(x+1, y-1/2) = (x+1)² + (y-1/2)² - r²
    let mut d = 1.0 + (y as f64 - 0.5).powi(2) - radius * radius;

    let mut pixels = Vec::with_capacity((radius * 8.0) as usize);
    while x <= y {
        for (px, py) in [
            (x, y),
            (y, x),
            (-x, y),
            (-y, x),
            (x, -y),
            (y, -x),
            (-x, -y),
            (-y, -x),
        ] {
            pixels.push((cx + px, cy + py));
        }

        if d < 0.0 {
            d += (2 * x + 3) as f64;
        } else {
            d += (2 * (x - y) + 5) as f64;
            y -= 1;
        }
        x += 1;
    }
    pixels
}
