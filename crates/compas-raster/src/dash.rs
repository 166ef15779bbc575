//! 虚线图案
//!
//! 图案长度以设备像素计，沿路径的设备空间弧长求值，因此缩放时虚线的疏密在
//! 屏幕上保持不变。多段路径（折线、多边形、样条）之间延续相位。

use compas_core::math::Point2;
use compas_core::properties::LineType;

#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    /// 划/隙交替长度，偶数下标为“划”；空表示实线
    lengths: Vec<f64>,
    period: f64,
}

impl DashPattern {
    pub fn solid() -> Self {
        Self {
            lengths: Vec::new(),
            period: 0.0,
        }
    }

    pub fn for_line_type(line_type: LineType, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let lengths: Vec<f64> = line_type.dash_pattern().iter().map(|l| l * scale).collect();
        let period = lengths.iter().sum();
        Self { lengths, period }
    }

    pub fn is_solid(&self) -> bool {
        self.lengths.is_empty() || self.period <= 0.0
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// 距路径起点 `distance` 像素处是否落在“划”上
    pub fn is_on(&self, distance: f64) -> bool {
        if self.is_solid() {
            return true;
        }
        let mut d = distance.rem_euclid(self.period);
        for (i, len) in self.lengths.iter().enumerate() {
            if d < *len {
                return i % 2 == 0;
            }
            d -= len;
        }
        true
    }

    /// 从 `distance` 开始，当前区间还剩多长，以及该区间是否为“划”
    fn remaining(&self, distance: f64) -> (f64, bool) {
        let mut d = distance.rem_euclid(self.period);
        for (i, len) in self.lengths.iter().enumerate() {
            if d < *len {
                return (len - d, i % 2 == 0);
            }
            d -= len;
        }
        (self.lengths[0], true)
    }

    /// 把设备空间折线切成“划”的片段
    ///
    /// `start` 为折线起点处已经走过的弧长，返回片段列表和终点处的弧长。
    pub fn split_polyline(&self, points: &[Point2], start: f64) -> (Vec<Vec<Point2>>, f64) {
        let mut distance = start;
        if self.is_solid() {
            let total: f64 = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
            return (vec![points.to_vec()], distance + total);
        }

        let mut pieces: Vec<Vec<Point2>> = Vec::new();
        let mut current: Vec<Point2> = Vec::new();

        for w in points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let seg_len = (b - a).norm();
            let mut t = 0.0;
            while t < seg_len {
                let (left, on) = self.remaining(distance);
                let step = left.min(seg_len - t).max(1e-9);
                let p0 = a + (b - a) * (t / seg_len);
                let p1 = a + (b - a) * ((t + step).min(seg_len) / seg_len);
                if on {
                    if current.last() != Some(&p0) {
                        if !current.is_empty() {
                            pieces.push(std::mem::take(&mut current));
                        }
                        current.push(p0);
                    }
                    current.push(p1);
                } else if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
                t += step;
                distance += step;
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        (pieces, distance)
    }
}
