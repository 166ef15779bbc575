//! 视觉属性：颜色、线型、线宽
//!
//! 默认样式只有一份，由 [`crate::document::Document`] 持有。对象通过
//! [`StyleRef`] 引用它（`Inherited`，实时跟随默认样式的修改），或者持有一份
//! 自己的覆盖样式（`Owned`，与之后的默认样式修改隔离）。

use crate::error::{CadError, Result};
use serde::{Deserialize, Serialize};

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GRID: Color = Color::new(200, 200, 200);
    pub const AXIS: Color = Color::new(100, 100, 120);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// 线型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LineType {
    /// 细实线
    #[default]
    SolidThin,
    /// 粗实线（线宽加倍）
    SolidThick,
    /// 虚线
    Dashed,
    /// 点划线
    DashDot,
    /// 双点划线
    DashDotDot,
}

impl LineType {
    pub const ALL: [LineType; 5] = [
        LineType::SolidThin,
        LineType::SolidThick,
        LineType::Dashed,
        LineType::DashDot,
        LineType::DashDotDot,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LineType::SolidThin => "Solid",
            LineType::SolidThick => "Solid Thick",
            LineType::Dashed => "Dashed",
            LineType::DashDot => "Dash-Dot",
            LineType::DashDotDot => "Dash-Dot-Dot",
        }
    }

    /// 划/隙交替长度（设备像素，偶数下标为“划”）；实线返回空
    ///
    /// 取自 DXF 线型表：DASHED `10,-5`，DASHDOT `10,-3,0,-3`，
    /// DASHDOT2 `10,-3,0,-3,0,-3`。DXF 中长度为 0 的点在光栅上取 1 像素。
    pub fn dash_pattern(&self) -> &'static [f64] {
        match self {
            LineType::SolidThin | LineType::SolidThick => &[],
            LineType::Dashed => &[10.0, 5.0],
            LineType::DashDot => &[10.0, 3.0, 1.0, 3.0],
            LineType::DashDotDot => &[10.0, 3.0, 1.0, 3.0, 1.0, 3.0],
        }
    }

    /// 线宽倍数
    pub fn width_multiplier(&self) -> f64 {
        match self {
            LineType::SolidThick => 2.0,
            _ => 1.0,
        }
    }
}

/// 对象样式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub line_type: LineType,
    /// 线宽（设备像素，> 0）
    pub thickness: f64,
    pub color: Color,
}

impl Style {
    pub fn new(line_type: LineType, thickness: f64, color: Color) -> Self {
        Self {
            line_type,
            thickness,
            color,
        }
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.thickness.is_finite() || self.thickness <= 0.0 {
            return Err(CadError::invalid(format!(
                "thickness must be positive, got {}",
                self.thickness
            )));
        }
        Ok(())
    }

    /// 光栅化时的描边宽度（整数像素，至少 1）
    pub fn stroke_width_px(&self) -> u32 {
        let w = (self.thickness * self.line_type.width_multiplier()).round();
        w.max(1.0) as u32
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            line_type: LineType::SolidThin,
            thickness: 1.0,
            color: Color::BLACK,
        }
    }
}

/// 对象对样式的引用
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum StyleRef {
    /// 跟随文档默认样式
    #[default]
    Inherited,
    /// 自有覆盖样式
    Owned(Style),
}

impl StyleRef {
    pub fn is_inherited(&self) -> bool {
        matches!(self, StyleRef::Inherited)
    }

    /// 解析为实际样式
    pub fn resolve<'a>(&'a self, default: &'a Style) -> &'a Style {
        match self {
            StyleRef::Inherited => default,
            StyleRef::Owned(style) => style,
        }
    }
}

/// 样式修改的作用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleScope {
    /// 只修改目标对象（转为自有样式）
    ThisOnly,
    /// 修改默认样式，影响所有继承它的对象
    Default,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_width() {
        let style = Style::default().with_thickness(2.4);
        assert_eq!(style.stroke_width_px(), 2);
        assert_eq!(style.with_line_type(LineType::SolidThick).stroke_width_px(), 5);
        assert_eq!(style.with_thickness(0.2).stroke_width_px(), 1);
    }

    #[test]
    fn test_validate_thickness() {
        assert!(Style::default().validate().is_ok());
        assert!(matches!(
            Style::default().with_thickness(-1.0).validate(),
            Err(CadError::InvalidParameter(_))
        ));
        assert!(Style::default().with_thickness(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_style_ref_resolve() {
        let default = Style::default();
        let owned = Style::default().with_color(Color::RED);
        assert_eq!(StyleRef::Inherited.resolve(&default), &default);
        assert_eq!(StyleRef::Owned(owned).resolve(&default).color, Color::RED);
    }

    #[test]
    fn test_patterns_are_even_length() {
        for lt in LineType::ALL {
            assert_eq!(lt.dash_pattern().len() % 2, 0, "{:?}", lt);
        }
    }
}
