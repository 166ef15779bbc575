//! 命令行坐标输入解析
//!
//! 支持的格式：
//! - 绝对坐标: `100,50`
//! - 相对坐标: `@100,50`
//! - 极坐标: `@100<45` (相对参考点) 或 `100<45` (相对原点)
//! - 长度/半径: `100`
//! - 角度: `<45`
//! - 尺寸: `100,50` (矩形宽高，见 [`InputParser::parse_dimensions`])
//!
//! 极坐标模式 ([`CoordinateMode::Polar`]) 下，`r,θ` 形式的数对按极坐标解释。
//! 与笛卡尔模式一致，带 `@` 的相对参考点，不带 `@` 的相对原点。角度一律为角度制。

use crate::coords::{convert, CoordinateMode};
use crate::math::Point2;
use thiserror::Error;

/// 解析后的输入值
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// 点坐标（逻辑坐标）
    Point(Point2),
    /// 长度值
    Length(f64),
    /// 角度值（弧度）
    Angle(f64),
    /// 长度和角度（弧度）
    LengthAngle { length: f64, angle: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Missing value: {0}")]
    MissingValue(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputParser {
    pub mode: CoordinateMode,
}

fn number(text: &str, what: &str) -> Result<f64, ParseError> {
    let text = text.trim();
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidFormat(format!("Invalid {}: '{}'", what, text))),
    }
}

/// 去掉相对前缀 `@`
fn strip_relative(text: &str) -> (bool, &str) {
    match text.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

impl InputParser {
    pub fn new(mode: CoordinateMode) -> Self {
        Self { mode }
    }

    /// 解析输入字符串
    ///
    /// `reference` 是相对输入的基准点（通常是上一个输入点）。
    pub fn parse(&self, input: &str, reference: Option<Point2>) -> Result<InputValue, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidFormat("Empty input".to_string()));
        }

        if let Some((prefix, angle_text)) = input.rsplit_once('<') {
            return Self::parse_polar(prefix, angle_text, reference);
        }

        if let Some((first, second)) = input.split_once(',') {
            let (relative, first) = strip_relative(first);
            let a = number(first, "first coordinate")?;
            let b = number(second, "second coordinate")?;
            return self.pair_to_point(a, b, relative, reference).map(InputValue::Point);
        }

        number(input, "length").map(InputValue::Length)
    }

    fn parse_polar(
        prefix: &str,
        angle_text: &str,
        reference: Option<Point2>,
    ) -> Result<InputValue, ParseError> {
        let angle = number(angle_text, "angle")?.to_radians();
        let (relative, length_text) = strip_relative(prefix.trim());
        if length_text.trim().is_empty() {
            return Ok(InputValue::Angle(angle));
        }
        let length = number(length_text, "length")?;

        if !relative {
            return Ok(InputValue::LengthAngle { length, angle });
        }
        let origin = reference.ok_or_else(|| {
            ParseError::MissingValue(
                "Reference point required for relative polar coordinate".to_string(),
            )
        })?;
        Ok(InputValue::Point(convert(
            Point2::new(length, angle),
            CoordinateMode::Polar,
            CoordinateMode::Cartesian,
            origin,
        )))
    }

    fn pair_to_point(
        &self,
        a: f64,
        b: f64,
        relative: bool,
        reference: Option<Point2>,
    ) -> Result<Point2, ParseError> {
        match self.mode {
            CoordinateMode::Cartesian if !relative => Ok(Point2::new(a, b)),
            CoordinateMode::Cartesian => {
                let base = reference.ok_or_else(|| {
                    ParseError::MissingValue(
                        "Reference point required for relative coordinate".to_string(),
                    )
                })?;
                Ok(Point2::new(base.x + a, base.y + b))
            }
            CoordinateMode::Polar => {
                let origin = if relative {
                    reference.ok_or_else(|| {
                        ParseError::MissingValue(
                            "Reference point required for relative polar coordinate".to_string(),
                        )
                    })?
                } else {
                    Point2::origin()
                };
                Ok(convert(
                    Point2::new(a, b.to_radians()),
                    CoordinateMode::Polar,
                    CoordinateMode::Cartesian,
                    origin,
                ))
            }
        }
    }

    /// 解析为点坐标
    ///
    /// 不带 `@` 的长度+角度以原点为起点；单独的长度从参考点沿 0° 方向。
    pub fn parse_point(&self, input: &str, reference: Option<Point2>) -> Result<Point2, ParseError> {
        match self.parse(input, reference)? {
            InputValue::Point(p) => Ok(p),
            InputValue::LengthAngle { length, angle } => Ok(convert(
                Point2::new(length, angle),
                CoordinateMode::Polar,
                CoordinateMode::Cartesian,
                Point2::origin(),
            )),
            InputValue::Length(len) => {
                let origin = reference.ok_or_else(|| {
                    ParseError::MissingValue(
                        "Reference point required for length input".to_string(),
                    )
                })?;
                Ok(Point2::new(origin.x + len, origin.y))
            }
            InputValue::Angle(_) => Err(ParseError::InvalidFormat(
                "Angle alone cannot be converted to a point".to_string(),
            )),
        }
    }

    /// 解析为尺寸（宽高），允许负值
    pub fn parse_dimensions(input: &str) -> Result<(f64, f64), ParseError> {
        let (w, h) = input.trim().split_once(',').ok_or_else(|| {
            ParseError::InvalidFormat("Dimensions must be in format 'width,height'".to_string())
        })?;
        Ok((number(w, "width")?, number(h, "height")?))
    }
}
