//! 编辑器：文档、构造会话与渲染器的组合，按顺序消费输入事件
//!
//! 鼠标映射：
//! - 左键：构造点；空闲时点选
//! - 中键拖动：平移视图
//! - 右键：结束可变点数的构造；否则上下文点选
//! - 滚轮：以光标为中心缩放

use crate::action::{MouseButton, SessionOutcome};
use crate::command_registry::CommandRegistry;
use crate::session::ConstructionSession;
use compas_core::config::KernelConfig;
use compas_core::construct::{ConstructionMethod, PointCount};
use compas_core::document::Document;
use compas_core::entity::ObjectId;
use compas_core::input_parser::{InputParser, InputValue};
use compas_core::math::Point2;
use compas_core::properties::{LineType, Style, StyleScope};
use compas_core::view::{ViewTransform, Viewport};
use compas_raster::{Frame, Renderer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 宿主送入的输入事件（设备坐标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, button: MouseButton },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64, button: MouseButton },
    /// 滚轮格数，正数放大
    Wheel { notches: i32 },
    /// Esc
    Cancel,
    StyleEdit {
        target: Option<ObjectId>,
        style: Style,
        scope: StyleScope,
    },
    /// 命令行文本：命令名或数据
    Text(String),
    Value(f64),
    BeginConstruction(ConstructionMethod),
    Finish,
    /// 绕视口中心旋转视图（角度制）
    RotateView { degrees: f64 },
    RotateObject { target: ObjectId, degrees: f64 },
    ShowLabel { target: ObjectId, show: bool },
    Delete { target: ObjectId },
    Resize { width: u32, height: u32 },
}

/// 处理一个事件后的反馈
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Nothing,
    Session(SessionOutcome),
    /// 左键点选结果
    Selected(Option<ObjectId>),
    /// 右键点选结果
    Context(Option<ObjectId>),
    ViewChanged,
    DocumentChanged,
    /// 输入无法处理，附带提示信息
    Rejected(String),
}

/// 输入看起来像数据而不是命令
fn looks_like_data_input(input: &str) -> bool {
    input
        .chars()
        .any(|c| c.is_ascii_digit() || matches!(c, '@' | '<' | ',' | '.' | '-'))
}

pub struct Editor {
    document: Document,
    session: ConstructionSession,
    renderer: Renderer,
    viewport: Viewport,
    pub parser: InputParser,
    pub registry: CommandRegistry,
    /// 最近一次的指针位置（设备坐标）
    pointer: Point2,
    /// 中键拖动的上一个位置
    pan_drag: Option<Point2>,
    selection: Option<ObjectId>,
    /// 空输入时重复的构造方式
    last_method: Option<ConstructionMethod>,
}

impl Editor {
    pub fn new(config: KernelConfig, viewport: Viewport) -> Self {
        let renderer = Renderer::from_config(&config);
        let view = ViewTransform::centered(&config, &viewport);
        let mut document = Document::new(config);
        document.view = view;
        Self {
            document,
            session: ConstructionSession::new(),
            renderer,
            viewport,
            parser: InputParser::default(),
            registry: CommandRegistry::new(),
            pointer: viewport.center(),
            pan_drag: None,
            selection: None,
            last_method: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn session(&self) -> &ConstructionSession {
        &self.session
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn prompt(&self) -> &'static str {
        self.session.prompt()
    }

    /// 光标处的逻辑坐标
    pub fn cursor(&self) -> Point2 {
        self.document.view.to_logical(&self.pointer)
    }

    pub fn handle(&mut self, event: InputEvent) -> Response {
        match event {
            InputEvent::PointerDown { x, y, button } => {
                self.pointer = Point2::new(x, y);
                self.pointer_down(button)
            }
            InputEvent::PointerMove { x, y } => {
                let position = Point2::new(x, y);
                self.pointer = position;
                let Some(last) = self.pan_drag else {
                    return Response::Nothing;
                };
                self.pan_drag = Some(position);
                self.document.view.pan_by(position - last);
                Response::ViewChanged
            }
            InputEvent::PointerUp { x, y, button } => {
                self.pointer = Point2::new(x, y);
                if button == MouseButton::Middle && self.pan_drag.take().is_some() {
                    return Response::ViewChanged;
                }
                Response::Nothing
            }
            InputEvent::Wheel { notches } => {
                self.document.view.zoom_at(notches, self.pointer);
                Response::ViewChanged
            }
            InputEvent::Cancel => {
                if self.session.is_idle() {
                    self.selection = None;
                    return Response::Selected(None);
                }
                Response::Session(self.session.cancel())
            }
            InputEvent::StyleEdit {
                target,
                style,
                scope,
            } => Self::document_result(self.document.edit_style(target, style, scope)),
            InputEvent::Text(text) => self.text(&text),
            InputEvent::Value(value) => {
                Response::Session(self.session.push_value(value, &mut self.document))
            }
            InputEvent::BeginConstruction(method) => self.begin(method),
            InputEvent::Finish => Response::Session(self.session.finish(&mut self.document)),
            InputEvent::RotateView { degrees } => {
                if !degrees.is_finite() {
                    return Response::Rejected(format!("旋转角无效: {}", degrees));
                }
                self.document
                    .view
                    .rotate_at(degrees.to_radians(), self.viewport.center());
                Response::ViewChanged
            }
            InputEvent::RotateObject { target, degrees } => {
                Self::document_result(self.document.rotate_object(target, degrees))
            }
            InputEvent::ShowLabel { target, show } => {
                Self::document_result(self.document.set_show_label(target, show))
            }
            InputEvent::Delete { target } => {
                let result = self.document.delete_object(target).map(|_| ());
                if self.selection == Some(target) {
                    self.selection = None;
                }
                Self::document_result(result)
            }
            InputEvent::Resize { width, height } => {
                let old_center = self.viewport.center();
                self.viewport = Viewport::new(width, height);
                self.document.view.pan_by(self.viewport.center() - old_center);
                Response::ViewChanged
            }
        }
    }

    fn document_result(result: compas_core::error::Result<()>) -> Response {
        match result {
            Ok(()) => Response::DocumentChanged,
            Err(err) => Response::Rejected(err.to_string()),
        }
    }

    fn begin(&mut self, method: ConstructionMethod) -> Response {
        info!("{}", method.display_name());
        self.session.begin(method);
        self.last_method = Some(method);
        Response::Session(SessionOutcome::Continue)
    }

    fn pointer_down(&mut self, button: MouseButton) -> Response {
        match button {
            MouseButton::Left if self.session.is_idle() => {
                self.selection = self.document.hit_test(self.pointer);
                debug!("select {:?}", self.selection);
                Response::Selected(self.selection)
            }
            MouseButton::Left => {
                let point = self.cursor();
                Response::Session(self.session.push_point(point, &mut self.document))
            }
            MouseButton::Right => {
                let variable = self
                    .session
                    .method()
                    .is_some_and(|m| matches!(m.point_count(), PointCount::AtLeast(_)));
                if variable {
                    Response::Session(self.session.finish(&mut self.document))
                } else {
                    Response::Context(self.document.hit_test(self.pointer))
                }
            }
            MouseButton::Middle => {
                self.pan_drag = Some(self.pointer);
                Response::Nothing
            }
        }
    }

    /// 命令行文本
    ///
    /// 空闲时按命令查找；构造进行中优先作为数据输入。空输入重复上一个构造
    /// 方式，或结束正在进行的可变点数构造。
    fn text(&mut self, text: &str) -> Response {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            if self.session.is_idle() {
                return match self.last_method {
                    Some(method) => self.begin(method),
                    None => Response::Nothing,
                };
            }
            return Response::Session(self.session.finish(&mut self.document));
        }

        if self.session.is_idle() || !looks_like_data_input(trimmed) {
            return match self.registry.lookup(trimmed) {
                Some(method) => self.begin(method),
                None => Response::Rejected(format!("未知命令: {}", trimmed)),
            };
        }

        if self.session.expects_dimensions() && !trimmed.starts_with('@') {
            if let Ok((width, height)) = InputParser::parse_dimensions(trimmed) {
                return Response::Session(self.session.push_dimensions(
                    width,
                    height,
                    &mut self.document,
                ));
            }
        }

        let reference = self.session.points().last().copied();
        let point = match self.parser.parse(trimmed, reference) {
            Ok(InputValue::Length(value)) if self.session.accepts_value() => {
                return Response::Session(self.session.push_value(value, &mut self.document));
            }
            Ok(InputValue::Point(p)) => Ok(p),
            Ok(_) => self.parser.parse_point(trimmed, reference),
            Err(err) => Err(err),
        };
        match point {
            Ok(p) => Response::Session(self.session.push_point(p, &mut self.document)),
            Err(err) => Response::Rejected(err.to_string()),
        }
    }

    /// 渲染当前帧，附带光标处的构造预览
    pub fn frame(&mut self) -> Frame {
        let mut frame = self.renderer.render_frame(&self.document, &self.viewport);

        let style = *self.document.default_style();
        let reference_style = style.with_line_type(LineType::Dashed);
        for preview in self.session.preview(self.cursor(), self.document.config()) {
            let style = if preview.is_reference {
                &reference_style
            } else {
                &style
            };
            frame.primitives.push(self.renderer.render_preview(
                &preview.geometry,
                style,
                &self.document.view,
                &self.viewport,
            ));
        }
        frame
    }
}
