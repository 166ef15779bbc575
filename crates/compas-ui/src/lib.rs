//! Compas 交互层
//!
//! 与窗口系统无关：宿主把鼠标、键盘和命令行输入翻译成 [`InputEvent`]，
//! 交给 [`Editor`] 按顺序处理，再取 [`compas_raster::Frame`] 显示。

pub mod action;
pub mod command_registry;
pub mod editor;
pub mod session;

pub use action::{MouseButton, PreviewGeometry, SessionOutcome};
pub use command_registry::CommandRegistry;
pub use editor::{Editor, InputEvent, Response};
pub use session::{ConstructionSession, PendingConstruction, SessionState};
