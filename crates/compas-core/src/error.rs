//! 内核错误定义

use crate::entity::ObjectId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CadError {
    /// 共线点、零/负半径、圆角半径超出线段长度、顶点不足等
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown object reference: {0}")]
    UnknownObjectReference(ObjectId),
}

impl CadError {
    pub fn degenerate(msg: impl Into<String>) -> Self {
        CadError::DegenerateGeometry(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        CadError::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CadError>;
