//! 交互层的公共词汇：鼠标按钮、会话结果、预览几何

use compas_core::construct::ConstructionWarning;
use compas_core::entity::ObjectId;
use compas_core::error::CadError;
use compas_core::geometry::Geometry;
use serde::{Deserialize, Serialize};

/// 鼠标按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    /// 构造点 / 选择
    Left,
    /// 结束可变点数的构造 / 上下文点选
    Right,
    /// 拖动平移
    Middle,
}

/// 构造会话处理一次输入后的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// 继续等待输入
    Continue,
    /// 构造完成，对象已插入文档；附带不阻止创建的警告
    Created {
        id: ObjectId,
        warnings: Vec<ConstructionWarning>,
    },
    /// 构造失败，已清空已输入的点，保留构造方式重新提示
    Failed(CadError),
    /// 已取消，回到空闲
    Cancelled,
    /// 当前状态不接受这个输入
    Ignored,
}

impl SessionOutcome {
    pub fn created(&self) -> Option<ObjectId> {
        match self {
            SessionOutcome::Created { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn warnings(&self) -> &[ConstructionWarning] {
        match self {
            SessionOutcome::Created { warnings, .. } => warnings.as_slice(),
            _ => &[],
        }
    }
}

/// 预览几何体
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewGeometry {
    pub geometry: Geometry,
    /// 是否是参考线（如弦、生成圆）
    pub is_reference: bool,
}

impl PreviewGeometry {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            is_reference: false,
        }
    }

    pub fn reference(geometry: Geometry) -> Self {
        Self {
            geometry,
            is_reference: true,
        }
    }
}
