// ==========================================
// 生产流程引擎 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 引擎核心运算是全函数,不返回错误;
//       错误类型只服务于配置体检与显式状态迁移的拒绝
// ==========================================

use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 配置错误 =====
    #[error("产线配置无步骤: line_id={line_id}")]
    EmptyPipeline { line_id: String },

    #[error("步骤名重复: line_id={line_id}, step={step_name}")]
    DuplicateStepName { line_id: String, step_name: String },

    #[error("步骤序号与管线顺序不一致: line_id={line_id}, step={step_name}")]
    StepPositionDisorder { line_id: String, step_name: String },

    #[error("班次配置非法: line_id={line_id}, {message}")]
    InvalidShift { line_id: String, message: String },

    // ===== 状态迁移错误 =====
    #[error("步骤未在产线中定义: step={step_name}")]
    UnknownStep { step_name: String },

    #[error("步骤已完工,禁止覆盖 (需先 Reset): order_id={order_id}, step={step_name}")]
    StepAlreadyCompleted { order_id: String, step_name: String },
}
