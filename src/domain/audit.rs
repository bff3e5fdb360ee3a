// ==========================================
// 生产流程引擎 - 审计条目领域模型
// ==========================================
// 职责: 记录每一次步骤状态变动及其原因
// 红线: 每个自动决策必须输出可解释的 detail
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// 审计动作类型 (Audit Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Transition,    // 显式状态迁移 (Done/Reset/标记/手工文本)
    AutoCompleted, // 按量自动完工
    AutoPlanned,   // 自动推进下一步为 P
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Transition => write!(f, "TRANSITION"),
            AuditAction::AutoCompleted => write!(f, "AUTO_COMPLETED"),
            AuditAction::AutoPlanned => write!(f, "AUTO_PLANNED"),
        }
    }
}

// ==========================================
// AuditEntry - 审计条目
// ==========================================
// 引擎只生成条目,持久化由宿主负责
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,                // 条目ID (UUID v4)
    pub order_id: String,          // 工单ID
    pub step_name: String,         // 步骤名
    pub action: AuditAction,       // 动作类型
    pub detail: String,            // 原因与前后值 (JSON)
    pub created_at: NaiveDateTime, // 生成时间
}

impl AuditEntry {
    /// 创建审计条目
    pub fn new(
        order_id: &str,
        step_name: &str,
        action: AuditAction,
        detail: String,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            step_name: step_name.to_string(),
            action,
            detail,
            created_at: now,
        }
    }
}
