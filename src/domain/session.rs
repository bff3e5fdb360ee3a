// ==========================================
// 生产流程引擎 - 工作会话领域模型
// ==========================================
// 职责: 一次工人在某步骤上的作业记录
// 关单 (endTime + quantity) 后不可变,更正走外部流程
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// WorkSession - 工作会话
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: String,                          // 会话ID
    pub order_id: String,                    // 工单ID
    pub step_name: String,                   // 步骤名
    pub user_id: String,                     // 作业人
    pub start_time: NaiveDateTime,           // 开工时间
    pub end_time: Option<NaiveDateTime>,     // 收工时间 (None = 进行中)
    pub quantity: f64,                       // 本次完成数量
    pub standard_time_minutes: Option<f64>,  // 该步骤的标准工时快照
}

impl WorkSession {
    /// 会话是否已关闭
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }
}
