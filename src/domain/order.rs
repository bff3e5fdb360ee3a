// ==========================================
// 生产流程引擎 - 工单领域模型
// ==========================================
// 职责: 工单快照 + 派生属性 (当前步骤/整单完工)
// 红线: 工单只被显式状态迁移或步完工自动化修改,
//       引擎从不删除工单
// ==========================================

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::line::{LineConfig, StepDefinition};
use crate::domain::types::{OrderPriority, StepState, TIMESTAMP_FORMAT};
use crate::error::EngineError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

// ==========================================
// Order - 工单快照
// ==========================================
// step_values 的键空间由产线配置决定,遍历顺序一律取自 LineConfig.steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,                           // 工单ID
    pub line_id: String,                      // 所属产线
    pub priority: OrderPriority,              // 优先级标记
    pub due_date: Option<NaiveDate>,          // 交期
    pub created_at: NaiveDateTime,            // 创建时间
    pub step_values: HashMap<String, String>, // 步骤名 → 原始值
}

impl Order {
    /// 读取步骤原始值,缺失按空串处理
    pub fn raw_value(&self, step_name: &str) -> &str {
        self.step_values
            .get(step_name)
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// 步骤的派生状态
    pub fn state_of(&self, step_name: &str) -> StepState {
        StepState::classify(self.raw_value(step_name))
    }

    // ==========================================
    // 派生属性
    // ==========================================

    /// 当前步骤: 管线中第一个既非已完工也非不适用的步骤
    ///
    /// 显式派生一次,调用方复用,避免各处各自扫描口径不一
    pub fn current_step<'a>(&self, line: &'a LineConfig) -> Option<&'a StepDefinition> {
        line.steps.iter().find(|s| !self.state_of(&s.name).is_settled())
    }

    /// 整单完工: 末位步骤已完工
    ///
    /// 完工工单不参与完工预测与排产推荐
    pub fn is_fully_complete(&self, line: &LineConfig) -> bool {
        line.steps
            .last()
            .map(|s| self.state_of(&s.name).is_completed())
            .unwrap_or(false)
    }

    /// 是否存在质量异常步骤 (任意位置)
    pub fn has_quality_exception(&self, line: &LineConfig) -> bool {
        line.steps
            .iter()
            .any(|s| self.state_of(&s.name).is_quality_exception())
    }

    /// 最近一次完工时间 (所有已完工步骤的最大时间戳)
    ///
    /// 按时间戳取最大而非按管线位置,对乱序完工的数据更稳健
    pub fn latest_completion(&self, line: &LineConfig) -> Option<NaiveDateTime> {
        line.steps
            .iter()
            .filter_map(|s| self.state_of(&s.name).completed_at())
            .max()
    }

    // ==========================================
    // 显式状态迁移
    // ==========================================

    /// 应用一次显式状态迁移
    ///
    /// 语义:
    /// - "Done" → 写入当前时间戳 (YYYY-MM-DD HH:MM)
    /// - "Reset" → 清空回未开始
    /// - 其他值 (标记 P/WIP/N/A/Hold/QN/DIFA 或手工文本) → 原样写入
    ///
    /// 已完工步骤除 "Reset" 外一律拒绝覆盖
    ///
    /// # 返回
    /// 迁移审计条目 (含前后值)
    pub fn apply_transition(
        &mut self,
        line: &LineConfig,
        step_name: &str,
        status: &str,
        now: NaiveDateTime,
    ) -> Result<AuditEntry, EngineError> {
        if line.step(step_name).is_none() {
            return Err(EngineError::UnknownStep {
                step_name: step_name.to_string(),
            });
        }

        let previous = self.raw_value(step_name).to_string();
        let is_reset = status.trim().eq_ignore_ascii_case("reset");

        if StepState::classify(&previous).is_completed() && !is_reset {
            return Err(EngineError::StepAlreadyCompleted {
                order_id: self.id.clone(),
                step_name: step_name.to_string(),
            });
        }

        let new_value = if is_reset {
            String::new()
        } else if status.trim().eq_ignore_ascii_case("done") {
            now.format(TIMESTAMP_FORMAT).to_string()
        } else {
            status.to_string()
        };

        self.step_values
            .insert(step_name.to_string(), new_value.clone());

        let detail = json!({
            "status": status,
            "previous_value": previous,
            "new_value": new_value,
        })
        .to_string();

        Ok(AuditEntry::new(
            &self.id,
            step_name,
            AuditAction::Transition,
            detail,
            now,
        ))
    }
}
