// ==========================================
// 生产流程引擎 - 产线配置领域模型
// ==========================================
// 职责: 步骤定义 + 班次参数 + 评分权重
// 红线: 配置对引擎只读,引擎不修改产线配置
// ==========================================

use crate::domain::types::ResourceType;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 步骤时长缺失时的兜底值: 24 小时
///
/// 完工预测是规划辅助而非事务系统,配置缺失降级而不报错
pub const DEFAULT_STEP_DURATION_MINUTES: f64 = 24.0 * 60.0;

// ==========================================
// StepDefinition - 步骤定义
// ==========================================
// position 决定管线顺序,对同一产线配置不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,                   // 步骤名 (工单步骤值的键)
    pub position: u32,                  // 管线序号
    pub standard_duration_minutes: f64, // 标准时长 (分钟), 0 = 未配置
    pub target_quantity: Option<f64>,   // 目标数量 (按量自动完工用)
    pub unit: Option<String>,           // 数量单位 (如 pcs/m)
    pub resource_type: ResourceType,    // 资源类型
    pub staff_count: u32,               // 在岗人数 (人力受限步骤的产能因子)
}

impl StepDefinition {
    /// 有效标准时长 (分钟)
    ///
    /// 未配置或非法值降级为 24 小时兜底
    pub fn effective_duration_minutes(&self) -> f64 {
        if self.standard_duration_minutes.is_finite() && self.standard_duration_minutes > 0.0 {
            self.standard_duration_minutes
        } else {
            DEFAULT_STEP_DURATION_MINUTES
        }
    }

    /// 是否人力受限步骤
    pub fn is_staff_limited(&self) -> bool {
        self.resource_type == ResourceType::StaffLimited
    }
}

// ==========================================
// ShiftConfig - 班次配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftConfig {
    pub standard_hours: f64, // 标准工时 (小时/天)
    pub overtime_hours: f64, // 加班工时 (小时/天)
    pub work_saturday: bool, // 周六是否出勤
    pub work_sunday: bool,   // 周日是否出勤
}

impl ShiftConfig {
    /// 单日总工时 (标准 + 加班)
    pub fn daily_hours(&self) -> f64 {
        self.standard_hours + self.overtime_hours
    }
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            standard_hours: 8.0,
            overtime_hours: 0.0,
            work_saturday: false,
            work_sunday: false,
        }
    }
}

// ==========================================
// ScoringWeights - 排产评分权重
// ==========================================
// 相对乘数,不要求合计为 100
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub priority: f64, // 优先级权重
    pub due_date: f64, // 交期紧迫度权重
    pub aging: f64,    // 工单龄权重
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            priority: 50.0,
            due_date: 30.0,
            aging: 20.0,
        }
    }
}

// ==========================================
// LineConfig - 产线配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    pub line_id: String,              // 产线标识
    pub steps: Vec<StepDefinition>,   // 有序步骤管线
    pub shift: ShiftConfig,           // 班次
    pub weights: ScoringWeights,      // 评分权重
    pub auto_flow_enabled: bool,      // 完工后自动推进下一步
    pub monthly_target: Option<f64>,  // 月度目标量 (达成率展示用,不参与分配)
}

impl LineConfig {
    /// 按名称查找步骤定义
    pub fn step(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// 按名称查找步骤的管线下标
    pub fn step_index(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    /// 校验产线配置
    ///
    /// 面向运维侧的配置体检;引擎运算本身不依赖校验通过,
    /// 空管线等问题在运算中按零结果降级处理
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.steps.is_empty() {
            return Err(EngineError::EmptyPipeline {
                line_id: self.line_id.clone(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(EngineError::DuplicateStepName {
                    line_id: self.line_id.clone(),
                    step_name: step.name.clone(),
                });
            }
        }

        // position 必须与管线顺序一致 (对同一产线配置不可变)
        for window in self.steps.windows(2) {
            if window[0].position >= window[1].position {
                return Err(EngineError::StepPositionDisorder {
                    line_id: self.line_id.clone(),
                    step_name: window[1].name.clone(),
                });
            }
        }

        if !(self.shift.daily_hours() > 0.0) {
            return Err(EngineError::InvalidShift {
                line_id: self.line_id.clone(),
                message: format!(
                    "standard_hours({}) + overtime_hours({}) 必须大于 0",
                    self.shift.standard_hours, self.shift.overtime_hours
                ),
            });
        }

        Ok(())
    }
}
