// ==========================================
// 生产流程引擎 - 产能账本
// ==========================================
// 职责: 规划窗口内各步骤可用分钟的核算与消耗
// 红线: 账本按单次规划运行构造,禁止进程级单例;
//       非无限步骤在运行结束时恒有 used_minutes <= total_minutes
// ==========================================

use crate::domain::line::LineConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CapacityOverride - 产能顾问覆写
// ==========================================
// 外部产能顾问可对指定步骤直接给定可用分钟,短路公式计算
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityOverride {
    pub capacity_minutes: f64, // 覆写后的可用分钟
    pub reason: String,        // 覆写理由 (可解释性)
}

// ==========================================
// StepCapacity - 单步骤产能核算
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCapacity {
    pub total_minutes: f64, // 可用分钟 (无限步骤为 0,以 is_unlimited 标识)
    pub used_minutes: f64,  // 已消耗分钟
    pub count: u32,         // 已分配工单数
    pub is_unlimited: bool, // 机器步骤,不设产能上限
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>, // 来自产能顾问的覆写理由
}

impl StepCapacity {
    /// 剩余可用分钟
    pub fn remaining_minutes(&self) -> f64 {
        (self.total_minutes - self.used_minutes).max(0.0)
    }
}

// ==========================================
// CapacityLedger - 产能账本
// ==========================================
// 规划运行内部的临时结构;并发规划各自建账,合账由宿主负责
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityLedger {
    entries: HashMap<String, StepCapacity>,
}

impl CapacityLedger {
    /// 构建产能账本
    ///
    /// 各步骤可用分钟的计算规则 (命中即定):
    /// 1) 产能顾问覆写 → 直接采用覆写分钟
    /// 2) 机器步骤 (MachineUnlimited) → 不设上限
    /// 3) 人力受限步骤 → 在岗人数 × min(规划窗口, 标准+加班工时) × 60
    ///
    /// # 参数
    /// - `planning_horizon_hours`: 规划窗口 (小时)
    /// - `standard_hours`/`overtime_hours`: 当班工时参数 (可覆盖产线默认)
    /// - `overrides`: 产能顾问覆写 (步骤名 → 覆写)
    pub fn build(
        line: &LineConfig,
        planning_horizon_hours: f64,
        standard_hours: f64,
        overtime_hours: f64,
        overrides: &HashMap<String, CapacityOverride>,
    ) -> Self {
        let shift_hours = standard_hours + overtime_hours;
        let effective_hours = planning_horizon_hours.min(shift_hours).max(0.0);

        let mut entries = HashMap::with_capacity(line.steps.len());
        for step in &line.steps {
            let capacity = if let Some(ov) = overrides.get(&step.name) {
                StepCapacity {
                    total_minutes: ov.capacity_minutes.max(0.0),
                    used_minutes: 0.0,
                    count: 0,
                    is_unlimited: false,
                    override_reason: Some(ov.reason.clone()),
                }
            } else if step.is_staff_limited() {
                StepCapacity {
                    total_minutes: f64::from(step.staff_count) * effective_hours * 60.0,
                    used_minutes: 0.0,
                    count: 0,
                    is_unlimited: false,
                    override_reason: None,
                }
            } else {
                StepCapacity {
                    total_minutes: 0.0,
                    used_minutes: 0.0,
                    count: 0,
                    is_unlimited: true,
                    override_reason: None,
                }
            };
            entries.insert(step.name.clone(), capacity);
        }

        Self { entries }
    }

    /// 指定步骤是否还能容纳给定分钟数
    pub fn can_allocate(&self, step_name: &str, minutes: f64) -> bool {
        match self.entries.get(step_name) {
            Some(cap) if cap.is_unlimited => true,
            Some(cap) => cap.used_minutes + minutes <= cap.total_minutes,
            None => false,
        }
    }

    /// 消耗指定步骤的产能
    ///
    /// 容纳不下时不做任何修改并返回 false,保证上限不被突破
    pub fn allocate(&mut self, step_name: &str, minutes: f64) -> bool {
        if !self.can_allocate(step_name, minutes) {
            return false;
        }
        if let Some(cap) = self.entries.get_mut(step_name) {
            if !cap.is_unlimited {
                cap.used_minutes += minutes;
            }
            cap.count += 1;
            true
        } else {
            false
        }
    }

    /// 读取单步骤核算
    pub fn get(&self, step_name: &str) -> Option<&StepCapacity> {
        self.entries.get(step_name)
    }

    /// 导出为步骤利用率视图 (规划结果的一部分)
    pub fn into_utilization(self) -> HashMap<String, StepCapacity> {
        self.entries
    }
}
