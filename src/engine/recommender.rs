// ==========================================
// 生产流程引擎 - 排产推荐引擎
// ==========================================
// 职责: 多因子加权评分 + 产能账本下的贪心分配
// 输入: 工单列表 + 产线配置 + 班次/窗口参数 + 产能覆写
// 输出: 推荐列表 + 步骤利用率 + 汇总统计
// 红线: 产能约束优先于评分高低;零工单/零产能返回空结果,不报错
// ==========================================

use crate::domain::line::LineConfig;
use crate::domain::order::Order;
use crate::domain::types::{OrderPriority, StepState};
use crate::engine::capacity::{CapacityLedger, CapacityOverride, StepCapacity};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::instrument;

/// 单次规划运行的推荐数上限,防止超大数据集拖垮规划
pub const MAX_RECOMMENDATIONS: usize = 500;

// ==========================================
// 输出结构
// ==========================================

/// 预测流转中的一步 (零排队假设下的预览,不消耗产能)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedFlowStep {
    pub step_name: String,
    pub estimated_start_hour: f64, // 相对规划起点 (小时)
    pub estimated_end_hour: f64,
}

/// 单条排产推荐
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub order_id: String,
    pub step_name: String,
    pub score: f64,
    pub score_detail: String, // 评分构成 (JSON, 可解释性)
    pub predicted_flow: Vec<PredictedFlowStep>,
}

/// 规划汇总统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningSummary {
    pub total_planned: usize,
    pub high_priority_planned: usize, // "!!" 及以上
    pub blocked: usize,               // 当前步骤 Hold/质量异常,不参与新分配
    pub skipped_due_to_capacity: usize,
    pub daily_capacity_from_goal: Option<f64>, // 月度目标折算的日产能 (仅展示)
}

/// 规划运行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub recommendations: Vec<Recommendation>,
    pub step_utilization: HashMap<String, StepCapacity>,
    pub summary: PlanningSummary,
}

// ==========================================
// 内部评分结构
// ==========================================

/// 候选工单评分明细
struct ScoredCandidate {
    order_index: usize,
    next_step: String,
    duration_minutes: f64,
    priority: OrderPriority,
    priority_score: f64,
    urgency_score: f64,
    aging_score: f64,
    combined_score: f64,
    due_date: Option<NaiveDate>,
    created_at: NaiveDateTime,
}

// ==========================================
// SchedulingRecommender - 排产推荐引擎
// ==========================================
pub struct SchedulingRecommender {
    // 无状态引擎,不需要注入依赖
}

impl SchedulingRecommender {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成排产推荐
    ///
    /// 流程:
    /// 1) 过滤候选: 当前步骤为 Empty/WIP 的未完工工单;
    ///    Hold/质量异常计入 blocked,其余占用状态不重复计划
    /// 2) 多因子评分 (优先级/交期紧迫度/工单龄, 权重来自产线配置)
    /// 3) 分数降序贪心分配,产能容不下则记 skipped_due_to_capacity
    /// 4) 同分并列: 交期升序, 再按创建时间升序
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, orders, line, overrides), fields(
        line_id = %line.line_id,
        orders_count = orders.len(),
        planning_horizon_hours
    ))]
    pub fn recommend(
        &self,
        orders: &[Order],
        line: &LineConfig,
        standard_hours: f64,
        overtime_hours: f64,
        planning_horizon_hours: f64,
        overrides: &HashMap<String, CapacityOverride>,
        now: NaiveDateTime,
    ) -> SchedulingResult {
        let mut ledger = CapacityLedger::build(
            line,
            planning_horizon_hours,
            standard_hours,
            overtime_hours,
            overrides,
        );
        let mut summary = PlanningSummary {
            daily_capacity_from_goal: daily_capacity_from_monthly_goal(
                line.monthly_target,
                now.date(),
                line.shift.work_saturday,
                line.shift.work_sunday,
            ),
            ..PlanningSummary::default()
        };

        // 1. 过滤 + 评分
        let mut candidates: Vec<ScoredCandidate> = Vec::new();
        for (index, order) in orders.iter().enumerate() {
            if order.is_fully_complete(line) {
                continue;
            }
            let Some(step) = order.current_step(line) else {
                continue;
            };

            let state = order.state_of(&step.name);
            if state.is_plannable() {
                candidates.push(self.score_candidate(index, order, line, step.name.clone(), now));
            } else if matches!(state, StepState::Hold | StepState::QualityException(_)) {
                summary.blocked += 1;
            }
            // Planned/Manual: 已在队列或人工占用,不重复计划
        }

        // 2. 排序 (分数降序 + 确定性并列规则)
        candidates.sort_by(|a, b| Self::compare_candidates(a, b));

        // 3. 贪心分配
        let mut recommendations = Vec::new();
        for candidate in &candidates {
            if recommendations.len() >= MAX_RECOMMENDATIONS {
                break;
            }

            if !ledger.allocate(&candidate.next_step, candidate.duration_minutes) {
                summary.skipped_due_to_capacity += 1;
                continue;
            }

            if candidate.priority.is_high() {
                summary.high_priority_planned += 1;
            }

            let order = &orders[candidate.order_index];
            let predicted_flow = if line.auto_flow_enabled {
                self.predict_flow(order, line, &candidate.next_step, planning_horizon_hours)
            } else {
                Vec::new()
            };

            recommendations.push(Recommendation {
                order_id: order.id.clone(),
                step_name: candidate.next_step.clone(),
                score: candidate.combined_score,
                score_detail: json!({
                    "priority_score": candidate.priority_score,
                    "urgency_score": candidate.urgency_score,
                    "aging_score": candidate.aging_score,
                })
                .to_string(),
                predicted_flow,
            });
        }

        summary.total_planned = recommendations.len();

        SchedulingResult {
            recommendations,
            step_utilization: ledger.into_utilization(),
            summary,
        }
    }

    // ==========================================
    // 评分
    // ==========================================

    /// 计算候选工单的复合评分
    ///
    /// 三项子分均归一到 0-100 量级 (逾期紧迫度允许突破 100,
    /// 避免大量逾期工单评分趋平),权重是相对乘数
    fn score_candidate(
        &self,
        order_index: usize,
        order: &Order,
        line: &LineConfig,
        next_step: String,
        now: NaiveDateTime,
    ) -> ScoredCandidate {
        let today = now.date();

        // 优先级: 等级/3 × 100,随感叹号数单调递增
        let priority_score = f64::from(order.priority.rank()) / 3.0 * 100.0;

        // 交期紧迫度: 逾期每天 +1 线性增长,未逾期每临近一天 +10
        let urgency_score = match order.due_date {
            Some(due) => {
                let days_left = (due - today).num_days();
                if days_left <= 0 {
                    100.0 + days_left.unsigned_abs() as f64
                } else {
                    (100.0 - days_left as f64 * 10.0).max(0.0)
                }
            }
            None => 0.0,
        };

        // 工单龄: 每天 +5, 封顶 100
        let age_days = (today - order.created_at.date()).num_days().max(0);
        let aging_score = (age_days as f64 * 5.0).min(100.0);

        let weights = &line.weights;
        let combined_score = priority_score * weights.priority / 100.0
            + urgency_score * weights.due_date / 100.0
            + aging_score * weights.aging / 100.0;

        let duration_minutes = line
            .step(&next_step)
            .map(|s| s.effective_duration_minutes())
            .unwrap_or(0.0);

        ScoredCandidate {
            order_index,
            next_step,
            duration_minutes,
            priority: order.priority,
            priority_score,
            urgency_score,
            aging_score,
            combined_score,
            due_date: order.due_date,
            created_at: order.created_at,
        }
    }

    /// 候选排序: 分数降序;同分按交期升序 (缺失交期排最后),
    /// 再按创建时间升序 (先到先排)
    fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
        match b.combined_score.total_cmp(&a.combined_score) {
            Ordering::Equal => {}
            other => return other,
        }

        let due_a = a.due_date.unwrap_or(NaiveDate::MAX);
        let due_b = b.due_date.unwrap_or(NaiveDate::MAX);
        match due_a.cmp(&due_b) {
            Ordering::Equal => {}
            other => return other,
        }

        a.created_at.cmp(&b.created_at)
    }

    // ==========================================
    // 流转预览
    // ==========================================

    /// 预测工单在规划窗口内的零排队流转
    ///
    /// 从当前步骤起沿管线扫描: 不适用与被占用的步骤跳过,
    /// 空/已计划步骤依次入链,累计时长触及窗口即止。
    /// 仅作预览,不消耗任何产能
    fn predict_flow(
        &self,
        order: &Order,
        line: &LineConfig,
        start_step: &str,
        planning_horizon_hours: f64,
    ) -> Vec<PredictedFlowStep> {
        let Some(start_index) = line.step_index(start_step) else {
            return Vec::new();
        };
        let planning_minutes = planning_horizon_hours * 60.0;

        let mut flow = Vec::new();
        let mut accumulated_minutes = 0.0;

        for step in &line.steps[start_index..] {
            if accumulated_minutes >= planning_minutes {
                break;
            }

            let is_start = step.name == start_step;
            if !is_start {
                match order.state_of(&step.name) {
                    StepState::Empty | StepState::Planned => {}
                    _ => continue, // 不适用或被占用的步骤不入链
                }
            }

            let duration = step.effective_duration_minutes();
            flow.push(PredictedFlowStep {
                step_name: step.name.clone(),
                estimated_start_hour: round1(accumulated_minutes / 60.0),
                estimated_end_hour: round1(
                    ((accumulated_minutes + duration) / 60.0).min(planning_horizon_hours),
                ),
            });
            accumulated_minutes += duration;
        }

        flow
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for SchedulingRecommender {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 月度目标折算日产能
///
/// 按当月出勤日数均摊并向上取整;仅用于达成率展示,不参与分配
pub fn daily_capacity_from_monthly_goal(
    monthly_target: Option<f64>,
    today: NaiveDate,
    work_saturday: bool,
    work_sunday: bool,
) -> Option<f64> {
    let target = monthly_target.filter(|t| *t > 0.0)?;

    let first = today.with_day(1)?;
    let next_month_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
    };

    let mut working_days = 0u32;
    let mut day = first;
    while day < next_month_first {
        let weekday = day.weekday();
        let off_saturday = weekday == chrono::Weekday::Sat && !work_saturday;
        let off_sunday = weekday == chrono::Weekday::Sun && !work_sunday;
        if !off_saturday && !off_sunday {
            working_days += 1;
        }
        day += Duration::days(1);
    }

    if working_days == 0 {
        return None;
    }
    Some((target / f64::from(working_days)).ceil())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
