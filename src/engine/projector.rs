// ==========================================
// 生产流程引擎 - 完工预测引擎
// ==========================================
// 职责: 基于步骤状态/标准时长/出勤日历预测工单完工日期 (ECD)
// 输入: 工单快照 + 产线配置 + 当前时间
// 输出: YYYY-MM-DD 或空串 (无法给出预测)
// 红线: 预测是规划辅助,任何输入异常降级为安全默认,永不报错
// ==========================================

use crate::domain::line::LineConfig;
use crate::domain::order::Order;
use crate::domain::types::StepState;
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Weekday};
use tracing::{instrument, warn};

/// 日历推进的迭代安全上限 (约一年的小时数)
///
/// 时长配置异常大时保证终止,触顶时返回当前最优局部预测
const MAX_CALENDAR_ITERATIONS: u32 = 365 * 24;

/// 停滞判定阈值: 距最近完工超过该小时数,流程视为停滞,起点重置为当前时间
const STALL_THRESHOLD_HOURS: i64 = 24;

// ==========================================
// CompletionProjector - 完工预测引擎
// ==========================================
pub struct CompletionProjector {
    // 无状态引擎,不需要注入依赖
}

impl CompletionProjector {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 预测工单完工日期
    ///
    /// 流程:
    /// 1) 整单完工 → 空串 (无 ECD)
    /// 2) 选定起点: 质量异常 > 停滞 > 最近完工时间 > 当前时间
    /// 3) 累计剩余工作量 (分钟)
    /// 4) 沿出勤日历推进,跳过非工作日
    ///
    /// # 返回
    /// 完工日期 (YYYY-MM-DD),无可预测内容时为空串
    #[instrument(skip(self, order, line), fields(order_id = %order.id))]
    pub fn project(&self, order: &Order, line: &LineConfig, now: NaiveDateTime) -> String {
        if line.steps.is_empty() {
            return String::new();
        }
        if order.is_fully_complete(line) {
            return String::new();
        }

        let remaining_minutes = self.remaining_minutes(order, line);
        if remaining_minutes <= 0.0 {
            return String::new();
        }

        let start = self.select_start_time(order, line, now);
        let finish = self.advance_calendar(start, remaining_minutes, line, &order.id);

        finish.date().format("%Y-%m-%d").to_string()
    }

    // ==========================================
    // 起点选择
    // ==========================================

    /// 选定预测起点
    ///
    /// 规则 (命中即返回):
    /// 1) 任意步骤存在质量异常 → 流程被打断,起点 = 当前时间
    /// 2) 无任何完工步骤 → 尚未启动,起点 = 当前时间
    /// 3) 距最近完工超过 24 小时 → 流程停滞,起点 = 当前时间
    /// 4) 正常流转 → 起点 = 最近完工时间
    fn select_start_time(
        &self,
        order: &Order,
        line: &LineConfig,
        now: NaiveDateTime,
    ) -> NaiveDateTime {
        if order.has_quality_exception(line) {
            return now;
        }

        match order.latest_completion(line) {
            None => now,
            Some(last) => {
                // 按分钟比较,24h 零几分钟的闲置同样算停滞
                let idle_minutes = (now - last).num_minutes();
                if idle_minutes > STALL_THRESHOLD_HOURS * 60 {
                    now
                } else {
                    last
                }
            }
        }
    }

    // ==========================================
    // 剩余工作量
    // ==========================================

    /// 累计剩余工作量 (分钟)
    ///
    /// 口径:
    /// - 当前步骤之前的已完工/不适用步骤: 0
    /// - 当前步骤: WIP 按半量 (假定完成 50%),其余未完工状态按全量
    /// - 当前步骤之后: 不适用计 0,其余一律全量
    /// - 时长未配置的步骤按 24 小时兜底
    fn remaining_minutes(&self, order: &Order, line: &LineConfig) -> f64 {
        let mut total = 0.0;
        let mut found_incomplete = false;

        for step in &line.steps {
            let state = order.state_of(&step.name);
            let duration = step.effective_duration_minutes();

            if !found_incomplete {
                if state.is_settled() {
                    continue;
                }
                found_incomplete = true;

                if state == StepState::InProgress {
                    total += duration * 0.5;
                } else {
                    total += duration;
                }
            } else if !state.is_not_applicable() {
                total += duration;
            }
        }

        total
    }

    // ==========================================
    // 日历推进
    // ==========================================

    /// 从起点沿出勤日历推进指定分钟数
    ///
    /// 每轮最多消耗当日剩余时间;落在非工作日 (周六/周日按班次配置)
    /// 则跳到次日 09:00 再继续消耗
    fn advance_calendar(
        &self,
        start: NaiveDateTime,
        minutes: f64,
        line: &LineConfig,
        order_id: &str,
    ) -> NaiveDateTime {
        let morning = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
        let mut cursor = start;
        let mut remaining = minutes;
        let mut iterations: u32 = 0;

        while remaining > 0.0 {
            iterations += 1;
            if iterations > MAX_CALENDAR_ITERATIONS {
                warn!(
                    order_id,
                    remaining_minutes = remaining,
                    "完工预测迭代触顶,疑似步骤时长配置异常,返回局部预测"
                );
                break;
            }

            // 非工作日: 跳到次日工作开始
            let weekday = cursor.weekday();
            let skip_saturday = weekday == Weekday::Sat && !line.shift.work_saturday;
            let skip_sunday = weekday == Weekday::Sun && !line.shift.work_sunday;
            if skip_saturday || skip_sunday {
                cursor = (cursor.date() + Duration::days(1)).and_time(morning);
                continue;
            }

            // 当日剩余可用分钟
            let consumed_today =
                f64::from(cursor.time().hour() * 60 + cursor.time().minute());
            let minutes_left_today = (24.0 * 60.0 - consumed_today).max(0.0);

            if remaining <= minutes_left_today {
                cursor += Duration::seconds((remaining * 60.0).round() as i64);
                remaining = 0.0;
            } else {
                remaining -= minutes_left_today;
                cursor = (cursor.date() + Duration::days(1)).and_time(NaiveTime::MIN);
            }
        }

        cursor
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for CompletionProjector {
    fn default() -> Self {
        Self::new()
    }
}
