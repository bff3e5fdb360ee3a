// ==========================================
// 生产流程引擎 - 步完工自动化
// ==========================================
// 职责: 工作会话关闭后的两段自动化
//       1) 按量自动完工  2) 自动推进下一步
// 红线: 两段行为必须幂等,重复调用不产生重复审计;
//       自动推进不消耗任何产能
// ==========================================

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::line::LineConfig;
use crate::domain::order::Order;
use crate::domain::session::WorkSession;
use crate::domain::types::{StepState, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde_json::json;
use tracing::instrument;

// ==========================================
// StepAutomation - 步完工自动化引擎
// ==========================================
pub struct StepAutomation {
    // 无状态引擎,不需要注入依赖
}

impl StepAutomation {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 处理一次工作会话关闭
    ///
    /// 流程:
    /// 1) 累加该工单该步骤所有已关闭会话的数量,触及目标量则盖完工戳
    /// 2) 若步骤已完工且产线开启自动流转,向后推进至多一步为 "P"
    ///
    /// 会话未关闭时不做任何事。返回本次产生的审计条目 (可能为空)
    #[instrument(skip(self, order, line, session, all_sessions), fields(
        order_id = %order.id,
        step_name = %session.step_name
    ))]
    pub fn apply_session_close(
        &self,
        order: &mut Order,
        line: &LineConfig,
        session: &WorkSession,
        all_sessions: &[WorkSession],
        now: NaiveDateTime,
    ) -> Vec<AuditEntry> {
        if !session.is_closed() {
            return Vec::new();
        }

        let mut entries = Vec::new();

        if let Some(entry) = self.auto_complete_by_quantity(order, line, session, all_sessions, now)
        {
            entries.push(entry);
        }

        if order.state_of(&session.step_name).is_completed() {
            if let Some(entry) = self.auto_flow(order, line, &session.step_name, now) {
                entries.push(entry);
            }
        }

        entries
    }

    // ==========================================
    // 按量自动完工
    // ==========================================

    /// 已关闭会话数量累计触及目标量时,为步骤盖完工戳
    ///
    /// 无目标量的步骤永不自动完工;已完工步骤不重复盖戳 (幂等)
    fn auto_complete_by_quantity(
        &self,
        order: &mut Order,
        line: &LineConfig,
        session: &WorkSession,
        all_sessions: &[WorkSession],
        now: NaiveDateTime,
    ) -> Option<AuditEntry> {
        let step = line.step(&session.step_name)?;
        let target = step.target_quantity.filter(|t| *t > 0.0)?;

        if order.state_of(&step.name).is_completed() {
            return None;
        }

        let accumulated: f64 = all_sessions
            .iter()
            .filter(|s| {
                s.is_closed() && s.order_id == order.id && s.step_name == step.name
            })
            .map(|s| s.quantity)
            .sum();

        if accumulated < target {
            return None;
        }

        let previous = order.raw_value(&step.name).to_string();
        let stamp = now.format(TIMESTAMP_FORMAT).to_string();
        order.step_values.insert(step.name.clone(), stamp.clone());

        tracing::info!(
            order_id = %order.id,
            step_name = %step.name,
            accumulated,
            target,
            "按量自动完工"
        );

        let detail = json!({
            "reason": "按量自动完工",
            "accumulated_quantity": accumulated,
            "target_quantity": target,
            "previous_value": previous,
            "new_value": stamp,
        })
        .to_string();

        Some(AuditEntry::new(
            &order.id,
            &step.name,
            AuditAction::AutoCompleted,
            detail,
            now,
        ))
    }

    // ==========================================
    // 自动流转
    // ==========================================

    /// 从已完工步骤向后推进至多一步
    ///
    /// 向后扫描规则: 不适用跳过;空步骤置 "P" 并停止;
    /// 已是 "P" 直接停止 (幂等);其他被占用状态跳过
    fn auto_flow(
        &self,
        order: &mut Order,
        line: &LineConfig,
        completed_step: &str,
        now: NaiveDateTime,
    ) -> Option<AuditEntry> {
        if !line.auto_flow_enabled {
            return None;
        }
        let start_index = line.step_index(completed_step)?;

        for step in &line.steps[start_index + 1..] {
            match order.state_of(&step.name) {
                StepState::NotApplicable => continue,
                StepState::Planned => return None, // 已在队列,无需重复推进
                StepState::Empty => {
                    order
                        .step_values
                        .insert(step.name.clone(), "P".to_string());

                    tracing::info!(
                        order_id = %order.id,
                        from = %completed_step,
                        to = %step.name,
                        "自动流转推进下一步"
                    );

                    let detail = json!({
                        "reason": "完工后自动推进",
                        "triggered_by": completed_step,
                        "previous_value": "",
                        "new_value": "P",
                    })
                    .to_string();

                    return Some(AuditEntry::new(
                        &order.id,
                        &step.name,
                        AuditAction::AutoPlanned,
                        detail,
                        now,
                    ));
                }
                _ => continue, // 被占用的步骤不动,继续向后找
            }
        }

        None
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for StepAutomation {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::line::{ScoringWeights, ShiftConfig, StepDefinition};
    use crate::domain::types::{OrderPriority, ResourceType};
    use chrono::NaiveDate;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn dt(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn create_test_line(auto_flow: bool) -> LineConfig {
        let step = |name: &str, position: u32, target: Option<f64>| StepDefinition {
            name: name.to_string(),
            position,
            standard_duration_minutes: 60.0,
            target_quantity: target,
            unit: Some("件".to_string()),
            resource_type: ResourceType::StaffLimited,
            staff_count: 1,
        };
        LineConfig {
            line_id: "L1".to_string(),
            steps: vec![
                step("裁剪", 1, Some(100.0)),
                step("特殊处理", 2, None),
                step("缝制", 3, Some(100.0)),
                step("包装", 4, None),
            ],
            shift: ShiftConfig::default(),
            weights: ScoringWeights::default(),
            auto_flow_enabled: auto_flow,
            monthly_target: None,
        }
    }

    fn create_test_order(values: &[(&str, &str)]) -> Order {
        Order {
            id: "WO001".to_string(),
            line_id: "L1".to_string(),
            priority: OrderPriority::None,
            due_date: None,
            created_at: dt(1, 8, 0),
            step_values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn closed_session(id: &str, step_name: &str, quantity: f64) -> WorkSession {
        WorkSession {
            id: id.to_string(),
            order_id: "WO001".to_string(),
            step_name: step_name.to_string(),
            user_id: "U1".to_string(),
            start_time: dt(2, 8, 0),
            end_time: Some(dt(2, 12, 0)),
            quantity,
            standard_time_minutes: Some(60.0),
        }
    }

    // ==========================================
    // 按量自动完工测试
    // ==========================================

    #[test]
    fn test_auto_complete_when_quantity_reaches_target() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[("裁剪", "WIP")]);

        let sessions = vec![
            closed_session("S1", "裁剪", 60.0),
            closed_session("S2", "裁剪", 40.0),
        ];
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[1], &sessions, dt(2, 12, 0));

        // 60 + 40 = 100 触及目标: 盖戳 + 自动推进 (特殊处理为空,置 P)
        assert!(order.state_of("裁剪").is_completed());
        assert_eq!(order.raw_value("裁剪"), "2026-03-02 12:00");
        assert_eq!(order.raw_value("特殊处理"), "P");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::AutoCompleted);
        assert_eq!(entries[1].action, AuditAction::AutoPlanned);
    }

    #[test]
    fn test_sequential_closes_complete_only_at_target() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[("裁剪", "WIP")]);

        // 40 + 40 + 20: 前两次关单不够量,第三次触发完工
        let mut sessions: Vec<WorkSession> = Vec::new();
        for (i, qty) in [40.0, 40.0, 20.0].iter().enumerate() {
            sessions.push(closed_session(&format!("S{}", i), "裁剪", *qty));
            let entries = automation.apply_session_close(
                &mut order,
                &line,
                &sessions[i],
                &sessions,
                dt(2, 10 + i as u32, 0),
            );

            if i < 2 {
                assert!(entries.is_empty());
                assert_eq!(order.raw_value("裁剪"), "WIP");
            } else {
                assert!(order.state_of("裁剪").is_completed());
                assert_eq!(entries[0].action, AuditAction::AutoCompleted);
            }
        }
    }

    #[test]
    fn test_no_auto_complete_below_target() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[("裁剪", "WIP")]);

        let sessions = vec![closed_session("S1", "裁剪", 99.0)];
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 12, 0));

        assert!(entries.is_empty());
        assert_eq!(order.raw_value("裁剪"), "WIP");
    }

    #[test]
    fn test_step_without_target_never_auto_completes() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[("包装", "WIP")]);

        let sessions = vec![closed_session("S1", "包装", 1e6)];
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 12, 0));

        assert!(entries.is_empty());
        assert_eq!(order.raw_value("包装"), "WIP");
    }

    #[test]
    fn test_open_session_quantity_excluded() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[("裁剪", "WIP")]);

        let mut open = closed_session("S1", "裁剪", 80.0);
        open.end_time = None;
        let sessions = vec![open, closed_session("S2", "裁剪", 30.0)];

        // 未关闭会话的 80 不计入: 30 < 100
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[1], &sessions, dt(2, 12, 0));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_session_close_is_idempotent() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[("裁剪", "WIP")]);

        let sessions = vec![closed_session("S1", "裁剪", 120.0)];
        let first =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 12, 0));
        assert_eq!(first.len(), 2);

        // 重复投递同一关闭事件: 已完工不重复盖戳,下一步已是 P 不重复推进
        let second =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 13, 0));
        assert!(second.is_empty());
        assert_eq!(order.raw_value("裁剪"), "2026-03-02 12:00");
    }

    #[test]
    fn test_open_session_event_ignored() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[]);

        let mut session = closed_session("S1", "裁剪", 200.0);
        session.end_time = None;
        let sessions = vec![session.clone()];

        let entries =
            automation.apply_session_close(&mut order, &line, &session, &sessions, dt(2, 12, 0));
        assert!(entries.is_empty());
    }

    // ==========================================
    // 自动流转测试
    // ==========================================

    #[test]
    fn test_auto_flow_skips_not_applicable() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        // 特殊处理标记 N/A: 推进应越过它落在缝制
        let mut order = create_test_order(&[("裁剪", "WIP"), ("特殊处理", "N/A")]);

        let sessions = vec![closed_session("S1", "裁剪", 100.0)];
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 12, 0));

        assert_eq!(order.raw_value("特殊处理"), "N/A");
        assert_eq!(order.raw_value("缝制"), "P");
        assert_eq!(entries[1].step_name, "缝制");
    }

    #[test]
    fn test_auto_flow_skips_occupied_step() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        // 缝制被 Hold 占用: 越过它落在包装
        let mut order = create_test_order(&[
            ("裁剪", "WIP"),
            ("特殊处理", "N/A"),
            ("缝制", "Hold"),
        ]);

        let sessions = vec![closed_session("S1", "裁剪", 100.0)];
        automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 12, 0));

        assert_eq!(order.raw_value("缝制"), "Hold");
        assert_eq!(order.raw_value("包装"), "P");
    }

    #[test]
    fn test_auto_flow_stops_at_planned_without_audit() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[("裁剪", "WIP"), ("特殊处理", "P")]);

        let sessions = vec![closed_session("S1", "裁剪", 100.0)];
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 12, 0));

        // 只有自动完工条目,没有推进条目
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::AutoCompleted);
    }

    #[test]
    fn test_auto_flow_disabled_by_line_config() {
        let automation = StepAutomation::new();
        let line = create_test_line(false);
        let mut order = create_test_order(&[("裁剪", "WIP")]);

        let sessions = vec![closed_session("S1", "裁剪", 100.0)];
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 12, 0));

        assert!(order.state_of("裁剪").is_completed());
        assert_eq!(order.raw_value("特殊处理"), "");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_auto_flow_at_last_step_does_nothing() {
        let automation = StepAutomation::new();
        let line = create_test_line(true);
        let mut order = create_test_order(&[
            ("裁剪", "2026-03-01 10:00"),
            ("特殊处理", "N/A"),
            ("缝制", "2026-03-02 10:00"),
            ("包装", "WIP"),
        ]);

        // 末位步骤手工完工后关会话: 无后续步骤可推进
        order
            .step_values
            .insert("包装".to_string(), "2026-03-02 18:00".to_string());
        let sessions = vec![closed_session("S1", "包装", 10.0)];
        let entries =
            automation.apply_session_close(&mut order, &line, &sessions[0], &sessions, dt(2, 18, 0));

        assert!(entries.is_empty());
    }
}
