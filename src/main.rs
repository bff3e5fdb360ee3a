// ==========================================
// 生产流程引擎 - 演示入口
// ==========================================
// 构造一条示例产线与几张工单,依次跑完工预测、
// 排产推荐与步完工自动化,输出结果到日志
// ==========================================

use anyhow::Result;
use chrono::Local;
use production_flow_engine::domain::line::{
    LineConfig, ScoringWeights, ShiftConfig, StepDefinition,
};
use production_flow_engine::{
    logging, CompletionProjector, Order, OrderPriority, ResourceType, SchedulingRecommender,
    StepAutomation, WorkSession,
};
use std::collections::HashMap;

fn main() -> Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", production_flow_engine::APP_NAME, production_flow_engine::VERSION);
    tracing::info!("==================================================");

    let now = Local::now().naive_local();
    let line = demo_line();
    line.validate()?;

    let mut orders = demo_orders(now);

    // 1. 完工预测
    let projector = CompletionProjector::new();
    for order in &orders {
        let ecd = projector.project(order, &line, now);
        tracing::info!(order_id = %order.id, ecd = %ecd, "完工预测");
    }

    // 2. 排产推荐
    let recommender = SchedulingRecommender::new();
    let result = recommender.recommend(&orders, &line, 8.0, 2.0, 24.0, &HashMap::new(), now);
    tracing::info!(
        total_planned = result.summary.total_planned,
        high_priority = result.summary.high_priority_planned,
        blocked = result.summary.blocked,
        skipped = result.summary.skipped_due_to_capacity,
        "排产推荐完成"
    );
    for rec in &result.recommendations {
        tracing::info!(
            order_id = %rec.order_id,
            step = %rec.step_name,
            score = rec.score,
            detail = %rec.score_detail,
            "推荐条目"
        );
    }

    // 3. 步完工自动化: 模拟一次关单触发按量完工
    let automation = StepAutomation::new();
    let session = WorkSession {
        id: "S001".to_string(),
        order_id: "WO-1001".to_string(),
        step_name: "裁剪".to_string(),
        user_id: "U001".to_string(),
        start_time: now,
        end_time: Some(now),
        quantity: 100.0,
        standard_time_minutes: Some(120.0),
    };
    let sessions = vec![session.clone()];
    let entries = automation.apply_session_close(&mut orders[0], &line, &session, &sessions, now);
    for entry in &entries {
        tracing::info!(
            order_id = %entry.order_id,
            step = %entry.step_name,
            action = %entry.action,
            detail = %entry.detail,
            "自动化审计条目"
        );
    }

    tracing::info!("演示结束");
    Ok(())
}

fn demo_line() -> LineConfig {
    let step = |name: &str, position: u32, minutes: f64, target: Option<f64>, rt, staff| {
        StepDefinition {
            name: name.to_string(),
            position,
            standard_duration_minutes: minutes,
            target_quantity: target,
            unit: Some("件".to_string()),
            resource_type: rt,
            staff_count: staff,
        }
    };

    LineConfig {
        line_id: "DEMO-L1".to_string(),
        steps: vec![
            step("裁剪", 1, 120.0, Some(100.0), ResourceType::StaffLimited, 2),
            step("烘干", 2, 240.0, None, ResourceType::MachineUnlimited, 0),
            step("缝制", 3, 180.0, Some(100.0), ResourceType::StaffLimited, 3),
            step("包装", 4, 60.0, None, ResourceType::StaffLimited, 1),
        ],
        shift: ShiftConfig {
            standard_hours: 8.0,
            overtime_hours: 2.0,
            work_saturday: false,
            work_sunday: false,
        },
        weights: ScoringWeights::default(),
        auto_flow_enabled: true,
        monthly_target: Some(2000.0),
    }
}

fn demo_orders(now: chrono::NaiveDateTime) -> Vec<Order> {
    let order = |id: &str, priority, due_days: Option<i64>, values: &[(&str, &str)]| Order {
        id: id.to_string(),
        line_id: "DEMO-L1".to_string(),
        priority,
        due_date: due_days.map(|d| now.date() + chrono::Duration::days(d)),
        created_at: now - chrono::Duration::days(3),
        step_values: values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    };

    vec![
        order("WO-1001", OrderPriority::High, Some(2), &[("裁剪", "WIP")]),
        order("WO-1002", OrderPriority::Medium, Some(7), &[]),
        order("WO-1003", OrderPriority::None, None, &[("裁剪", "Hold")]),
        order("WO-1004", OrderPriority::Low, Some(-1), &[("裁剪", "2026-03-02 10:00")]),
    ]
}
