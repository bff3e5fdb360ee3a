// ==========================================
// 生产流程引擎 - 核心库
// ==========================================
// 系统定位: 纯计算引擎 (宿主负责持久化与对外接口)
// 技术栈: Rust + chrono + tracing
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{OrderPriority, QualityCode, ResourceType, StepState};

// 领域实体
pub use domain::{
    AuditAction, AuditEntry, LineConfig, Order, ScoringWeights, ShiftConfig, StepDefinition,
    WorkSession,
};

// 引擎
pub use engine::{
    CapacityLedger, CapacityOverride, CompletionProjector, PlanningSummary, PredictedFlowStep,
    Recommendation, SchedulingRecommender, SchedulingResult, StepAutomation, StepCapacity,
};

// 错误
pub use error::EngineError;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产流程引擎";

// ==========================================
// 预编译检查
// ==========================================
