// ==========================================
// 生产流程引擎 - 领域层
// ==========================================
// 职责: 实体与类型定义,不含业务规则计算
// ==========================================

pub mod audit;
pub mod line;
pub mod order;
pub mod session;
pub mod types;

// 重导出核心实体
pub use audit::{AuditAction, AuditEntry};
pub use line::{LineConfig, ScoringWeights, ShiftConfig, StepDefinition};
pub use order::Order;
pub use session::WorkSession;
pub use types::{OrderPriority, QualityCode, ResourceType, StepState};
