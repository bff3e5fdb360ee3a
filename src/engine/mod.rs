// ==========================================
// 生产流程引擎 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,纯内存计算,不做任何 I/O
// 红线: 所有自动决策必须输出可解释的 reason
// ==========================================

pub mod automation;
pub mod capacity;
pub mod projector;
pub mod recommender;

// 重导出核心引擎
pub use automation::StepAutomation;
pub use capacity::{CapacityLedger, CapacityOverride, StepCapacity};
pub use projector::CompletionProjector;
pub use recommender::{
    PlanningSummary, PredictedFlowStep, Recommendation, SchedulingRecommender, SchedulingResult,
    MAX_RECOMMENDATIONS,
};
