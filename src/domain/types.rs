// ==========================================
// 生产流程引擎 - 领域类型定义
// ==========================================
// 职责: 步骤状态词汇表 + 状态分类 (Status Model)
// 红线: 分类是全函数,任何原始值都有归宿,永不报错
// ==========================================

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 完工时间戳的标准存储格式 (YYYY-MM-DD HH:MM)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// ==========================================
// 质量异常代码 (Quality Exception Code)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityCode {
    Qn,   // 质量通知单
    Difa, // 缺陷分析
}

impl fmt::Display for QualityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityCode::Qn => write!(f, "QN"),
            QualityCode::Difa => write!(f, "DIFA"),
        }
    }
}

// ==========================================
// 步骤状态 (Step State)
// ==========================================
// 派生状态,不落库;原始值仍以字符串形式存在工单上
// 未识别的手工文本归入 Manual,时长/排产口径等同 Planned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepState {
    Empty,                         // 未开始
    Planned,                       // 已计划 ("P" 或 "P,备注")
    InProgress,                    // 作业中 ("WIP")
    Hold,                          // 暂停
    QualityException(QualityCode), // 质量异常 ("QN"/"DIFA")
    NotApplicable,                 // 不适用 ("N/A"),一切计算跳过
    Completed(NaiveDateTime),      // 已完工,携带完工时间戳
    Manual(String),                // 手工备注,保留原文
}

impl StepState {
    /// 分类原始步骤值
    ///
    /// 规则按优先级依次匹配:
    /// 1) 时间戳形状 → Completed
    /// 2) "N/A" → NotApplicable
    /// 3) "Hold" → Hold
    /// 4) "QN"/"DIFA" → QualityException
    /// 5) "WIP" → InProgress
    /// 6) "P" 或 P 开头 (如 "P,备注") → Planned
    /// 7) 空白 → Empty
    /// 8) 其他 → Manual (原文保留)
    ///
    /// 大小写不敏感,首尾空白忽略;分类是全函数,永不返回错误
    pub fn classify(raw: &str) -> StepState {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return StepState::Empty;
        }

        if let Some(ts) = parse_completion_timestamp(trimmed) {
            return StepState::Completed(ts);
        }

        let upper = trimmed.to_uppercase();
        match upper.as_str() {
            "N/A" => StepState::NotApplicable,
            "HOLD" => StepState::Hold,
            "QN" => StepState::QualityException(QualityCode::Qn),
            "DIFA" => StepState::QualityException(QualityCode::Difa),
            "WIP" => StepState::InProgress,
            _ => {
                if upper.starts_with('P') {
                    StepState::Planned
                } else {
                    StepState::Manual(trimmed.to_string())
                }
            }
        }
    }

    /// 是否已完工
    pub fn is_completed(&self) -> bool {
        matches!(self, StepState::Completed(_))
    }

    /// 是否不适用
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, StepState::NotApplicable)
    }

    /// 当前步骤扫描口径: 已完工或不适用的步骤视为"已过"
    pub fn is_settled(&self) -> bool {
        self.is_completed() || self.is_not_applicable()
    }

    /// 是否质量异常
    pub fn is_quality_exception(&self) -> bool {
        matches!(self, StepState::QualityException(_))
    }

    /// 是否可被排产推荐分配 (工单当前步骤口径)
    ///
    /// Hold/质量异常阻断新分配;Planned 已在队列中,不重复计划;
    /// Manual 视为人工占用,同样不参与新分配
    pub fn is_plannable(&self) -> bool {
        matches!(self, StepState::Empty | StepState::InProgress)
    }

    /// 完工时间戳 (仅 Completed 有值)
    pub fn completed_at(&self) -> Option<NaiveDateTime> {
        match self {
            StepState::Completed(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Empty => write!(f, ""),
            StepState::Planned => write!(f, "P"),
            StepState::InProgress => write!(f, "WIP"),
            StepState::Hold => write!(f, "Hold"),
            StepState::QualityException(code) => write!(f, "{}", code),
            StepState::NotApplicable => write!(f, "N/A"),
            StepState::Completed(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            StepState::Manual(raw) => write!(f, "{}", raw),
        }
    }
}

/// 解析时间戳形状的步骤值
///
/// 支持的形状 (按尝试顺序):
/// - YYYY-MM-DD HH:MM
/// - YYYY-MM-DD HH:MM:SS
/// - YYYY-MM-DDTHH:MM:SS
/// - YYYY-MM-DD (按当日 00:00 处理)
///
/// 年份必须大于 2000,防止残缺数据被误判为完工
fn parse_completion_timestamp(value: &str) -> Option<NaiveDateTime> {
    if value.len() < 6 {
        return None;
    }

    let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    if parsed.year() > 2000 {
        Some(parsed)
    } else {
        None
    }
}

// ==========================================
// 工单优先级 (Order Priority)
// ==========================================
// 感叹号标记: "" < "!" < "!!" < "!!!"
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPriority {
    #[default]
    None, // 普通
    Low,    // !
    Medium, // !!
    High,   // !!!
}

impl OrderPriority {
    /// 从原始标记解析优先级,未识别值按普通处理
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "!!!" | "3" => OrderPriority::High,
            "!!" | "2" => OrderPriority::Medium,
            "!" | "1" => OrderPriority::Low,
            _ => OrderPriority::None,
        }
    }

    /// 数值等级 (0-3),单调递增
    pub fn rank(&self) -> u8 {
        match self {
            OrderPriority::None => 0,
            OrderPriority::Low => 1,
            OrderPriority::Medium => 2,
            OrderPriority::High => 3,
        }
    }

    /// 高优先级口径: "!!" 及以上
    pub fn is_high(&self) -> bool {
        self.rank() >= 2
    }
}

impl fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPriority::None => write!(f, ""),
            OrderPriority::Low => write!(f, "!"),
            OrderPriority::Medium => write!(f, "!!"),
            OrderPriority::High => write!(f, "!!!"),
        }
    }
}

// ==========================================
// 资源类型 (Resource Type)
// ==========================================
// 产能账本按资源类型区分: 人力受限步骤有分钟上限,机器步骤不设限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    StaffLimited,     // 人力受限
    MachineUnlimited, // 机器自动,产能不设限
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::StaffLimited => write!(f, "STAFF_LIMITED"),
            ResourceType::MachineUnlimited => write!(f, "MACHINE_UNLIMITED"),
        }
    }
}
