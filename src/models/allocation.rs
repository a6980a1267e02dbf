use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::allocation_entity;

use super::{LocalizedName, Prize};

/// 中奖记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Allocation {
    /// 记录ID
    pub id: i64,
    /// 参与者ID（唯一）
    pub requester_id: String,
    /// 参与者名称（仅展示）
    pub requester_name: String,
    pub prize_id: String,
    /// 中奖时的奖品名称快照
    pub prize_name: LocalizedName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_address: Option<String>,
    /// 中奖时间
    pub created_at: DateTime<Utc>,
}

impl From<allocation_entity::Model> for Allocation {
    fn from(m: allocation_entity::Model) -> Self {
        Allocation {
            id: m.id,
            requester_id: m.requester_id,
            requester_name: m.requester_name,
            prize_id: m.prize_id,
            prize_name: LocalizedName {
                zh: m.prize_name_zh,
                en: m.prize_name_en,
            },
            origin_address: m.origin_address,
            created_at: m.created_at,
        }
    }
}

/// 尚未确定奖品的抽奖请求信息
#[derive(Debug, Clone)]
pub struct AllocationDraft {
    pub requester_id: String,
    pub requester_name: String,
    pub origin_address: Option<String>,
}

impl AllocationDraft {
    /// 绑定扣减后的奖品快照
    pub fn for_prize(self, prize: &Prize) -> NewAllocation {
        NewAllocation {
            requester_id: self.requester_id,
            requester_name: self.requester_name,
            prize_id: prize.id.clone(),
            prize_name: prize.name.clone(),
            origin_address: self.origin_address,
        }
    }
}

/// 待写入的中奖记录
#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub requester_id: String,
    pub requester_name: String,
    pub prize_id: String,
    pub prize_name: LocalizedName,
    pub origin_address: Option<String>,
}

/// 抽奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawRequest {
    #[serde(default, alias = "userId")]
    pub requester_id: Option<String>,
    #[serde(default, alias = "userName")]
    pub requester_name: Option<String>,
}

/// 抽奖成功结果: 中奖记录 + 扣减后的奖品
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawOutcome {
    pub allocation: Allocation,
    pub prize: Prize,
}

/// 资格查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct EligibilityQuery {
    #[serde(default, alias = "userId")]
    pub requester_id: Option<String>,
}

/// 资格查询响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EligibilityResponse {
    pub has_drawn: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<Allocation>,
}

impl From<Option<Allocation>> for EligibilityResponse {
    fn from(prior: Option<Allocation>) -> Self {
        EligibilityResponse {
            has_drawn: prior.is_some(),
            prize: prior,
        }
    }
}
