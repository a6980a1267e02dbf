use serde::Serialize;
use utoipa::ToSchema;

/// 库存与中奖记录不一致的奖品
/// expected_allocated = total - remaining, recorded = 实际中奖记录数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockDiscrepancy {
    pub prize_id: String,
    /// 奖品已不在目录中
    pub unknown_prize: bool,
    pub expected_allocated: i64,
    pub recorded: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconcileReport {
    pub prizes_checked: usize,
    pub allocations_checked: usize,
    pub discrepancies: Vec<StockDiscrepancy>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}
