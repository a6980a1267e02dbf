use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{AllocationDraft, DrawOutcome, Prize};
use crate::store::LotteryStore;

/// 原子扣减库存。
///
/// 快照可能已过期, 扣减失败 (`StockExhausted`) 是并发下的正常结果,
/// 由调用方决定是否整体重试一次。
#[derive(Clone)]
pub struct AtomicAllocator {
    store: Arc<dyn LotteryStore>,
}

impl AtomicAllocator {
    pub fn new(store: Arc<dyn LotteryStore>) -> Self {
        Self { store }
    }

    /// remaining > 0 时减 1 并返回扣减后的记录
    pub async fn try_decrement(&self, prize_id: &str) -> AppResult<Prize> {
        self.store
            .try_decrement(prize_id)
            .await?
            .ok_or_else(|| AppError::StockExhausted(prize_id.to_string()))
    }

    /// 扣减库存并写入中奖记录 (同一工作单元)
    pub async fn claim(&self, prize: &Prize, draft: AllocationDraft) -> AppResult<DrawOutcome> {
        self.store.claim(&prize.id, draft).await
    }
}
