use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Allocation, AllocationDraft, DrawOutcome, DrawRequest, EligibilityResponse};
use crate::services::{AtomicAllocator, EligibilityGuard, selector};
use crate::store::LotteryStore;

const MAX_REQUESTER_ID_LEN: usize = 64;
const MAX_REQUESTER_NAME_LEN: usize = 100;

#[derive(Clone)]
pub struct DrawService {
    store: Arc<dyn LotteryStore>,
    guard: EligibilityGuard,
    allocator: AtomicAllocator,
}

impl DrawService {
    pub fn new(store: Arc<dyn LotteryStore>, check_origin: bool) -> Self {
        Self {
            guard: EligibilityGuard::new(store.clone(), check_origin),
            allocator: AtomicAllocator::new(store.clone()),
            store,
        }
    }

    /// 抽奖
    ///
    /// 流程:
    /// 1. 校验参与者ID / 名称
    /// 2. 资格检查 (已中奖则返回之前的记录)
    /// 3. 读取 remaining > 0 的奖品快照 (按 id 排序)
    /// 4. 按剩余数量加权随机选择
    /// 5. 条件扣减 + 写中奖记录; 扣减失败返回可重试的 `StockExhausted`, 不在服务端循环重试
    /// 6. 返回中奖记录与扣减后的奖品
    pub async fn draw(
        &self,
        request: DrawRequest,
        origin_address: Option<String>,
    ) -> AppResult<DrawOutcome> {
        let draft = validate(request, origin_address)?;

        self.guard
            .check_and_reserve(&draft.requester_id, draft.origin_address.as_deref())
            .await?;

        let snapshot = self.store.available_prizes().await?;
        if snapshot.is_empty() {
            return Err(AppError::NoStockAvailable);
        }

        // ThreadRng 不能跨 await 持有
        let candidate = {
            let mut rng = rand::rng();
            selector::select(&snapshot, &mut rng)?.clone()
        };
        log::debug!(
            "Requester {} selected prize {} (remaining {} in snapshot)",
            draft.requester_id,
            candidate.id,
            candidate.remaining
        );

        let requester_id = draft.requester_id.clone();
        let outcome = self
            .allocator
            .claim(&candidate, draft)
            .await
            .map_err(|e| {
                if let AppError::InternalError(_) | AppError::DatabaseError(_) = &e {
                    log::error!(
                        "Draw failed while allocating prize {} to requester {requester_id}: {e}",
                        candidate.id
                    );
                }
                e
            })?;

        log::info!(
            "Requester {} won prize {} (remaining {}/{})",
            outcome.allocation.requester_id,
            outcome.prize.id,
            outcome.prize.remaining,
            outcome.prize.total
        );
        Ok(outcome)
    }

    /// 查询参与者是否已经抽过奖
    pub async fn check_eligibility(
        &self,
        requester_id: Option<&str>,
        origin_address: Option<&str>,
    ) -> AppResult<EligibilityResponse> {
        let requester_id = requester_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::ValidationError("requester_id is required".into()))?;
        let prior = self.guard.lookup(requester_id, origin_address).await?;
        Ok(prior.into())
    }

    /// 中奖名单 (最新在前)
    pub async fn list_allocations(&self) -> AppResult<Vec<Allocation>> {
        self.store.list_allocations().await
    }

    /// 删除中奖记录, 对应奖品 remaining 加 1
    pub async fn delete_allocation(&self, allocation_id: i64) -> AppResult<Allocation> {
        let removed = self.store.delete_allocation(allocation_id).await?;
        log::info!(
            "Allocation {} of requester {} deleted, prize {} restored",
            removed.id,
            removed.requester_id,
            removed.prize_id
        );
        Ok(removed)
    }

    /// 清空中奖记录并恢复所有奖品库存
    pub async fn reset_all(&self) -> AppResult<()> {
        self.store.reset_all().await?;
        log::info!("Lottery reset: allocations cleared, stock restored");
        Ok(())
    }
}

fn validate(request: DrawRequest, origin_address: Option<String>) -> AppResult<AllocationDraft> {
    let requester_id = required(request.requester_id, "requester_id", MAX_REQUESTER_ID_LEN)?;
    let requester_name = required(request.requester_name, "requester_name", MAX_REQUESTER_NAME_LEN)?;
    Ok(AllocationDraft {
        requester_id,
        requester_name,
        origin_address: origin_address.filter(|o| !o.is_empty()),
    })
}

fn required(value: Option<String>, field: &str, max_len: usize) -> AppResult<String> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(value)
}
