//! 奖品库存与中奖记录的存储抽象。
//!
//! - [`PrizeStore`]: 奖品目录 + 每个奖品独立的原子库存计数
//! - [`AllocationLog`]: 中奖记录, 存储层保证 requester_id 唯一
//! - [`LotteryStore`]: 组合两者, 提供"扣减 + 记录"的工作单元以及管理端的删除 / 重置
//!
//! 两种实现: [`memory::MemoryStore`] (进程内) 与 `database::DatabaseStore` (SeaORM)。

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::{Allocation, AllocationDraft, DrawOutcome, NewAllocation, Prize};

#[async_trait]
pub trait PrizeStore: Send + Sync {
    /// 全部奖品, 按 id 升序
    async fn list_prizes(&self) -> AppResult<Vec<Prize>>;

    /// remaining > 0 的奖品快照, 按 id 升序 (保证相同随机种子下结果可复现)
    async fn available_prizes(&self) -> AppResult<Vec<Prize>>;

    /// 写入奖品目录 (仅用于初始导入), id 重复时报错
    async fn insert_prizes(&self, prizes: Vec<Prize>) -> AppResult<usize>;

    /// 条件扣减: 仅当 remaining > 0 时减 1, 单个原子操作。
    /// 返回扣减后的记录; 库存已为 0 (或奖品不存在) 时返回 None。
    async fn try_decrement(&self, prize_id: &str) -> AppResult<Option<Prize>>;

    /// 补偿: remaining 加 1 (不超过 total)。返回是否实际加回。
    async fn restore_one(&self, prize_id: &str) -> AppResult<bool>;
}

#[async_trait]
pub trait AllocationLog: Send + Sync {
    /// 查找参与者已有的中奖记录; 传入 origin 时 requester_id 或 origin_address 任一命中即返回
    async fn find_allocation(
        &self,
        requester_id: &str,
        origin_address: Option<&str>,
    ) -> AppResult<Option<Allocation>>;

    /// 写入中奖记录。requester_id 已存在时返回 `AlreadyParticipated` (携带已有记录)。
    async fn insert_allocation(&self, allocation: NewAllocation) -> AppResult<Allocation>;

    /// 全部中奖记录, 按 created_at 倒序
    async fn list_allocations(&self) -> AppResult<Vec<Allocation>>;
}

#[async_trait]
pub trait LotteryStore: PrizeStore + AllocationLog {
    /// 扣减库存并写入中奖记录。
    ///
    /// 默认实现不具备事务: 先条件扣减, 再写记录。
    /// - 扣减失败 -> `StockExhausted`
    /// - 记录因 requester 重复失败 -> 加回库存, 返回 `AlreadyParticipated`
    /// - 记录因其它原因失败 -> 库存已扣但无记录, 记录对账事件并返回 `InternalError`
    ///
    /// 支持事务的存储应覆盖此方法, 使两步成为一个原子单元。
    async fn claim(&self, prize_id: &str, draft: AllocationDraft) -> AppResult<DrawOutcome> {
        let requester_id = draft.requester_id.clone();
        let prize = self
            .try_decrement(prize_id)
            .await?
            .ok_or_else(|| AppError::StockExhausted(prize_id.to_string()))?;

        match self.insert_allocation(draft.for_prize(&prize)).await {
            Ok(allocation) => Ok(DrawOutcome { allocation, prize }),
            Err(AppError::AlreadyParticipated(prior)) => {
                if let Err(e) = self.restore_one(prize_id).await {
                    log::error!(
                        "reconciliation: prize {prize_id} decremented for duplicate requester {requester_id} and restore failed: {e}"
                    );
                }
                Err(AppError::AlreadyParticipated(prior))
            }
            Err(e) => {
                log::error!(
                    "reconciliation: prize {prize_id} decremented but allocation for requester {requester_id} was not recorded: {e}"
                );
                Err(AppError::InternalError(format!(
                    "Allocation for requester {requester_id} on prize {prize_id} was not recorded"
                )))
            }
        }
    }

    /// 删除一条中奖记录并将对应奖品 remaining 加 1
    async fn delete_allocation(&self, allocation_id: i64) -> AppResult<Allocation>;

    /// 清空中奖记录, 所有奖品 remaining = total
    async fn reset_all(&self) -> AppResult<()>;
}
