//! 进程内存储, 对应配置 `USE_MEMORY_DB=true`。
//!
//! 每个奖品的 remaining 是独立的 `AtomicI64`, 扣减通过 CAS 完成;
//! 目录锁只在查找计数单元时短暂持有。`claim` 在记录锁内完成扣减与写记录,
//! 与删除 / 重置互斥。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::{AllocationLog, LotteryStore, PrizeStore};
use crate::error::{AppError, AppResult};
use crate::models::{Allocation, AllocationDraft, DrawOutcome, NewAllocation, Prize};

struct PrizeCell {
    /// 目录信息; 其中的 remaining 字段不使用, 以 `remaining` 原子计数为准
    record: Prize,
    remaining: AtomicI64,
}

impl PrizeCell {
    fn new(prize: Prize) -> Self {
        let remaining = AtomicI64::new(prize.remaining);
        Self {
            record: prize,
            remaining,
        }
    }

    fn snapshot_with(&self, remaining: i64) -> Prize {
        Prize {
            remaining,
            ..self.record.clone()
        }
    }

    fn snapshot(&self) -> Prize {
        self.snapshot_with(self.remaining.load(Ordering::Acquire))
    }

    fn decrement(&self) -> Option<i64> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| {
                (r > 0).then_some(r - 1)
            })
            .ok()
            .map(|prev| prev - 1)
    }

    fn increment(&self) -> bool {
        let total = self.record.total;
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| {
                (r < total).then_some(r + 1)
            })
            .is_ok()
    }
}

#[derive(Default)]
struct AllocationTable {
    rows: BTreeMap<i64, Allocation>,
    /// requester_id -> allocation id (唯一索引)
    by_requester: HashMap<String, i64>,
}

#[derive(Default)]
pub struct MemoryStore {
    prizes: RwLock<BTreeMap<String, Arc<PrizeCell>>>,
    allocations: Mutex<AllocationTable>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prizes(prizes: Vec<Prize>) -> Self {
        let map = prizes
            .into_iter()
            .map(|p| (p.id.clone(), Arc::new(PrizeCell::new(p))))
            .collect();
        Self {
            prizes: RwLock::new(map),
            ..Self::default()
        }
    }

    async fn cell(&self, prize_id: &str) -> Option<Arc<PrizeCell>> {
        self.prizes.read().await.get(prize_id).cloned()
    }

    /// 调用方需持有记录锁
    fn insert_locked(
        &self,
        table: &mut AllocationTable,
        allocation: NewAllocation,
    ) -> AppResult<Allocation> {
        if let Some(existing) = table
            .by_requester
            .get(&allocation.requester_id)
            .and_then(|id| table.rows.get(id))
        {
            return Err(AppError::AlreadyParticipated(Box::new(existing.clone())));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = Allocation {
            id,
            requester_id: allocation.requester_id,
            requester_name: allocation.requester_name,
            prize_id: allocation.prize_id,
            prize_name: allocation.prize_name,
            origin_address: allocation.origin_address,
            created_at: Utc::now(),
        };
        table.by_requester.insert(record.requester_id.clone(), id);
        table.rows.insert(id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl PrizeStore for MemoryStore {
    async fn list_prizes(&self) -> AppResult<Vec<Prize>> {
        let prizes = self.prizes.read().await;
        Ok(prizes.values().map(|c| c.snapshot()).collect())
    }

    async fn available_prizes(&self) -> AppResult<Vec<Prize>> {
        let prizes = self.prizes.read().await;
        Ok(prizes
            .values()
            .map(|c| c.snapshot())
            .filter(Prize::is_available)
            .collect())
    }

    async fn insert_prizes(&self, prizes: Vec<Prize>) -> AppResult<usize> {
        let mut map = self.prizes.write().await;
        if let Some(dup) = prizes.iter().find(|p| map.contains_key(&p.id)) {
            return Err(AppError::ValidationError(format!(
                "Prize {} already exists",
                dup.id
            )));
        }
        let count = prizes.len();
        for prize in prizes {
            map.insert(prize.id.clone(), Arc::new(PrizeCell::new(prize)));
        }
        Ok(count)
    }

    async fn try_decrement(&self, prize_id: &str) -> AppResult<Option<Prize>> {
        let Some(cell) = self.cell(prize_id).await else {
            return Ok(None);
        };
        Ok(cell.decrement().map(|remaining| cell.snapshot_with(remaining)))
    }

    async fn restore_one(&self, prize_id: &str) -> AppResult<bool> {
        Ok(self
            .cell(prize_id)
            .await
            .is_some_and(|cell| cell.increment()))
    }
}

#[async_trait]
impl AllocationLog for MemoryStore {
    async fn find_allocation(
        &self,
        requester_id: &str,
        origin_address: Option<&str>,
    ) -> AppResult<Option<Allocation>> {
        let table = self.allocations.lock().await;
        if let Some(id) = table.by_requester.get(requester_id) {
            return Ok(table.rows.get(id).cloned());
        }
        let Some(origin) = origin_address else {
            return Ok(None);
        };
        Ok(table
            .rows
            .values()
            .find(|a| a.origin_address.as_deref() == Some(origin))
            .cloned())
    }

    async fn insert_allocation(&self, allocation: NewAllocation) -> AppResult<Allocation> {
        let mut table = self.allocations.lock().await;
        self.insert_locked(&mut table, allocation)
    }

    async fn list_allocations(&self) -> AppResult<Vec<Allocation>> {
        let table = self.allocations.lock().await;
        let mut list: Vec<Allocation> = table.rows.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }
}

#[async_trait]
impl LotteryStore for MemoryStore {
    /// 扣减与写记录都在记录锁内完成, 重置 / 删除不会落在两步之间。
    /// 扣减本身仍是奖品计数单元上的 CAS。
    async fn claim(&self, prize_id: &str, draft: AllocationDraft) -> AppResult<DrawOutcome> {
        let mut table = self.allocations.lock().await;
        if let Some(existing) = table
            .by_requester
            .get(&draft.requester_id)
            .and_then(|id| table.rows.get(id))
        {
            return Err(AppError::AlreadyParticipated(Box::new(existing.clone())));
        }

        let prize = self
            .try_decrement(prize_id)
            .await?
            .ok_or_else(|| AppError::StockExhausted(prize_id.to_string()))?;
        let allocation = self.insert_locked(&mut table, draft.for_prize(&prize))?;
        Ok(DrawOutcome { allocation, prize })
    }

    async fn delete_allocation(&self, allocation_id: i64) -> AppResult<Allocation> {
        // 持有记录锁完成删除与补偿, 避免与重置交错
        let mut table = self.allocations.lock().await;
        let removed = table
            .rows
            .remove(&allocation_id)
            .ok_or_else(|| AppError::NotFound(format!("Allocation {allocation_id} not found")))?;
        table.by_requester.remove(&removed.requester_id);

        if !self.restore_one(&removed.prize_id).await? {
            log::warn!(
                "Allocation {} deleted but prize {} could not be restored (missing or already full)",
                removed.id,
                removed.prize_id
            );
        }
        Ok(removed)
    }

    async fn reset_all(&self) -> AppResult<()> {
        let mut table = self.allocations.lock().await;
        table.rows.clear();
        table.by_requester.clear();

        let prizes = self.prizes.read().await;
        for cell in prizes.values() {
            cell.remaining.store(cell.record.total, Ordering::Release);
        }
        Ok(())
    }
}
