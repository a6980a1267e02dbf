use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{Allocation, Prize, ReconcileReport, StockDiscrepancy};
use crate::store::LotteryStore;

/// 库存对账: 每个奖品 total - remaining 应等于其中奖记录数。
/// 不一致通常来自"库存已扣但记录未写入"或人工改库, 需人工处理。
#[derive(Clone)]
pub struct ReconcileService {
    store: Arc<dyn LotteryStore>,
}

impl ReconcileService {
    pub fn new(store: Arc<dyn LotteryStore>) -> Self {
        Self { store }
    }

    pub async fn report(&self) -> AppResult<ReconcileReport> {
        let prizes = self.store.list_prizes().await?;
        let allocations = self.store.list_allocations().await?;
        Ok(build_report(&prizes, &allocations))
    }
}

pub fn build_report(prizes: &[Prize], allocations: &[Allocation]) -> ReconcileReport {
    let mut recorded: BTreeMap<&str, i64> = BTreeMap::new();
    for a in allocations {
        *recorded.entry(a.prize_id.as_str()).or_default() += 1;
    }

    let mut discrepancies = Vec::new();
    for prize in prizes {
        let count = recorded.remove(prize.id.as_str()).unwrap_or(0);
        if count != prize.allocated() {
            discrepancies.push(StockDiscrepancy {
                prize_id: prize.id.clone(),
                unknown_prize: false,
                expected_allocated: prize.allocated(),
                recorded: count,
            });
        }
    }
    // 剩下的是引用了目录中不存在奖品的记录
    for (prize_id, count) in recorded {
        discrepancies.push(StockDiscrepancy {
            prize_id: prize_id.to_string(),
            unknown_prize: true,
            expected_allocated: 0,
            recorded: count,
        });
    }

    ReconcileReport {
        prizes_checked: prizes.len(),
        allocations_checked: allocations.len(),
        discrepancies,
    }
}
