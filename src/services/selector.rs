//! 加权随机选择: 以奖品剩余数量作为权重。
//!
//! 纯函数, 不做任何 I/O; 传入固定种子的随机源即可复现结果。

use rand::Rng;

use crate::error::{AppError, AppResult};
use crate::models::Prize;

/// 从快照中按剩余数量加权随机选出一个奖品
///
/// 1. 累加 remaining 得到总权重 W
/// 2. 在 [0, W) 内均匀取 r
/// 3. 返回第一个累计权重 > r 的奖品
///
/// 快照为空或总权重为 0 时返回 `NoStockAvailable`。
pub fn select<'a, R: Rng + ?Sized>(candidates: &'a [Prize], rng: &mut R) -> AppResult<&'a Prize> {
    let total_weight: u64 = candidates.iter().map(weight).sum();
    if total_weight == 0 {
        return Err(AppError::NoStockAvailable);
    }

    let pick = rng.random_range(0..total_weight);
    let mut acc = 0u64;
    for prize in candidates {
        acc += weight(prize);
        if acc > pick {
            return Ok(prize);
        }
    }

    // acc 最终等于 total_weight > pick, 不会走到这里
    Err(AppError::InternalError(
        "Weighted selection walked past the total weight".into(),
    ))
}

fn weight(prize: &Prize) -> u64 {
    u64::try_from(prize.remaining).unwrap_or(0)
}
