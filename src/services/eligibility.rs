use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::Allocation;
use crate::store::LotteryStore;

/// 一人一奖的资格检查
///
/// 这里的检查只用于快速拒绝常见的重复请求; 并发下真正的保证来自存储层
/// requester_id 的唯一约束 (写入冲突同样返回 `AlreadyParticipated`)。
#[derive(Clone)]
pub struct EligibilityGuard {
    store: Arc<dyn LotteryStore>,
    /// 同时按来源地址去重
    check_origin: bool,
}

impl EligibilityGuard {
    pub fn new(store: Arc<dyn LotteryStore>, check_origin: bool) -> Self {
        Self {
            store,
            check_origin,
        }
    }

    /// 查询已有中奖记录
    pub async fn lookup(
        &self,
        requester_id: &str,
        origin_address: Option<&str>,
    ) -> AppResult<Option<Allocation>> {
        let origin = if self.check_origin {
            origin_address
        } else {
            None
        };
        self.store.find_allocation(requester_id, origin).await
    }

    /// 已参与过则返回 `AlreadyParticipated` (携带之前的中奖记录)
    pub async fn check_and_reserve(
        &self,
        requester_id: &str,
        origin_address: Option<&str>,
    ) -> AppResult<()> {
        match self.lookup(requester_id, origin_address).await? {
            Some(prior) => Err(AppError::AlreadyParticipated(Box::new(prior))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllocationDraft, LocalizedName, Prize};
    use crate::store::MemoryStore;

    async fn store_with_winner() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::with_prizes(vec![Prize::new(
            "A",
            LocalizedName {
                zh: "甲".into(),
                en: "A".into(),
            },
            5,
        )]));
        store
            .claim(
                "A",
                AllocationDraft {
                    requester_id: "u1".into(),
                    requester_name: "Alice".into(),
                    origin_address: Some("10.1.1.1".into()),
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_rejects_prior_winner() {
        let guard = EligibilityGuard::new(store_with_winner().await, false);
        assert!(guard.check_and_reserve("u2", None).await.is_ok());
        match guard.check_and_reserve("u1", None).await {
            Err(AppError::AlreadyParticipated(prior)) => assert_eq!(prior.prize_id, "A"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_origin_only_checked_when_enabled() {
        let store = store_with_winner().await;

        let relaxed = EligibilityGuard::new(store.clone(), false);
        assert!(relaxed.check_and_reserve("u2", Some("10.1.1.1")).await.is_ok());

        let strict = EligibilityGuard::new(store, true);
        assert!(matches!(
            strict.check_and_reserve("u2", Some("10.1.1.1")).await,
            Err(AppError::AlreadyParticipated(_))
        ));
        assert!(strict.check_and_reserve("u2", Some("10.9.9.9")).await.is_ok());
    }
}
