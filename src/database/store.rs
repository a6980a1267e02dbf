use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use crate::entities::{allocation_entity as allocations, prize_entity as prizes};
use crate::error::{AppError, AppResult};
use crate::models::{Allocation, AllocationDraft, DrawOutcome, NewAllocation, Prize};
use crate::store::{AllocationLog, LotteryStore, PrizeStore};

/// SeaORM 存储实现
///
/// - 库存扣减: `UPDATE prizes SET remaining = remaining - 1 WHERE id = ? AND remaining > 0`
/// - 一人一奖: allocations.requester_id 唯一索引, 冲突即视为已参与
/// - 扣减与写记录在同一事务内完成
pub struct DatabaseStore {
    pool: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn existing_allocation(&self, requester_id: &str) -> AppResult<Allocation> {
        self.find_allocation(requester_id, None).await?.ok_or_else(|| {
            AppError::InternalError(format!(
                "Unique violation for requester {requester_id} but no allocation found"
            ))
        })
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 条件扣减, 成功后在同一连接 / 事务内读取扣减后的记录
async fn decrement_in<C: ConnectionTrait>(
    conn: &C,
    prize_id: &str,
) -> Result<Option<prizes::Model>, DbErr> {
    let result = prizes::Entity::update_many()
        .col_expr(
            prizes::Column::Remaining,
            Expr::col(prizes::Column::Remaining).sub(1),
        )
        .filter(prizes::Column::Id.eq(prize_id))
        .filter(prizes::Column::Remaining.gt(0))
        .exec(conn)
        .await?;

    if result.rows_affected != 1 {
        return Ok(None);
    }
    match prizes::Entity::find_by_id(prize_id.to_owned()).one(conn).await? {
        Some(updated) => Ok(Some(updated)),
        None => Err(DbErr::Custom(format!(
            "Prize {prize_id} disappeared after successful update"
        ))),
    }
}

/// remaining + 1, 不超过 total
async fn restore_in<C: ConnectionTrait>(conn: &C, prize_id: &str) -> Result<bool, DbErr> {
    let result = prizes::Entity::update_many()
        .col_expr(
            prizes::Column::Remaining,
            Expr::col(prizes::Column::Remaining).add(1),
        )
        .filter(prizes::Column::Id.eq(prize_id))
        .filter(Expr::col(prizes::Column::Remaining).lt(Expr::col(prizes::Column::Total)))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

async fn insert_in<C: ConnectionTrait>(
    conn: &C,
    allocation: NewAllocation,
) -> Result<allocations::Model, DbErr> {
    allocations::ActiveModel {
        requester_id: Set(allocation.requester_id),
        requester_name: Set(allocation.requester_name),
        prize_id: Set(allocation.prize_id),
        prize_name_zh: Set(allocation.prize_name.zh),
        prize_name_en: Set(allocation.prize_name.en),
        origin_address: Set(allocation.origin_address),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

#[async_trait]
impl PrizeStore for DatabaseStore {
    async fn list_prizes(&self) -> AppResult<Vec<Prize>> {
        let list = prizes::Entity::find()
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn available_prizes(&self) -> AppResult<Vec<Prize>> {
        let list = prizes::Entity::find()
            .filter(prizes::Column::Remaining.gt(0))
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn insert_prizes(&self, list: Vec<Prize>) -> AppResult<usize> {
        if list.is_empty() {
            return Ok(0);
        }
        let count = list.len();
        let models = list.into_iter().map(|p| prizes::ActiveModel {
            id: Set(p.id),
            name_zh: Set(p.name.zh),
            name_en: Set(p.name.en),
            total: Set(p.total),
            remaining: Set(p.remaining),
            image_icon: Set(p.image_icon),
            image_photo: Set(p.image_photo),
            photo_link: Set(p.photo_link),
        });
        prizes::Entity::insert_many(models)
            .exec(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::ValidationError("Duplicate prize id in catalog import".into())
                } else {
                    e.into()
                }
            })?;
        Ok(count)
    }

    async fn try_decrement(&self, prize_id: &str) -> AppResult<Option<Prize>> {
        let txn = self.pool.begin().await?;
        let updated = decrement_in(&txn, prize_id).await?;
        txn.commit().await?;
        Ok(updated.map(Into::into))
    }

    async fn restore_one(&self, prize_id: &str) -> AppResult<bool> {
        Ok(restore_in(&self.pool, prize_id).await?)
    }
}

#[async_trait]
impl AllocationLog for DatabaseStore {
    async fn find_allocation(
        &self,
        requester_id: &str,
        origin_address: Option<&str>,
    ) -> AppResult<Option<Allocation>> {
        let mut condition = Condition::any().add(allocations::Column::RequesterId.eq(requester_id));
        if let Some(origin) = origin_address {
            condition = condition.add(allocations::Column::OriginAddress.eq(origin));
        }
        let found = allocations::Entity::find()
            .filter(condition)
            .order_by_asc(allocations::Column::CreatedAt)
            .one(&self.pool)
            .await?;
        Ok(found.map(Into::into))
    }

    async fn insert_allocation(&self, allocation: NewAllocation) -> AppResult<Allocation> {
        let requester_id = allocation.requester_id.clone();
        match insert_in(&self.pool, allocation).await {
            Ok(model) => Ok(model.into()),
            Err(e) if is_unique_violation(&e) => Err(AppError::AlreadyParticipated(Box::new(
                self.existing_allocation(&requester_id).await?,
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_allocations(&self) -> AppResult<Vec<Allocation>> {
        let list = allocations::Entity::find()
            .order_by_desc(allocations::Column::CreatedAt)
            .order_by_desc(allocations::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LotteryStore for DatabaseStore {
    /// 扣减与写记录在同一事务内: 写记录失败时扣减随事务回滚
    async fn claim(&self, prize_id: &str, draft: AllocationDraft) -> AppResult<DrawOutcome> {
        let txn = self.pool.begin().await?;

        let Some(updated) = decrement_in(&txn, prize_id).await? else {
            txn.rollback().await?;
            return Err(AppError::StockExhausted(prize_id.to_string()));
        };
        let prize = Prize::from(updated);
        let requester_id = draft.requester_id.clone();

        match insert_in(&txn, draft.for_prize(&prize)).await {
            Ok(model) => {
                if let Err(e) = txn.commit().await {
                    log::error!(
                        "reconciliation: commit failed after claiming prize {prize_id} for requester {requester_id}: {e}"
                    );
                    return Err(AppError::InternalError(format!(
                        "Allocation for requester {requester_id} on prize {prize_id} was not committed"
                    )));
                }
                Ok(DrawOutcome {
                    allocation: model.into(),
                    prize,
                })
            }
            Err(e) if is_unique_violation(&e) => {
                txn.rollback().await?;
                Err(AppError::AlreadyParticipated(Box::new(
                    self.existing_allocation(&requester_id).await?,
                )))
            }
            Err(e) => {
                txn.rollback().await?;
                log::error!(
                    "Failed to record allocation for requester {requester_id} on prize {prize_id}, decrement rolled back: {e}"
                );
                Err(e.into())
            }
        }
    }

    async fn delete_allocation(&self, allocation_id: i64) -> AppResult<Allocation> {
        let txn = self.pool.begin().await?;

        let Some(existing) = allocations::Entity::find_by_id(allocation_id)
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Err(AppError::NotFound(format!(
                "Allocation {allocation_id} not found"
            )));
        };

        // 并发删除同一条记录时只有一方能删到, 另一方不再补偿库存
        let deleted = allocations::Entity::delete_by_id(allocation_id)
            .exec(&txn)
            .await?;
        if deleted.rows_affected != 1 {
            txn.rollback().await?;
            return Err(AppError::NotFound(format!(
                "Allocation {allocation_id} not found"
            )));
        }

        if !restore_in(&txn, &existing.prize_id).await? {
            log::warn!(
                "Allocation {allocation_id} deleted but prize {} could not be restored (missing or already full)",
                existing.prize_id
            );
        }
        txn.commit().await?;
        Ok(existing.into())
    }

    async fn reset_all(&self) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        // 先更新奖品行: 等待进行中的 claim 释放行锁, 其记录提交后再被一并删除
        prizes::Entity::update_many()
            .col_expr(
                prizes::Column::Remaining,
                Expr::col(prizes::Column::Total).into(),
            )
            .exec(&txn)
            .await?;
        allocations::Entity::delete_many().exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn prize_model(remaining: i64) -> prizes::Model {
        prizes::Model {
            id: "A".into(),
            name_zh: "头奖".into(),
            name_en: "Grand".into(),
            total: 3,
            remaining,
            image_icon: None,
            image_photo: None,
            photo_link: None,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn draft() -> AllocationDraft {
        AllocationDraft {
            requester_id: "u1".into(),
            requester_name: "Alice".into(),
            origin_address: None,
        }
    }

    #[tokio::test]
    async fn test_try_decrement_returns_post_update_record() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .append_query_results([vec![prize_model(2)]])
            .into_connection();
        let store = DatabaseStore::new(db);

        let prize = store.try_decrement("A").await.unwrap().unwrap();
        assert_eq!(prize.id, "A");
        assert_eq!(prize.remaining, 2);
    }

    #[tokio::test]
    async fn test_try_decrement_on_empty_stock() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();
        let store = DatabaseStore::new(db);

        assert!(store.try_decrement("A").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_lost_race_is_stock_exhausted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();
        let store = DatabaseStore::new(db);

        let err = store.claim("A", draft()).await.unwrap_err();
        assert!(matches!(err, AppError::StockExhausted(ref id) if id == "A"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_claim_records_prize_name_snapshot() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .append_query_results([vec![prize_model(0)]])
            .append_query_results([vec![allocations::Model {
                id: 7,
                requester_id: "u1".into(),
                requester_name: "Alice".into(),
                prize_id: "A".into(),
                prize_name_zh: "头奖".into(),
                prize_name_en: "Grand".into(),
                origin_address: None,
                created_at: now,
            }]])
            .into_connection();
        let store = DatabaseStore::new(db);

        let outcome = store.claim("A", draft()).await.unwrap();
        assert_eq!(outcome.prize.remaining, 0);
        assert_eq!(outcome.allocation.id, 7);
        assert_eq!(outcome.allocation.prize_name.en, "Grand");
    }

    #[tokio::test]
    async fn test_reset_updates_prizes_before_clearing_allocations() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(2), exec(5)])
            .into_connection();
        let store = DatabaseStore::new(db);

        store.reset_all().await.unwrap();

        let log = format!("{:?}", store.pool.into_transaction_log());
        let update = log.find("UPDATE").expect("prizes update missing");
        let delete = log.find("DELETE").expect("allocations delete missing");
        assert!(update < delete, "{log}");
    }
}
