use sea_orm_migration::prelude::*;

/// Prizes (奖品库存表)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    NameZh,
    NameEn,
    Total,
    Remaining,
    ImageIcon,
    ImagePhoto,
    PhotoLink,
}

/// Allocations (中奖记录)
#[derive(DeriveIden)]
enum Allocations {
    Table,
    Id,
    RequesterId,
    RequesterName,
    PrizeId,
    PrizeNameZh,
    PrizeNameEn,
    OriginAddress,
    CreatedAt,
}

fn prizes_table() -> TableCreateStatement {
    Table::create()
        .table(Prizes::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Prizes::Id)
                .string_len(64)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(Prizes::NameZh).string_len(255).not_null())
        .col(ColumnDef::new(Prizes::NameEn).string_len(255).not_null())
        .col(
            ColumnDef::new(Prizes::Total)
                .big_integer()
                .not_null()
                .check(Expr::col(Prizes::Total).gte(0)),
        )
        .col(
            ColumnDef::new(Prizes::Remaining)
                .big_integer()
                .not_null()
                .check(Expr::col(Prizes::Remaining).gte(0)),
        )
        .col(ColumnDef::new(Prizes::ImageIcon).string().null())
        .col(ColumnDef::new(Prizes::ImagePhoto).string().null())
        .col(ColumnDef::new(Prizes::PhotoLink).string().null())
        .check(Expr::col(Prizes::Remaining).lte(Expr::col(Prizes::Total)))
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 库存约束: 0 <= remaining <= total
/// 每个 requester_id 只允许一条中奖记录 (唯一索引, 抽奖并发下的最终防线)
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(prizes_table()).await?;

        manager
            .create_table(
                Table::create()
                    .table(Allocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Allocations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Allocations::RequesterId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Allocations::RequesterName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Allocations::PrizeId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Allocations::PrizeNameZh)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Allocations::PrizeNameEn)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Allocations::OriginAddress).string_len(64).null())
                    .col(
                        ColumnDef::new(Allocations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // requester_id 唯一（一人一奖）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_allocations_requester_unique")
                    .table(Allocations::Table)
                    .col(Allocations::RequesterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 中奖名单按时间倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_allocations_created_at")
                    .table(Allocations::Table)
                    .col(Allocations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 开启来源地址检查时按 origin_address 查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_allocations_origin_address")
                    .table(Allocations::Table)
                    .col(Allocations::OriginAddress)
                    .to_owned(),
            )
            .await?;

        // 不加外键: 记录里已冗余奖品名称, 奖品目录变更不影响历史记录
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Allocations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prizes_table_bounds_remaining_by_total() {
        let sql = prizes_table().to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""remaining" >= 0"#), "{sql}");
        assert!(sql.contains(r#""remaining" <= "total""#), "{sql}");
    }
}
