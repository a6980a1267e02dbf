use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 中奖记录实体
/// 说明:
/// - requester_id 唯一, 数据库层保证一人最多一条记录
/// - prize_name_zh / prize_name_en 冗余存储中奖时的奖品名称 (奖品目录后续修改不影响历史展示)
/// - origin_address 请求来源地址, 仅作参考或开启来源检查时的辅助去重
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "allocations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub requester_id: String,
    pub requester_name: String,
    /// 奖品ID (指向 prizes.id)
    pub prize_id: String,
    pub prize_name_zh: String,
    pub prize_name_en: String,
    pub origin_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
