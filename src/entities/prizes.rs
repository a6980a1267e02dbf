use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 奖品库存实体
/// 说明:
/// - total: 奖品总数 (目录创建时确定)
/// - remaining: 剩余数量, 只会被抽奖的条件扣减与管理端的恢复/重置修改
/// - 约束 0 <= remaining <= total
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// 中文名称
    pub name_zh: String,
    /// 英文名称
    pub name_en: String,
    pub total: i64,
    pub remaining: i64,
    pub image_icon: Option<String>,
    pub image_photo: Option<String>,
    pub photo_link: Option<String>,
}

impl Model {
    /// 是否还有库存
    pub fn is_available(&self) -> bool {
        self.remaining > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
