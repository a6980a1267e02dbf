use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::prize_entity;
use crate::error::{AppError, AppResult};

/// 多语言名称（至少中文 / 英文）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocalizedName {
    pub zh: String,
    pub en: String,
}

/// 奖品（库存记录）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Prize {
    /// 奖品ID (唯一且稳定)
    pub id: String,
    pub name: LocalizedName,
    /// 总数量
    pub total: i64,
    /// 剩余数量 (抽奖权重)
    pub remaining: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_link: Option<String>,
}

impl Prize {
    pub fn new(id: impl Into<String>, name: LocalizedName, total: i64) -> Self {
        Self {
            id: id.into(),
            name,
            total,
            remaining: total,
            image_icon: None,
            image_photo: None,
            photo_link: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.remaining > 0
    }

    /// 已发出的数量
    pub fn allocated(&self) -> i64 {
        self.total - self.remaining
    }
}

impl From<prize_entity::Model> for Prize {
    fn from(m: prize_entity::Model) -> Self {
        Prize {
            id: m.id,
            name: LocalizedName {
                zh: m.name_zh,
                en: m.name_en,
            },
            total: m.total,
            remaining: m.remaining,
            image_icon: m.image_icon,
            image_photo: m.image_photo,
            photo_link: m.photo_link,
        }
    }
}

/// 奖品导入数据（JSON 文件中的一项）
/// remaining 缺省时等于 total
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PrizeSeed {
    pub id: String,
    pub name: LocalizedName,
    pub total: i64,
    #[serde(default)]
    pub remaining: Option<i64>,
    #[serde(default)]
    pub image_icon: Option<String>,
    #[serde(default)]
    pub image_photo: Option<String>,
    #[serde(default)]
    pub photo_link: Option<String>,
}

impl TryFrom<PrizeSeed> for Prize {
    type Error = AppError;

    fn try_from(seed: PrizeSeed) -> AppResult<Self> {
        let id = seed.id.trim().to_string();
        if id.is_empty() {
            return Err(AppError::ValidationError("Prize id is required".into()));
        }
        if seed.total < 0 {
            return Err(AppError::ValidationError(format!(
                "Prize {id}: total must not be negative"
            )));
        }
        let remaining = seed.remaining.unwrap_or(seed.total);
        if !(0..=seed.total).contains(&remaining) {
            return Err(AppError::ValidationError(format!(
                "Prize {id}: remaining must be within 0..={}",
                seed.total
            )));
        }
        Ok(Prize {
            id,
            name: seed.name,
            total: seed.total,
            remaining,
            image_icon: seed.image_icon,
            image_photo: seed.image_photo,
            photo_link: seed.photo_link,
        })
    }
}
