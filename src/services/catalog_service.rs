use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Prize, PrizeSeed};
use crate::store::LotteryStore;

/// 奖品目录 (只读展示 + 启动时导入)
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LotteryStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LotteryStore>) -> Self {
        Self { store }
    }

    /// 全部奖品, 按 id 排序
    pub async fn list_prizes(&self) -> AppResult<Vec<Prize>> {
        self.store.list_prizes().await
    }

    /// 目录为空时从 JSON 文件导入奖品, 返回导入数量 (目录非空时为 0)
    pub async fn seed_if_empty(&self, path: impl AsRef<Path>) -> AppResult<usize> {
        if !self.store.list_prizes().await?.is_empty() {
            log::info!("Prize catalog already populated, skip seeding");
            return Ok(0);
        }
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let prizes = parse_seed(&content)?;
        let count = self.store.insert_prizes(prizes).await?;
        log::info!(
            "Seeded {count} prizes from {}",
            path.as_ref().display()
        );
        Ok(count)
    }
}

/// 解析奖品 JSON 数组并校验 (id 非空且不重复, 0 <= remaining <= total)
pub fn parse_seed(content: &str) -> AppResult<Vec<Prize>> {
    let seeds: Vec<PrizeSeed> = serde_json::from_str(content)?;
    let mut seen = HashSet::new();
    let mut prizes = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let prize = Prize::try_from(seed)?;
        if !seen.insert(prize.id.clone()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate prize id {}",
                prize.id
            )));
        }
        prizes.push(prize);
    }
    Ok(prizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SEED: &str = r#"[
        {"id": "B", "name": {"zh": "二奖", "en": "Second"}, "total": 3, "image_icon": "b.png"},
        {"id": "A", "name": {"zh": "头奖", "en": "Grand"}, "total": 1, "remaining": 0}
    ]"#;

    #[test]
    fn test_parse_seed() {
        let prizes = parse_seed(SEED).unwrap();
        assert_eq!(prizes.len(), 2);
        assert_eq!(prizes[0].remaining, 3);
        assert_eq!(prizes[0].image_icon.as_deref(), Some("b.png"));
        assert_eq!(prizes[1].remaining, 0);
    }

    #[test]
    fn test_parse_seed_rejects_duplicates() {
        let dup = r#"[
            {"id": "A", "name": {"zh": "甲", "en": "A"}, "total": 1},
            {"id": "A", "name": {"zh": "乙", "en": "B"}, "total": 2}
        ]"#;
        assert!(matches!(parse_seed(dup), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_seed("{}"), Err(AppError::SerdeJsonError(_))));
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let path = std::env::temp_dir().join(format!("prize-seed-{}.json", std::process::id()));
        tokio::fs::write(&path, SEED).await.unwrap();

        let svc = CatalogService::new(Arc::new(MemoryStore::new()));
        assert_eq!(svc.seed_if_empty(&path).await.unwrap(), 2);
        assert_eq!(svc.seed_if_empty(&path).await.unwrap(), 0);

        let ids: Vec<String> = svc
            .list_prizes()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["A", "B"]);

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
