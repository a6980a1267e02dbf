use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub lottery: LotteryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 使用进程内存储 (本地调试 / 测试), 不连接数据库
    #[serde(default)]
    pub use_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// 资格检查时同时比对来源地址 (requester_id 或 origin_address 任一命中即视为已参与)
    #[serde(default)]
    pub check_origin: bool,
    /// 奖品目录为空时导入的 JSON 文件
    #[serde(default)]
    pub seed_file: Option<String>,
    /// 库存对账间隔 (秒), 0 表示关闭
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_reconcile_interval() -> u64 {
    300
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            check_origin: false,
            seed_file: None,
            reconcile_interval_secs: default_reconcile_interval(),
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Config {
                server: ServerConfig {
                    host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                    port: get_env_parse("SERVER_PORT", 3000u16),
                },
                database: DatabaseConfig {
                    url: get_env("DATABASE_URL").unwrap_or_default(),
                    max_connections: get_env_parse("DB_MAX_CONNECTIONS", default_max_connections()),
                    use_memory: false,
                },
                lottery: LotteryConfig::default(),
            },
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "无法读取配置文件 {config_path}: {e}"
                )));
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str).map_err(|e| AppError::ConfigError(format!("解析配置文件失败: {e}")))
    }

    /// 环境变量覆盖（即便文件存在时也覆盖）
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("USE_MEMORY_DB")
            && let Some(flag) = parse_flag(&v)
        {
            self.database.use_memory = flag;
        }
        if let Ok(v) = env::var("LOTTERY_CHECK_ORIGIN")
            && let Some(flag) = parse_flag(&v)
        {
            self.lottery.check_origin = flag;
        }
        if let Ok(v) = env::var("LOTTERY_SEED_FILE") {
            self.lottery.seed_file = Some(v);
        }
        if let Ok(v) = env::var("RECONCILE_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.lottery.reconcile_interval_secs = n;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        // 数据库 URL 在非内存模式下必须提供
        if !self.database.use_memory && self.database.url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "缺少 DATABASE_URL (或设置 USE_MEMORY_DB=true)".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::ConfigError("max_connections 必须大于 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_defaults() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [database]
            url = "postgres://localhost/lottery"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert!(!config.database.use_memory);
        assert!(!config.lottery.check_origin);
        assert_eq!(config.lottery.reconcile_interval_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_mode_needs_no_url() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 3000

            [database]
            use_memory = true

            [lottery]
            check_origin = true
            seed_file = "data/prizes.json"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(config.lottery.check_origin);
        assert_eq!(config.lottery.seed_file.as_deref(), Some("data/prizes.json"));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 3000

            [database]
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
