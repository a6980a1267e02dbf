pub mod admin;
pub mod draw;
pub mod draws;
pub mod prizes;

pub use admin::admin_config;
pub use draw::draw_config;
pub use draws::draws_config;
pub use prizes::prizes_config;

use actix_web::web;

use crate::error::AppError;

/// 请求体 / 查询参数 / 路径参数解析失败时同样返回统一的错误结构
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    );
}

#[cfg(test)]
mod tests;
