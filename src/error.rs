use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::models::Allocation;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 已参与过抽奖, 附带之前的中奖记录
    #[error("Requester {} already participated", .0.requester_id)]
    AlreadyParticipated(Box<Allocation>),

    /// 所有奖品均已抽完
    #[error("No stock available")]
    NoStockAvailable,

    /// 并发扣减失败 (奖品在快照后被抽完), 可重试一次
    #[error("Stock exhausted for prize {0}")]
    StockExhausted(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 是否为瞬时失败（客户端可整体重试一次）
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StockExhausted(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AlreadyParticipated(_) => "ALREADY_PARTICIPATED",
            AppError::NoStockAvailable => "NO_STOCK_AVAILABLE",
            AppError::StockExhausted(_) => "STOCK_EXHAUSTED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyParticipated(_) => StatusCode::CONFLICT,
            AppError::NoStockAvailable | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StockExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::AlreadyParticipated(prior) => {
                log::warn!(
                    "Requester {} already won prize {}",
                    prior.requester_id,
                    prior.prize_id
                );
                "Requester has already participated".to_string()
            }
            AppError::NoStockAvailable => {
                log::warn!("Draw rejected: all prizes are gone");
                "All prizes have been drawn".to_string()
            }
            AppError::StockExhausted(prize_id) => {
                log::warn!("Lost race on prize {prize_id}, client may retry");
                "The selected prize was just taken, please try again".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        let mut body = json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message,
                "retryable": self.is_retryable(),
            }
        });
        if let AppError::AlreadyParticipated(prior) = self {
            body["prize"] = json!(prior);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
