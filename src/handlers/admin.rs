use crate::models::*;
use crate::services::{DrawService, ReconcileService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/reset",
    tag = "admin",
    responses(
        (status = 200, description = "已清空中奖记录并恢复所有奖品数量"),
        (status = 500, description = "重置失败", body = ApiError)
    )
)]
/// 重置抽奖: 清空中奖记录, 所有奖品 remaining = total
pub async fn reset(service: web::Data<DrawService>) -> Result<HttpResponse> {
    match service.reset_all().await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Lottery data reset"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/reconcile",
    tag = "admin",
    responses(
        (status = 200, description = "库存对账结果", body = ReconcileReport)
    )
)]
/// 库存与中奖记录对账
pub async fn reconcile(service: web::Data<ReconcileService>) -> Result<HttpResponse> {
    match service.report().await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/reset", web::post().to(reset))
        .route("/reconcile", web::get().to(reconcile));
}
