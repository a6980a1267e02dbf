use crate::models::*;
use crate::services::CatalogService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/prizes",
    tag = "prizes",
    responses(
        (status = 200, description = "奖品列表 (按ID排序)", body = [Prize])
    )
)]
/// 获取所有奖品及剩余数量
pub async fn list_prizes(service: web::Data<CatalogService>) -> Result<HttpResponse> {
    match service.list_prizes().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn prizes_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/prizes").route("", web::get().to(list_prizes)));
}
