use crate::models::*;
use crate::services::DrawService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/draws",
    tag = "draws",
    responses(
        (status = 200, description = "中奖名单 (最新在前)", body = [Allocation])
    )
)]
/// 获取所有中奖记录 (管理后台)
pub async fn list_allocations(service: web::Data<DrawService>) -> Result<HttpResponse> {
    match service.list_allocations().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/draws/{id}",
    tag = "draws",
    params(
        ("id" = i64, Path, description = "中奖记录ID")
    ),
    responses(
        (status = 200, description = "已删除, 奖品数量已加回", body = Allocation),
        (status = 404, description = "记录不存在", body = ApiError)
    )
)]
/// 删除一条中奖记录, 并将对应奖品数量加回 1
pub async fn delete_allocation(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.delete_allocation(path.into_inner()).await {
        Ok(removed) => Ok(HttpResponse::Ok().json(ApiResponse::success(removed))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn draws_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/draws")
            .route("", web::get().to(list_allocations))
            .route("/{id}", web::delete().to(delete_allocation)),
    );
}
