use crate::models::*;
use crate::services::DrawService;
use crate::utils::client_ip;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/draw",
    tag = "draw",
    request_body = DrawRequest,
    responses(
        (status = 201, description = "抽奖成功", body = DrawOutcome),
        (status = 400, description = "缺少参与者ID或名称", body = ApiError),
        (status = 404, description = "奖品已全部抽完", body = ApiError),
        (status = 409, description = "已参加过抽奖 (附带之前的中奖记录)", body = ApiError),
        (status = 503, description = "奖品刚被抽走, 可重试一次", body = ApiError)
    )
)]
/// 进行一次抽奖:
/// 1. 检查是否已参加过
/// 2. 按剩余数量加权选择奖品
/// 3. 条件扣减库存并写入中奖记录
pub async fn draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    let origin = client_ip(&req);
    match service.draw(body.into_inner(), origin).await {
        Ok(outcome) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            outcome,
            "Congratulations!".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draw/check",
    tag = "draw",
    params(
        ("requester_id" = String, Query, description = "参与者ID")
    ),
    responses(
        (status = 200, description = "查询成功", body = EligibilityResponse),
        (status = 400, description = "缺少参与者ID", body = ApiError)
    )
)]
/// 查询参与者是否已经抽过奖
pub async fn check(
    service: web::Data<DrawService>,
    req: HttpRequest,
    query: web::Query<EligibilityQuery>,
) -> Result<HttpResponse> {
    let origin = client_ip(&req);
    match service
        .check_eligibility(query.requester_id.as_deref(), origin.as_deref())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(resp)),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/draw")
            .route("", web::post().to(draw))
            .route("/check", web::get().to(check)),
    );
}
