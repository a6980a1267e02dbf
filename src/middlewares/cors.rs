use actix_cors::Cors;

pub fn create_cors() -> Cors {
    // 抽奖页面与管理后台可能部署在不同域名下
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
