use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use prize_lottery_backend::{
    config::Config,
    database::{DatabaseStore, create_pool, run_migrations},
    handlers,
    middlewares::create_cors,
    services::*,
    store::{LotteryStore, MemoryStore},
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 存储: 内存模式或数据库
    let store: Arc<dyn LotteryStore> = if config.database.use_memory {
        log::warn!("USE_MEMORY_DB enabled, lottery data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(&config.database)
            .await
            .expect("Failed to create database connection pool");

        run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");

        Arc::new(DatabaseStore::new(pool))
    };

    // 创建服务
    let draw_service = DrawService::new(store.clone(), config.lottery.check_origin);
    let catalog_service = CatalogService::new(store.clone());
    let reconcile_service = ReconcileService::new(store.clone());

    // 奖品目录为空时导入
    if let Some(seed_file) = &config.lottery.seed_file {
        catalog_service
            .seed_if_empty(seed_file)
            .await
            .expect("Failed to seed prize catalog");
    }

    tasks::spawn_all(
        reconcile_service.clone(),
        config.lottery.reconcile_interval_secs,
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(reconcile_service.clone()))
            .configure(handlers::extractor_config)
            .configure(swagger_config)
            .service(
                web::scope("/api")
                    .configure(handlers::draw_config)
                    .configure(handlers::draws_config)
                    .configure(handlers::prizes_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
