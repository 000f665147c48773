use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use lanewar_server::{config::settings, game::session::RoomRegistry, metrics, ws};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let cfg = settings();
    let policy = cfg.room_policy();
    log::info!(
        "tick every {:?}, max step {:?}, join ended rooms: {}",
        policy.tick_interval,
        policy.max_tick,
        policy.join_ended
    );

    // Shared room registry, handed to every worker
    let registry = web::Data::from(RoomRegistry::new(policy));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(registry.clone())
            .configure(metrics::init_routes)
            .configure(ws::routes::init_routes)
    })
    .bind(&cfg.server_addr)
    .with_context(|| format!("binding {}", cfg.server_addr))?;

    log::info!("listening on {}", cfg.server_addr);
    server.run().await.context("http server")?;
    Ok(())
}
