//! Prometheus metrics & middleware helper.

use actix_web::{get, web, HttpResponse, Responder};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// HTTP request metrics, exposed at `/metrics`.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics") // exposed URL
        .build()
        .expect("metrics builder")
});

pub static ROOMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("lanewar_rooms_active", "Rooms with at least one player").expect("metric")
});

pub static CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("lanewar_connections_active", "Open player websockets").expect("metric")
});

pub static TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("lanewar_ticks_total", "Room ticks simulated").expect("metric")
});

pub static MATCHES_FINISHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("lanewar_matches_finished_total", "Matches that reached a result")
        .expect("metric")
});

pub static SPAWNS_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("lanewar_spawns_rejected_total", "Spawn intents that failed validation")
        .expect("metric")
});

/// Game-level registry, kept apart from the HTTP middleware's own.
pub static GAME_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    registry.register(Box::new(ROOMS_ACTIVE.clone())).expect("register");
    registry.register(Box::new(CONNECTIONS_ACTIVE.clone())).expect("register");
    registry.register(Box::new(TICKS_TOTAL.clone())).expect("register");
    registry.register(Box::new(MATCHES_FINISHED_TOTAL.clone())).expect("register");
    registry.register(Box::new(SPAWNS_REJECTED_TOTAL.clone())).expect("register");
    registry
});

/// Text exposition of the game registry.
pub fn gather_game_metrics() -> String {
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&GAME_REGISTRY.gather(), &mut buf) {
        log::warn!("game metrics encode failed: {e:?}");
    }
    String::from_utf8(buf).unwrap_or_default()
}

#[get("/game-metrics")]
pub async fn game_metrics() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(gather_game_metrics())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(game_metrics);
}
