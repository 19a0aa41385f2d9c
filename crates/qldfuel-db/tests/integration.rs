//! Tests for qldfuel-db. The offline tests need no database; the live test
//! runs only when `DATABASE_URL` points at a scratch Postgres.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::{TimeDelta, Utc};
use qldfuel_core::{AppConfig, Environment, IntegrationSettings};
use qldfuel_db::{connect_pool_from_config, DbError, PgHistoryStore, PoolConfig};
use qldfuel_engine::HistoryStore;

fn app_config(database_url: Option<&str>) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        subscriber_token: "token".to_string(),
        home: None,
        settings: IntegrationSettings::default(),
        api_base_url: "http://127.0.0.1:9999".to_string(),
        request_timeout_secs: 30,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        database_url: database_url.map(str::to_string),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config(None));

    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn connect_without_database_url_is_rejected() {
    let err = connect_pool_from_config(&app_config(None)).await.unwrap_err();
    assert!(matches!(err, DbError::MissingDatabaseUrl));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a scratch Postgres"]
async fn pg_history_store_reads_window_in_order() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut config = app_config(Some(&url));
    config.db_max_connections = 2;
    config.db_min_connections = 1;
    let pool = connect_pool_from_config(&config).await.unwrap();
    qldfuel_db::health_check(&pool).await.unwrap();

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sensor_history ( \
             entity_id TEXT NOT NULL, \
             state TEXT, \
             changed_at TIMESTAMPTZ NOT NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let entity_id = format!("12_test_{}", uuid::Uuid::new_v4());
    let now = Utc::now();
    for (state, days_ago) in [(Some("150.0"), 1), (Some("140.0"), 10), (None, 3), (Some("99.0"), 30)] {
        sqlx::query("INSERT INTO sensor_history (entity_id, state, changed_at) VALUES ($1, $2, $3)")
            .bind(&entity_id)
            .bind(state)
            .bind(now - TimeDelta::days(days_ago))
            .execute(&pool)
            .await
            .unwrap();
    }

    let store = PgHistoryStore::new(pool.clone());
    let samples = store
        .samples(&entity_id, now - TimeDelta::days(14), now)
        .await
        .unwrap();

    let states: Vec<_> = samples.iter().map(|s| s.state.as_deref()).collect();
    assert_eq!(states, [Some("140.0"), None, Some("150.0")]);

    sqlx::query("DELETE FROM sensor_history WHERE entity_id = $1")
        .bind(&entity_id)
        .execute(&pool)
        .await
        .unwrap();
}
