use std::{net::SocketAddr, sync::Arc};

use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use session_auth::{
    auth::TokenMinter,
    config::AppConfig,
    db::connection,
    identity::GoogleIdentityProvider,
    logging::init_tracing,
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        eprintln!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging)?;

    let db = connection::connect(cfg.database()?).await?;
    let identity = Arc::new(GoogleIdentityProvider::new(cfg.google()?)?);
    let tokens = TokenMinter::from_config(cfg.auth()?, &cfg.general.host);

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port).parse()?;
    let state = AppState::new(cfg, db, identity, tokens);

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
