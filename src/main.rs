use cursorshare::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("invalid configuration");
    let state = AppState::new();

    let app = routes::app(state, &config.static_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "cursorshare listening");
    axum::serve(listener, app).await.expect("server failed");
}
