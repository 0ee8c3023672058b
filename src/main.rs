mod app;
mod assignments;
mod auth;
mod clock;
mod config;
mod error;
mod mailer;
mod otp;
mod state;
mod store;

use crate::otp::sweep::OtpSweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "eduverse=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init().await?;

    OtpSweeper::new(state.otps.clone(), state.clock.clone()).start();

    app::serve(app::build_app(state)).await
}
