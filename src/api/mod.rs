pub mod routes;

use crate::session::Session;
use anyhow::{Context, Result};
use axum::Router;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

pub async fn run_server(session: Session) -> Result<()> {
    let port = session.config().api_port;
    let state = routes::ApiState {
        session: Arc::new(Mutex::new(session)),
    };
    let app: Router = routes::router(state);

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server: {addr}"))?;

    info!(address = %addr, "HabitCoach API server started");

    axum::serve(listener, app)
        .await
        .context("API server failed")?;

    Ok(())
}
