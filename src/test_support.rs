use axum::Router;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::thread;

/// Serves `router` on an ephemeral localhost port from its own runtime thread.
pub fn spawn_stub(router: Router) -> String {
    let listener =
        TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).expect("bind stub port");
    listener
        .set_nonblocking(true)
        .expect("set stub listener non-blocking");
    let addr = listener.local_addr().expect("stub address");

    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("stub runtime");

        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("stub listener");
            let _ = axum::serve(listener, router).await;
        });
    });

    format!("http://{addr}")
}

/// Base URL of a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener =
        TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).expect("bind probe port");
    let port = listener.local_addr().expect("probe address").port();
    drop(listener);

    format!("http://127.0.0.1:{port}")
}
