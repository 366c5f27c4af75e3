// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Local servers on ephemeral ports.

use axum::Router;
use brute_force_harness::config::MockConfig;
use brute_force_harness::mock;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Start the mock classifier and return its address.
pub async fn spawn_mock(config: MockConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock::serve(listener, config));
    addr
}

/// Serve an arbitrary router, for backends that misbehave.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn analyze_url(addr: SocketAddr) -> String {
    format!("http://{}/analyze", addr)
}
