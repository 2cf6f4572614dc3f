// Path: crates/agent/src/rpc/mod.rs

mod ledger_client;
mod mail_relay;
mod signer;

pub use ledger_client::RpcLedgerClient;
pub use mail_relay::HttpMailRelay;
pub use signer::RemoteSigner;

use std::time::Duration;

/// Timeout applied to every request made by the HTTP adapters.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Serves `router` on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub(crate) async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
