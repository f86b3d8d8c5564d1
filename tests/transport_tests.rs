//! HTTP transport tests against a real listener

use finegate::config::load_config_from_str;
use finegate::kernel::{Kernel, SharedKernel};
use finegate::server::{AppState, router};
use finegate::transport::{HttpConfig, run_http};
use finegate::upstream::UpstreamClient;
use std::sync::Arc;

const CONFIG: &str = r#"
[credentials]
classic_pat = "ghp_transport_test"

[[rules]]
effect = "allow"
actions = ["metadata:read"]
repos = ["*"]
"#;

async fn start() -> finegate::transport::RunningServer {
    let config = load_config_from_str(CONFIG).unwrap();
    let kernel = Arc::new(SharedKernel::new(Kernel::from_config(&config).unwrap()));
    let probe = Arc::new(UpstreamClient::new(&config.upstream).unwrap());
    let app = router(AppState::new(kernel, probe));

    run_http(app, HttpConfig::from_host_port("127.0.0.1", 0).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_serves_requests_on_ephemeral_port() {
    let server = start().await;
    assert_ne!(server.local_addr.port(), 0);

    let client = reqwest::Client::new();
    let base = format!("http://{}", server.local_addr);

    let health = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(health.status(), 200);

    let decision = client
        .post(format!("{base}/v1/authorize"))
        .json(&serde_json::json!({"kind": "rest", "method": "GET", "path": "/repos/a/b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(decision.status(), 200);

    server.stop().await;
}

#[tokio::test]
async fn test_stop_releases_listener() {
    let server = start().await;
    let addr = server.local_addr;
    server.stop().await;

    let result = reqwest::Client::new()
        .get(format!("http://{addr}/healthz"))
        .send()
        .await;
    assert!(result.is_err());
}
