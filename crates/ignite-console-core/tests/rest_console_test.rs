#![allow(clippy::unwrap_used)]
// The REST-backed console against a wiremock server: sign-in, work,
// sign-out and the store reset that follows it.

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ignite_console_core::{
    AutoConfirm, Cache, ConsoleConfig, CoreError, Credentials, LoadRequest, RestConsole, State,
};

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

fn signed_in_config(server: &MockServer) -> ConsoleConfig {
    let mut config = ConsoleConfig::new(Url::parse(&server.uri()).unwrap());
    config.credentials = Some(Credentials {
        email: "admin@example.com".into(),
        password: "secret".to_string().into(),
    });
    config
}

#[tokio::test]
async fn oneshot_resets_store_after_logout() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/configuration/clusters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "c1", "name": "Prod", "discovery": "Multicast",
             "cachesCount": 0, "modelsCount": 0, "igfsCount": 0},
        ])))
        .mount(&server)
        .await;

    let config = signed_in_config(&server);
    let console = RestConsole::oneshot(&config, Arc::new(AutoConfirm(true)), |console| async move {
        console.load(LoadRequest::UserClusters).await?;
        assert_eq!(console.state().short_clusters.len(), 1);
        Ok::<_, CoreError>(console)
    })
    .await
    .unwrap();

    assert_eq!(*console.state(), State::default());
}

#[tokio::test]
async fn logout_failure_still_resets_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("session store down"))
        .mount(&server)
        .await;

    let console = RestConsole::connect(&signed_in_config(&server), Arc::new(AutoConfirm(true)))
        .await
        .unwrap();
    console.upsert_basic_cache(Cache::blank("Draft", Vec::new()));
    assert_eq!(console.state().basic_caches.ids.len(), 1);

    console.logout().await;
    assert_eq!(*console.state(), State::default());
    console.shutdown().await;
}
