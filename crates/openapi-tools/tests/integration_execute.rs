use anyhow::Context as _;
use serde_json::json;
use specbridge_http_tools::config::{NetworkConfig, RuntimeConfig};
use specbridge_http_tools::registry::ToolRegistry;
use specbridge_http_tools::runtime::ToolExecutor;
use specbridge_http_tools::transport::ReqwestTransport;
use specbridge_openapi_tools::config::{SpecSource, ToolOverridePolicy};
use specbridge_openapi_tools::loader::load_spec;
use specbridge_openapi_tools::{compile_into, resolve_server_url};
use specbridge_test_support::EchoServer;
use std::sync::Arc;

const PETSTORE_V3: &str = include_str!("fixtures/petstore_v3.yaml");
const PETSTORE_V2: &str = include_str!("fixtures/petstore_v2.json");

/// Serve the v3 fixture, load it over HTTP, compile it and point the executor at the document's
/// own (relative) server.
async fn petstore_v3(server: &EchoServer, runtime_yaml: &str) -> anyhow::Result<ToolExecutor> {
    let transport = ReqwestTransport::new(&NetworkConfig::default())?;
    let spec_url = format!("{}/api/v3/openapi.yaml", server.base_url());
    let loaded = load_spec(&SpecSource::new(spec_url.clone()), &transport).await?;

    let registry = Arc::new(ToolRegistry::new());
    let compiled = compile_into(&registry, &loaded.document, &ToolOverridePolicy::default())?;

    let mut config: RuntimeConfig = serde_yaml::from_str(runtime_yaml).context("runtime config")?;
    if config.base_url.is_none() {
        let server_url = compiled.default_base_url.context("default server")?;
        config.base_url = Some(resolve_server_url(&server_url, &spec_url)?);
    }
    Ok(ToolExecutor::new(registry, &config)?)
}

#[tokio::test]
async fn path_arguments_are_encoded_and_consumed() -> anyhow::Result<()> {
    let server = EchoServer::start_serving(&[("/api/v3/openapi.yaml", PETSTORE_V3)]).await;
    let executor = petstore_v3(&server, "{}").await?;

    let response = executor
        .execute("showPetById", &json!({"petId": "a b", "X-Request-Id": "req-1"}))
        .await?;
    assert_eq!(response.status, 200);

    let requests = server.requests();
    let call = requests.last().context("recorded call")?;
    assert_eq!(call.method, "GET");
    assert_eq!(call.path, "/api/v3/pets/a%20b");
    assert_eq!(call.query, "");
    assert_eq!(call.header("x-request-id"), Some("req-1"));
    assert_eq!(call.header("content-type"), None);
    assert_eq!(call.body, "");

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn query_values_are_percent_encoded() -> anyhow::Result<()> {
    let server = EchoServer::start_serving(&[("/api/v3/openapi.yaml", PETSTORE_V3)]).await;
    let executor = petstore_v3(&server, "{}").await?;

    executor
        .execute(
            "listPets",
            &json!({"searchTerm": "a&b=c", "limit": 5, "tags": ["x y", "z"]}),
        )
        .await?;
    let requests = server.requests();
    let call = requests.last().context("recorded call")?;
    assert_eq!(call.path, "/api/v3/pets");
    assert_eq!(call.query, "limit=5&searchTerm=a%26b%3Dc&tags=x%20y&tags=z");

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn get_with_extra_arguments_never_sends_a_body() -> anyhow::Result<()> {
    let server = EchoServer::start_serving(&[("/api/v3/openapi.yaml", PETSTORE_V3)]).await;
    let executor = petstore_v3(&server, "{}").await?;
    let before = server.requests().len();

    let err = executor
        .execute("showPetById", &json!({"petId": "1", "unexpected": true}))
        .await
        .err()
        .context("expected argument error")?;
    assert_eq!(err.kind().as_str(), "UnexpectedArgumentError");
    assert_eq!(server.requests().len(), before);

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn post_sends_remaining_arguments_as_json() -> anyhow::Result<()> {
    let server = EchoServer::start_serving(&[("/api/v3/openapi.yaml", PETSTORE_V3)]).await;
    let executor = petstore_v3(
        &server,
        "auth:\n  mode: basic\n  username: test-user\n  password: test-password\n",
    )
    .await?;

    let result = executor
        .call_tool("createPet", json!({"name": "doggie", "tag": "good"}))
        .await;
    assert_ne!(result.is_error, Some(true));

    let requests = server.requests();
    let call = requests.last().context("recorded call")?;
    assert_eq!(call.method, "POST");
    assert_eq!(call.path, "/api/v3/pets");
    assert_eq!(call.header("content-type"), Some("application/json"));
    assert_eq!(
        call.header("authorization"),
        Some("Basic dGVzdC11c2VyOnRlc3QtcGFzc3dvcmQ=")
    );
    let body: serde_json::Value = serde_json::from_str(&call.body)?;
    assert_eq!(body, json!({"name": "doggie", "tag": "good"}));

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn unknown_tool_makes_no_request() -> anyhow::Result<()> {
    let server = EchoServer::start_serving(&[("/api/v3/openapi.yaml", PETSTORE_V3)]).await;
    let executor = petstore_v3(&server, "{}").await?;
    let before = server.requests().len();

    let result = executor.call_tool("does-not-exist", json!({})).await;
    assert_eq!(result.is_error, Some(true));
    let text = serde_json::to_string(&result.content)?;
    assert!(text.contains("UnknownToolError"), "{text}");
    assert_eq!(server.requests().len(), before);

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn swagger_body_and_api_key_query() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let document = specbridge_openapi_tools::loader::parse_document(PETSTORE_V2, "petstore_v2.json")?;
    let registry = Arc::new(ToolRegistry::new());
    compile_into(&registry, &document, &ToolOverridePolicy::default())?;

    // The document's https host is replaced by the local server.
    let config: RuntimeConfig = serde_yaml::from_str(&format!(
        "baseUrl: {}/v2\nauth:\n  mode: apiKey\n  keyName: api_key\n  keyLocation: query\n  keyValue: s3cret\n",
        server.base_url()
    ))?;
    let executor = ToolExecutor::new(registry, &config)?;

    executor
        .execute("findPetsByStatus", &json!({"status": ["available", "sold"]}))
        .await?;
    executor
        .execute("addPet", &json!({"name": "doggie", "status": "available"}))
        .await?;

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/v2/pet/findByStatus");
    assert_eq!(
        requests[0].query,
        "status=available&status=sold&api_key=s3cret"
    );
    assert_eq!(requests[1].path, "/v2/pet");
    assert_eq!(requests[1].query, "api_key=s3cret");
    let body: serde_json::Value = serde_json::from_str(&requests[1].body)?;
    assert_eq!(body, json!({"name": "doggie", "status": "available"}));

    server.stop().await;
    Ok(())
}
