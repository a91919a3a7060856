#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use apim_gateway::{ArmManagementClient, ArmRoutes, StaticTokenCredential};
use apim_gateway_sdk::{ApimError, DebugCredentialsRequest, ManagementPlane, SecretValue, ServiceScope};
use httpmock::prelude::*;
use serde_json::json;

const SERVICE_PATH: &str =
    "/subscriptions/sub-1/resourceGroups/rg-ai/providers/Microsoft.ApiManagement/service/apim-ai";

fn client(server: &MockServer) -> ArmManagementClient {
    ArmManagementClient::new(
        ArmRoutes::new(&server.base_url(), "2022-08-01", "2023-05-01-preview", "2021-04-01"),
        Arc::new(StaticTokenCredential::new(SecretValue::new("t0k"))),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn scope() -> ServiceScope {
    ServiceScope::new("sub-1", "rg-ai", "apim-ai")
}

#[tokio::test]
async fn get_service_sends_bearer_token_and_api_version() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(SERVICE_PATH)
            .query_param("api-version", "2022-08-01")
            .header("authorization", "Bearer t0k");
        then.status(200).json_body(json!({
            "id": SERVICE_PATH,
            "name": "apim-ai",
            "properties": {"gatewayUrl": "https://apim-ai.azure-api.net"}
        }));
    });

    let service = client(&server).get_service(&scope()).await.unwrap();
    assert_eq!(service.id, SERVICE_PATH);
    assert_eq!(service.gateway_url, "https://apim-ai.azure-api.net");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn list_apis_follows_next_link() {
    let server = MockServer::start();
    let apis_path = format!("{SERVICE_PATH}/apis");
    let second_page = server.mock(|when, then| {
        when.method(GET).path(&apis_path).query_param("page", "2");
        then.status(200).json_body(json!({
            "value": [{"id": "b", "name": "azure-openai", "properties": {"path": "openai"}}]
        }));
    });
    let first_page = server.mock(|when, then| {
        when.method(GET)
            .path(&apis_path)
            .query_param("api-version", "2022-08-01")
            .query_param_missing("page");
        then.status(200).json_body(json!({
            "value": [{"id": "a", "name": "echo", "properties": {"path": "echo"}}],
            "nextLink": server.url(format!("{apis_path}?api-version=2022-08-01&page=2"))
        }));
    });

    let apis = client(&server).list_apis(&scope()).await.unwrap();
    let names: Vec<&str> = apis.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["echo", "azure-openai"]);
    assert_eq!(first_page.calls(), 1);
    assert_eq!(second_page.calls(), 1);
}

#[tokio::test]
async fn missing_policy_fragment_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("{SERVICE_PATH}/policyFragments/set-backend-pools"));
        then.status(404).json_body(json!({
            "error": {"code": "ResourceNotFound", "message": "Policy fragment not found."}
        }));
    });

    let err = client(&server)
        .get_policy_fragment(&scope(), "set-backend-pools")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "get policy fragment HTTP 404");
}

#[tokio::test]
async fn list_secrets_posts_empty_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{SERVICE_PATH}/subscriptions/master/listSecrets"))
            .header("authorization", "Bearer t0k");
        then.status(200)
            .json_body(json!({"primaryKey": "pk-1", "secondaryKey": "sk-1"}));
    });

    let secrets = client(&server)
        .list_subscription_secrets(&scope(), "master")
        .await
        .unwrap();
    assert_eq!(secrets.primary_key.expose(), "pk-1");
    assert_eq!(secrets.secondary_key.unwrap().expose(), "sk-1");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn debug_credentials_post_documented_body() {
    let server = MockServer::start();
    let api_id = format!("{SERVICE_PATH}/apis/azure-openai");
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{SERVICE_PATH}/gateways/managed/listDebugCredentials"))
            .query_param("api-version", "2023-05-01-preview")
            .json_body(json!({
                "credentialsExpireAfter": "PT1H",
                "apiId": api_id,
                "purposes": ["tracing"]
            }));
        then.status(200).json_body(json!({"token": "dbg-123"}));
    });

    let token = client(&server)
        .list_debug_credentials(SERVICE_PATH, &DebugCredentialsRequest::tracing("PT1H", &api_id))
        .await
        .unwrap();
    assert_eq!(token.as_deref(), Some("dbg-123"));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn trace_with_empty_body_is_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path(format!("{SERVICE_PATH}/gateways/managed/listTrace"))
            .json_body(json!({"traceId": "trace-1"}));
        then.status(200);
    });

    let trace = client(&server).list_trace(SERVICE_PATH, "trace-1").await.unwrap();
    assert_eq!(trace, None);
}

#[tokio::test]
async fn trace_with_empty_object_is_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path(format!("{SERVICE_PATH}/gateways/managed/listTrace"));
        then.status(200).json_body(json!({}));
    });

    let trace = client(&server).list_trace(SERVICE_PATH, "trace-1").await.unwrap();
    assert_eq!(trace, None);
}

#[tokio::test]
async fn forbidden_is_http_error_without_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{SERVICE_PATH}/subscriptions"));
        then.status(403)
            .json_body(json!({"error": {"message": "secret diagnostic"}}));
    });

    let err = client(&server).list_subscriptions(&scope()).await.unwrap_err();
    assert!(matches!(err, ApimError::Http { status: 403, .. }));
    assert!(!err.to_string().contains("secret diagnostic"));
}

#[tokio::test]
async fn resource_listing_filters_by_type() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/subscriptions/sub-1/resourceGroups/rg-ai/resources")
            .query_param("api-version", "2021-04-01")
            .query_param("$filter", "resourceType eq 'Microsoft.ApiManagement/service'");
        then.status(200).json_body(json!({
            "value": [{
                "id": SERVICE_PATH,
                "name": "apim-ai",
                "type": "Microsoft.ApiManagement/service"
            }]
        }));
    });

    let resources = client(&server)
        .list_service_resources("sub-1", "rg-ai")
        .await
        .unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].name, "apim-ai");
    assert_eq!(mock.calls(), 1);
}
