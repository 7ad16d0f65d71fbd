//! Client construction and project listing over a stubbed transport.

use canopy_client::{ApiError, CanopyClient, ClientConfig, StubTransport};
use serde_json::json;

fn client_with_stub() -> (CanopyClient, StubTransport) {
    let stub = StubTransport::new();
    let client = CanopyClient::with_transport(Box::new(stub.clone()));
    (client, stub)
}

#[test]
fn open_rejects_an_unusable_base_url() {
    let error = CanopyClient::open(&ClientConfig::new("definitely not a url"))
        .expect_err("a base url without a scheme must be rejected");
    assert!(matches!(error, ApiError::InvalidBaseUrl(_)));
}

#[test]
fn list_project_keys_extracts_the_keys() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!([
        { "projectKey": "SALES", "name": "Sales analytics" },
        { "projectKey": "OPS" }
    ]));

    let keys = client
        .list_project_keys()
        .expect("project listing should succeed");

    assert_eq!(keys, vec!["SALES", "OPS"]);
    assert_eq!(stub.calls()[0].path, "projects");
}

#[test]
fn list_project_keys_requires_the_key_field() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!([ { "name": "Sales analytics" } ]));

    let error = client
        .list_project_keys()
        .expect_err("an entry without a projectKey must fail the listing");
    assert!(matches!(error, ApiError::InvalidResponse(_)));
}

#[test]
fn handles_format_with_debug_without_exposing_the_transport() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!({
        "taxonomy": [ { "id": "A", "children": [] } ],
        "homeArticleId": null
    }));

    assert_eq!(format!("{client:?}"), "CanopyClient { .. }");

    let project = client.project("PROJ");
    assert!(format!("{project:?}").contains("PROJ"));
    assert!(format!("{:?}", project.wiki()).contains("PROJ"));
    assert!(format!("{:?}", project.dataset("orders")).contains("orders"));
    assert!(format!("{:?}", project.webapp("wa-1")).contains("wa-1"));

    let settings = project
        .wiki()
        .settings()
        .expect("settings fetch should succeed");
    assert!(format!("{settings:?}").starts_with("WikiSettings"));
}

#[test]
fn a_rejection_surfaces_status_and_message() {
    let (client, stub) = client_with_stub();
    stub.push_rejection(403, "forbidden");

    let error = client
        .list_project_keys()
        .expect_err("a rejected call must fail");

    assert!(matches!(error, ApiError::Rejected { status: 403, .. }));
    assert_eq!(
        error.to_string(),
        "server rejected the call (HTTP 403): forbidden"
    );
}
