//! Virtual network creation and document editing flows over a stubbed
//! transport.

use canopy_client::{
    ApiError, DeployerManagement, FleetClient, HttpMethod, HttpsStrategy, StubTransport,
};
use serde_json::json;

fn fleet_with_stub() -> (FleetClient, StubTransport) {
    let stub = StubTransport::new();
    let fleet = FleetClient::with_transport(Box::new(stub.clone()), "main");
    (fleet, stub)
}

#[test]
fn aws_creator_builds_the_payload_and_posts_it() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "id": "vn-1", "label": "prod", "mode": "EXISTING_MONOTENANT" }));

    let network = fleet
        .new_aws_virtual_network_creator("prod")
        .with_internet_access_mode("EGRESS_ONLY")
        .expect("a known access mode should be accepted")
        .with_vpc("vpc-123", "subnet-456")
        .with_security_groups(&["sg-1", "sg-2"])
        .create()
        .expect("create should succeed");

    assert_eq!(network.vn_id(), "vn-1");
    assert_eq!(network.label(), Some("prod"));

    let calls = stub.calls();
    assert_eq!(calls[0].method, HttpMethod::Post);
    assert_eq!(calls[0].path, "tenants/main/virtual-networks");
    assert_eq!(
        calls[0].query,
        vec![("useDefaultValues".to_string(), "false".to_string())]
    );
    assert_eq!(
        calls[0].body.clone().expect("create must carry a body"),
        json!({
            "label": "prod",
            "mode": "EXISTING_MONOTENANT",
            "internetAccessMode": "EGRESS_ONLY",
            "awsVpcId": "vpc-123",
            "awsSubnetId": "subnet-456",
            "awsAutoCreateSecurityGroups": false,
            "awsSecurityGroups": ["sg-1", "sg-2"]
        })
    );
}

#[test]
fn creator_rejects_an_unknown_internet_access_mode() {
    let (fleet, stub) = fleet_with_stub();

    let error = fleet
        .new_aws_virtual_network_creator("prod")
        .with_internet_access_mode("MAYBE")
        .expect_err("an unknown access mode must be rejected");

    assert!(matches!(error, ApiError::InvalidRequest(_)));
    assert!(stub.calls().is_empty());
}

#[test]
fn azure_creator_carries_the_default_values_flag() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "id": "vn-2" }));

    fleet
        .new_azure_virtual_network_creator("staging")
        .with_virtual_network("/subscriptions/s/vn", "/subscriptions/s/subnet")
        .with_auto_update_security_groups(true)
        .with_default_values()
        .create()
        .expect("create should succeed");

    let calls = stub.calls();
    assert_eq!(
        calls[0].query,
        vec![("useDefaultValues".to_string(), "true".to_string())]
    );
    let sent = calls[0].body.clone().expect("create must carry a body");
    assert_eq!(sent["azureVnId"], "/subscriptions/s/vn");
    assert_eq!(sent["azureSubnetId"], "/subscriptions/s/subnet");
    assert_eq!(sent["azureAutoUpdateSecurityGroups"], true);
}

#[test]
fn save_puts_the_document_then_adopts_the_refetched_copy() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "id": "vn-1", "label": "prod" }));
    stub.push_empty();
    stub.push_json(json!({ "id": "vn-1", "label": "prod", "dnsStrategy": "NONE" }));

    let mut network = fleet
        .virtual_network("vn-1")
        .expect("network fetch should succeed");
    network.set_fleet_management(true, Some("events"), DeployerManagement::CentralDeployer);
    network.save().expect("save should succeed");

    let calls = stub.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].method, HttpMethod::Put);
    assert_eq!(calls[1].path, "tenants/main/virtual-networks/vn-1");
    let sent = calls[1].body.clone().expect("save must carry a body");
    assert_eq!(sent["managedNodesDirectory"], true);
    assert_eq!(sent["eventServerNodeLabel"], "events");
    assert_eq!(sent["nodesDirectoryDeployerMode"], "CENTRAL_DEPLOYER");

    assert_eq!(calls[2].method, HttpMethod::Get);
    // The local copy is the refetched server document.
    assert_eq!(network.raw()["dnsStrategy"], "NONE");
}

#[test]
fn fleet_management_clears_the_event_server_when_absent() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "id": "vn-1" }));

    let mut network = fleet
        .virtual_network("vn-1")
        .expect("network fetch should succeed");
    network.set_fleet_management(false, None, DeployerManagement::NoManagedDeployer);

    assert_eq!(network.raw()["managedNodesDirectory"], false);
    assert_eq!(network.raw()["eventServerNodeLabel"], json!(null));
    assert_eq!(network.raw()["nodesDirectoryDeployerMode"], "NO_MANAGED_DEPLOYER");
}

#[test]
fn https_strategies_merge_their_fields_into_the_document() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "id": "vn-1" }));

    let mut network = fleet
        .virtual_network("vn-1")
        .expect("network fetch should succeed");
    network.set_https_strategy(&HttpsStrategy::lets_encrypt("ops@example.com"));

    assert_eq!(network.raw()["httpsStrategy"], "LETSENCRYPT");
    assert_eq!(network.raw()["httpStrategy"], "REDIRECT");
    assert_eq!(network.raw()["contactMail"], "ops@example.com");

    network.set_https_strategy(&HttpsStrategy::self_signed(false));
    assert_eq!(network.raw()["httpsStrategy"], "SELF_SIGNED");
    assert_eq!(network.raw()["httpStrategy"], "DISABLE");
}

#[test]
fn aws_dns_strategy_switches_between_zones_and_none() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "id": "vn-1" }));

    let mut network = fleet
        .virtual_network("vn-1")
        .expect("network fetch should succeed");

    network.set_aws_dns_strategy(true, Some("Z-PRIV"), Some("Z-PUB"));
    assert_eq!(network.raw()["dnsStrategy"], "VN_SPECIFIC_CLOUD_DNS_SERVICE");
    assert_eq!(network.raw()["awsRoute53PrivateIPZoneId"], "Z-PRIV");
    assert_eq!(network.raw()["awsRoute53PublicIPZoneId"], "Z-PUB");

    network.set_aws_dns_strategy(false, None, None);
    assert_eq!(network.raw()["dnsStrategy"], "NONE");
}

#[test]
fn azure_dns_strategy_sets_the_zone_id() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "id": "vn-1" }));

    let mut network = fleet
        .virtual_network("vn-1")
        .expect("network fetch should succeed");
    network.set_azure_dns_strategy(true, Some("zone-1"));

    assert_eq!(network.raw()["dnsStrategy"], "VN_SPECIFIC_CLOUD_DNS_SERVICE");
    assert_eq!(network.raw()["azureDnsZoneId"], "zone-1");
}

#[test]
fn list_and_delete_round_out_the_lifecycle() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!([ { "id": "vn-1" }, { "id": "vn-2" } ]));
    stub.push_json(json!({ "jobId": "del-1" }));

    let networks = fleet
        .list_virtual_networks()
        .expect("listing should succeed");
    assert_eq!(networks.len(), 2);

    let descriptor = networks[0].delete().expect("delete should succeed");
    assert_eq!(descriptor["jobId"], "del-1");

    let calls = stub.calls();
    assert_eq!(calls[1].method, HttpMethod::Delete);
    assert_eq!(calls[1].path, "tenants/main/virtual-networks/vn-1");
}

#[test]
fn a_network_document_without_an_id_is_rejected() {
    let (fleet, stub) = fleet_with_stub();
    stub.push_json(json!({ "label": "prod" }));

    let error = fleet
        .virtual_network("vn-1")
        .expect_err("a document without an id must be rejected");
    assert!(matches!(error, ApiError::InvalidResponse(_)));
}
