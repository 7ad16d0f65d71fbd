//! Dataset listing, settings shaping, and data management flows over a
//! stubbed transport.

use canopy_client::{ApiError, CanopyClient, HttpMethod, StorageFamily, StubTransport};
use serde_json::json;

fn client_with_stub() -> (CanopyClient, StubTransport) {
    let stub = StubTransport::new();
    let client = CanopyClient::with_transport(Box::new(stub.clone()));
    (client, stub)
}

#[test]
fn list_datasets_parses_typed_items() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!([
        {
            "name": "orders",
            "id": "orders",
            "type": "PostgreSQL",
            "params": { "connection": "warehouse" },
            "schema": { "columns": [ { "name": "order_id", "type": "bigint" } ] }
        },
        { "name": "raw_events", "type": "S3" }
    ]));

    let items = client
        .project("PROJ")
        .list_datasets()
        .expect("listing should succeed");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name(), "orders");
    assert_eq!(items[0].kind(), Some("PostgreSQL"));
    assert_eq!(items[0].connection(), Some("warehouse"));
    let column = items[0]
        .schema_column("order_id")
        .expect("column should be present");
    assert_eq!(column["type"], "bigint");
    assert!(items[0].schema_column("missing").is_none());
    assert!(items[1].connection().is_none());
    assert_eq!(stub.calls()[0].path, "projects/PROJ/datasets");
}

#[test]
fn list_datasets_rejects_an_entry_without_a_name() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!([ { "type": "S3" } ]));

    let error = client
        .project("PROJ")
        .list_datasets()
        .expect_err("a nameless entry must fail the listing");
    assert!(matches!(error, ApiError::InvalidResponse(_)));
}

#[test]
fn sql_settings_helpers_shape_the_document_before_save() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!({
        "name": "orders",
        "type": "PostgreSQL",
        "params": { "connection": "old" },
        "partitioning": { "dimensions": [] }
    }));
    stub.push_empty();

    let project = client.project("PROJ");
    let dataset = project.dataset("orders");
    let mut settings = dataset.settings().expect("settings fetch should succeed");
    assert_eq!(settings.storage_family(), StorageFamily::Sql);

    settings.set_table("warehouse", "public", "orders");
    settings.add_discrete_partitioning_dimension("country");
    settings.save().expect("save should succeed");

    let calls = stub.calls();
    assert_eq!(calls[1].method, HttpMethod::Put);
    assert_eq!(calls[1].path, "projects/PROJ/datasets/orders");
    let sent = calls[1].body.clone().expect("save must carry a body");
    assert_eq!(sent["params"]["mode"], "table");
    assert_eq!(sent["params"]["connection"], "warehouse");
    assert_eq!(sent["params"]["schema"], "public");
    assert_eq!(sent["params"]["table"], "orders");
    assert_eq!(sent["partitioning"]["dimensions"][0]["name"], "country");
    assert_eq!(sent["partitioning"]["dimensions"][0]["type"], "value");
}

#[test]
fn file_settings_helpers_cover_format_and_partitioning() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!({ "name": "raw_events", "type": "S3", "params": {} }));

    let project = client.project("PROJ");
    let dataset = project.dataset("raw_events");
    let mut settings = dataset.settings().expect("settings fetch should succeed");
    assert_eq!(settings.storage_family(), StorageFamily::FileLike);

    settings.set_connection_and_path("s3-main", "/events");
    settings.set_csv_format(";", "excel", 0, true, 0);
    settings.add_time_partitioning_dimension("day", "DAY");
    settings.set_partitioning_file_pattern("%Y/%M/%D/.*");
    settings.add_raw_schema_column("event_id", "string");

    let raw = settings.raw();
    assert_eq!(raw["params"]["connection"], "s3-main");
    assert_eq!(raw["params"]["path"], "/events");
    assert_eq!(raw["formatType"], "csv");
    assert_eq!(raw["formatParams"]["separator"], ";");
    assert_eq!(raw["formatParams"]["parseHeaderRow"], true);
    assert_eq!(raw["partitioning"]["dimensions"][0]["type"], "time");
    assert_eq!(raw["partitioning"]["dimensions"][0]["params"]["period"], "DAY");
    assert_eq!(raw["partitioning"]["filePathPattern"], "%Y/%M/%D/.*");
    assert_eq!(raw["schema"]["columns"][0]["name"], "event_id");
}

#[test]
fn remove_partitioning_resets_the_dimension_list() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!({
        "name": "raw_events",
        "type": "S3",
        "partitioning": { "dimensions": [ { "name": "day", "type": "time" } ] }
    }));

    let project = client.project("PROJ");
    let dataset = project.dataset("raw_events");
    let mut settings = dataset.settings().expect("settings fetch should succeed");
    settings.remove_partitioning();

    assert_eq!(settings.raw()["partitioning"], json!({ "dimensions": [] }));
}

#[test]
fn clear_passes_the_partition_list_as_a_query() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!({ "status": "ok" }));

    let project = client.project("PROJ");
    project
        .dataset("orders")
        .clear(Some("2024-01,2024-02"))
        .expect("clear should succeed");

    let calls = stub.calls();
    assert_eq!(calls[0].method, HttpMethod::Delete);
    assert_eq!(calls[0].path, "projects/PROJ/datasets/orders/data");
    assert_eq!(
        calls[0].query,
        vec![("partitions".to_string(), "2024-01,2024-02".to_string())]
    );
}

#[test]
fn delete_sends_the_drop_data_flag() {
    let (client, stub) = client_with_stub();
    stub.push_empty();

    let project = client.project("PROJ");
    project
        .dataset("orders")
        .delete(true)
        .expect("delete should succeed");

    let calls = stub.calls();
    assert_eq!(calls[0].path, "projects/PROJ/datasets/orders");
    assert_eq!(
        calls[0].query,
        vec![("dropData".to_string(), "true".to_string())]
    );
}

#[test]
fn uploaded_add_file_records_the_file_name() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!({ "wasArchive": false }));

    let project = client.project("PROJ");
    project
        .dataset("uploads")
        .uploaded_add_file("events.csv", b"a,b\n1,2\n".to_vec())
        .expect("upload should succeed");

    let calls = stub.calls();
    assert_eq!(calls[0].path, "projects/PROJ/datasets/uploads/uploaded/files");
    assert_eq!(calls[0].upload_file_name.as_deref(), Some("events.csv"));
}

#[test]
fn list_partitions_decodes_a_string_array() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!(["2024-01", "2024-02"]));

    let project = client.project("PROJ");
    let partitions = project
        .dataset("orders")
        .list_partitions()
        .expect("partition listing should succeed");

    assert_eq!(partitions, vec!["2024-01", "2024-02"]);
    assert_eq!(stub.calls()[0].path, "projects/PROJ/datasets/orders/partitions");
}

#[test]
fn list_partitions_rejects_a_non_string_entry() {
    let (client, stub) = client_with_stub();
    stub.push_json(json!(["2024-01", 7]));

    let error = client
        .project("PROJ")
        .dataset("orders")
        .list_partitions()
        .expect_err("a non-string partition id must fail decoding");
    assert!(matches!(error, ApiError::InvalidResponse(_)));
}
