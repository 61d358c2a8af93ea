//! Integration tests for exporting packages from a mocked tenant.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stanctl::api::ApiClient;
use stanctl::config::{ConnectionSettings, LogSettings};
use stanctl::package::{ElementKind, Exporter, IncludeSpec, parse_includes_from_argv};

const DASHBOARDS: &str = "/api/custom-dashboard";
const EVENTS: &str = "/api/events/settings/event-specifications/custom";
const ENTITIES: &str = "/api/custom-entitytypes";
const MOBILE_ALERTS: &str = "/api/events/settings/mobile-app-alert-configs";
const APP_ALERTS: &str = "/api/events/settings/application-alert-configs";
const INFRA_ALERTS: &str = "/api/events/settings/infra-alert-configs";

fn client(server: &MockServer) -> ApiClient {
    let settings = ConnectionSettings::new(&server.uri(), "test-token", false).unwrap();
    ApiClient::new(&settings).unwrap()
}

async fn respond(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn json_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.ends_with(".json"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn specs(argv: &[&str]) -> Vec<IncludeSpec> {
    parse_includes_from_argv(argv)
}

#[tokio::test]
async fn test_empty_tenant_exports_nothing() {
    let server = MockServer::start().await;
    for route in [DASHBOARDS, EVENTS, ENTITIES, MOBILE_ALERTS, APP_ALERTS, INFRA_ALERTS] {
        respond(&server, "GET", route, 200, json!([])).await;
    }

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter.export(&specs(&["export"])).await.unwrap();

    assert!(stats.is_empty());
    for kind in ElementKind::ALL {
        let folder = dir.path().join(kind.folder());
        assert!(folder.is_dir());
        assert!(json_files(&folder).is_empty());
    }
}

#[tokio::test]
async fn test_title_filter_exports_matching_dashboards() {
    let server = MockServer::start().await;
    respond(
        &server,
        "GET",
        DASHBOARDS,
        200,
        json!([
            {"id": "d1", "title": "Production Kafka"},
            {"id": "d2", "title": "Staging Kafka"},
            {"id": "d3", "title": "Production Kafka"}
        ]),
    )
    .await;
    respond(&server, "GET", "/api/custom-dashboard/d1", 200, json!({"id": "d1", "title": "Production Kafka", "widgets": []})).await;
    respond(&server, "GET", "/api/custom-dashboard/d3", 200, json!({"id": "d3", "title": "Production Kafka", "widgets": [1]})).await;

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter
        .export(&specs(&["export", "--include", "type=dashboard", "title=^Production"]))
        .await
        .unwrap();

    assert_eq!(stats.dashboards.exported, 2);
    assert_eq!(stats.total(), 2);
    assert_eq!(
        json_files(&dir.path().join("dashboards")),
        ["production_kafka.json", "production_kafka_2.json"]
    );

    let saved = fs::read_to_string(dir.path().join("dashboards/production_kafka_2.json")).unwrap();
    assert!(saved.ends_with("}\n"));
    let saved: Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["id"], "d3");
}

#[tokio::test]
async fn test_id_only_clause_fetches_directly() {
    let server = MockServer::start().await;
    respond(&server, "GET", "/api/custom-dashboard/dash-1", 200, json!({"id": "dash-1", "title": "One"})).await;
    respond(&server, "GET", "/api/custom-dashboard/dash-2", 200, json!({"id": "dash-2", "title": "Two"})).await;
    Mock::given(method("GET"))
        .and(path(DASHBOARDS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter
        .export(&specs(&["export", "-F", "type=dashboard", "id=dash-1", "id=dash-2"]))
        .await
        .unwrap();

    assert_eq!(stats.dashboards.exported, 2);
    assert_eq!(json_files(&dir.path().join("dashboards")), ["one.json", "two.json"]);
}

#[tokio::test]
async fn test_entity_dashboards_are_written_separately() {
    let server = MockServer::start().await;
    respond(
        &server,
        "GET",
        ENTITIES,
        200,
        json!([{"id": "e1", "data": {"label": "Kafka Broker"}}]),
    )
    .await;
    respond(
        &server,
        "GET",
        "/api/custom-entitytypes/e1",
        200,
        json!({
            "id": "e1",
            "data": {
                "label": "Kafka Broker",
                "dashboards": [{"title": "Broker overview"}, {"title": "Broker JVM"}]
            }
        }),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter.export(&specs(&["export", "--include", "type=entity"])).await.unwrap();

    assert_eq!(stats.entities.exported, 1);
    assert_eq!(stats.entity_dashboards, 2);
    assert_eq!(json_files(&dir.path().join("entities")), ["kafka_broker.json"]);
    assert_eq!(
        json_files(&dir.path().join("dashboards")),
        ["kafka_broker_dashboard_1.json", "kafka_broker_dashboard_2.json"]
    );

    let entity: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("entities/kafka_broker.json")).unwrap()).unwrap();
    assert_eq!(
        entity["data"]["dashboards"],
        json!([
            {"reference": "kafka_broker_dashboard_1.json"},
            {"reference": "kafka_broker_dashboard_2.json"}
        ])
    );
}

#[tokio::test]
async fn test_smart_alerts_survive_a_failing_endpoint() {
    let server = MockServer::start().await;
    respond(&server, "GET", MOBILE_ALERTS, 500, json!({"error": "boom"})).await;
    respond(&server, "GET", APP_ALERTS, 200, json!([{"id": "a1", "name": "Latency", "applicationId": "app"}])).await;
    respond(
        &server,
        "GET",
        INFRA_ALERTS,
        200,
        json!([{"id": "i1", "name": "CPU", "rule": {"entityType": "host"}}]),
    )
    .await;
    respond(
        &server,
        "GET",
        &format!("{APP_ALERTS}/a1"),
        200,
        json!({"id": "a1", "name": "Latency", "applicationId": "app", "threshold": 5}),
    )
    .await;
    respond(
        &server,
        "GET",
        &format!("{INFRA_ALERTS}/i1"),
        200,
        json!({"id": "i1", "name": "CPU", "rule": {"entityType": "host"}, "threshold": 90}),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter
        .export(&specs(&["export", "--include", "type=smart-alert"]))
        .await
        .unwrap();

    assert_eq!(stats.smart_alerts.exported, 2);
    assert_eq!(json_files(&dir.path().join("smart-alerts")), ["cpu.json", "latency.json"]);

    // The by-id payload is written, not the list entry.
    let saved: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("smart-alerts/latency.json")).unwrap()).unwrap();
    assert_eq!(saved["threshold"], 5);
}

#[tokio::test]
async fn test_smart_alert_by_id_falls_through_endpoints() {
    let server = MockServer::start().await;
    respond(&server, "GET", &format!("{MOBILE_ALERTS}/a1"), 404, json!({"error": "not found"})).await;
    respond(
        &server,
        "GET",
        &format!("{APP_ALERTS}/a1"),
        200,
        json!({"id": "a1", "name": "Latency", "applicationId": "app"}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{INFRA_ALERTS}/a1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter
        .export(&specs(&["export", "-F", "type=smart-alert", "id=a1"]))
        .await
        .unwrap();

    assert_eq!(stats.smart_alerts.exported, 1);
    assert_eq!(json_files(&dir.path().join("smart-alerts")), ["latency.json"]);
}

#[tokio::test]
async fn test_smart_alert_missing_from_every_endpoint_fails() {
    let server = MockServer::start().await;
    respond(&server, "GET", APP_ALERTS, 200, json!([{"id": "gone", "name": "Ghost", "applicationId": "app"}])).await;
    for route in [MOBILE_ALERTS, APP_ALERTS, INFRA_ALERTS] {
        respond(&server, "GET", &format!("{route}/gone"), 404, json!({"error": "not found"})).await;
    }

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter
        .export(&specs(&["export", "--include", "type=smart-alert"]))
        .await
        .unwrap();

    assert_eq!(stats.smart_alerts.exported, 0);
    assert_eq!(stats.smart_alerts.failed, 1);
    assert!(json_files(&dir.path().join("smart-alerts")).is_empty());
}

#[tokio::test]
async fn test_entity_dashboard_does_not_overwrite_standalone_dashboard() {
    let server = MockServer::start().await;
    respond(&server, "GET", DASHBOARDS, 200, json!([{"id": "d1", "title": "Kafka_dashboard_1"}])).await;
    respond(
        &server,
        "GET",
        "/api/custom-dashboard/d1",
        200,
        json!({"id": "d1", "title": "Kafka_dashboard_1", "widgets": ["standalone"]}),
    )
    .await;
    respond(&server, "GET", ENTITIES, 200, json!([{"id": "e1", "data": {"label": "Kafka"}}])).await;
    respond(
        &server,
        "GET",
        "/api/custom-entitytypes/e1",
        200,
        json!({"id": "e1", "data": {"label": "Kafka", "dashboards": [{"title": "Inline", "widgets": ["entity"]}]}}),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter
        .export(&specs(&["export", "-F", "type=dashboard", "-F", "type=entity"]))
        .await
        .unwrap();

    assert_eq!(stats.dashboards.exported, 1);
    assert_eq!(stats.entity_dashboards, 1);
    assert_eq!(
        json_files(&dir.path().join("dashboards")),
        ["kafka_dashboard_1.json", "kafka_dashboard_1_2.json"]
    );

    let read = |relative: &str| -> Value {
        serde_json::from_str(&fs::read_to_string(dir.path().join(relative)).unwrap()).unwrap()
    };
    assert_eq!(read("dashboards/kafka_dashboard_1.json")["widgets"], json!(["standalone"]));
    assert_eq!(read("dashboards/kafka_dashboard_1_2.json")["widgets"], json!(["entity"]));
    assert_eq!(
        read("entities/kafka.json")["data"]["dashboards"],
        json!([{"reference": "kafka_dashboard_1_2.json"}])
    );
}

#[tokio::test]
async fn test_non_object_list_entry_counts_as_failed() {
    let server = MockServer::start().await;
    respond(&server, "GET", EVENTS, 200, json!([{"id": "ev1", "name": "High CPU"}, "oops", 7])).await;
    respond(
        &server,
        "GET",
        &format!("{EVENTS}/ev1"),
        200,
        json!({"id": "ev1", "name": "High CPU"}),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let stats = exporter.export(&specs(&["export", "--include", "type=event"])).await.unwrap();

    assert_eq!(stats.events.exported, 1);
    assert_eq!(stats.events.failed, 2);
    assert_eq!(json_files(&dir.path().join("events")), ["high_cpu.json"]);
}

#[tokio::test]
async fn test_existing_export_is_refused_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("events")).unwrap();
    fs::write(dir.path().join("events/old.json"), "{}").unwrap();

    let client = client(&server);
    let exporter = Exporter::new(&client, dir.path(), LogSettings::default());
    let err = exporter.export(&specs(&["export"])).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
}
