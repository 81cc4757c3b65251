//! Declarative fault injection: nth-call pinning, request matchers, and
//! first-match-wins ordering.

use salad_mock::harness::call_in_process;
use salad_mock::{compile, MockServer, ScenarioConfig};
use salad_protocol::StatusCode;
use serde_json::json;

fn server(doc: &str) -> MockServer {
    MockServer::new(compile(ScenarioConfig::from_str(doc).unwrap()).unwrap())
}

#[test]
fn test_nth_call_fault_fires_on_second_call_only() {
    let server = server(
        "
version: 1
fixtures:
  captures:
    - capture_id: 1
      status: completed
faults:
  - when:
      method: SaveCapture
      nth_call: 2
    respond:
      status: PERMISSION_DENIED
      message: blocked
",
    );

    let resp = call_in_process(&server, "SaveCapture", json!({"capture_id": 1, "filepath": "/tmp/a.sal"}));
    assert!(resp.ok, "first call must pass: {:?}", resp.error);

    let resp = call_in_process(&server, "SaveCapture", json!({"capture_id": 1, "filepath": "/tmp/b.sal"}));
    assert!(!resp.ok);
    let err = resp.error.unwrap();
    assert_eq!(err.code, StatusCode::PermissionDenied);
    assert_eq!(err.message, "blocked");

    let resp = call_in_process(&server, "SaveCapture", json!({"capture_id": 1, "filepath": "/tmp/c.sal"}));
    assert!(resp.ok, "third call must pass again");
}

#[test]
fn test_first_matching_rule_wins() {
    let both = "
version: 1
faults:
  - when: {method: LoadCapture}
    respond: {status: UNAVAILABLE, message: first}
  - when: {method: LoadCapture}
    respond: {status: INTERNAL, message: second}
";
    let resp = call_in_process(&server(both), "LoadCapture", json!({"filepath": "/tmp/x.sal"}));
    let err = resp.error.unwrap();
    assert_eq!(err.code, StatusCode::Unavailable);
    assert_eq!(err.message, "first");

    // Dropping the first rule exposes the second.
    let second_only = "
version: 1
faults:
  - when: {method: LoadCapture}
    respond: {status: INTERNAL, message: second}
";
    let resp = call_in_process(&server(second_only), "LoadCapture", json!({"filepath": "/tmp/x.sal"}));
    let err = resp.error.unwrap();
    assert_eq!(err.code, StatusCode::Internal);
    assert_eq!(err.message, "second");
}

#[test]
fn test_filepath_matcher_scopes_the_fault() {
    let server = server(
        "
version: 1
faults:
  - when:
      method: LoadCapture
      match: {filepath: /tmp/poison.sal}
    respond: {status: DATA_LOSS, message: corrupt}
",
    );

    let resp = call_in_process(&server, "LoadCapture", json!({"filepath": "/tmp/fine.sal"}));
    assert!(resp.ok);

    let resp = call_in_process(&server, "LoadCapture", json!({"filepath": "/tmp/poison.sal"}));
    assert_eq!(resp.error.unwrap().code, StatusCode::DataLoss);
}

#[test]
fn test_capture_id_matcher_scopes_the_fault() {
    let server = server(
        "
version: 1
fixtures:
  captures:
    - capture_id: 1
      status: running
    - capture_id: 2
      status: running
faults:
  - when:
      method: StopCapture
      match: {capture_id: 2}
    respond: {status: ABORTED, message: stuck}
",
    );

    let resp = call_in_process(&server, "StopCapture", json!({"capture_id": 1}));
    assert!(resp.ok);

    let resp = call_in_process(&server, "StopCapture", json!({"capture_id": 2}));
    assert_eq!(resp.error.unwrap().code, StatusCode::Aborted);
}

#[test]
fn test_analyzer_name_matcher_on_add() {
    let server = server(
        "
version: 1
fixtures:
  captures:
    - capture_id: 1
      status: completed
faults:
  - when:
      method: AddAnalyzer
      match: {analyzer_name: I2C}
    respond: {status: FAILED_PRECONDITION, message: unsupported analyzer}
",
    );

    let resp = call_in_process(
        &server,
        "AddAnalyzer",
        json!({"capture_id": 1, "analyzer_name": "SPI", "analyzer_label": ""}),
    );
    assert!(resp.ok);

    let resp = call_in_process(
        &server,
        "AddAnalyzer",
        json!({"capture_id": 1, "analyzer_name": "I2C", "analyzer_label": ""}),
    );
    assert_eq!(resp.error.unwrap().code, StatusCode::FailedPrecondition);
}

#[test]
fn test_fault_rule_leaves_state_untouched() {
    let server = server(
        "
version: 1
faults:
  - when: {method: LoadCapture, nth_call: 1}
    respond: {status: UNAVAILABLE, message: warming up}
",
    );

    let resp = call_in_process(&server, "LoadCapture", json!({"filepath": "/tmp/x.sal"}));
    assert!(!resp.ok);

    // The failed call consumed an ordinal but allocated no capture id.
    let resp = call_in_process(&server, "LoadCapture", json!({"filepath": "/tmp/x.sal"}));
    assert!(resp.ok);
    let capture_id = resp.payload.unwrap()["capture_info"]["capture_id"]
        .as_u64()
        .unwrap();
    assert_eq!(capture_id, 1);
}
