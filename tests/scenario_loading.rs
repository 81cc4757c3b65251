//! Scenario document loading: unknown-key rejection and documented
//! defaults when optional keys are omitted.

use salad_mock::{compile, ScenarioConfig};
use salad_protocol::StatusCode;

#[test]
fn test_unknown_keys_fail_the_load() {
    let cases = [
        "version: 1\nscenariolabel: x\n",
        "version: 1\ndefaults:\n  grpcs: {}\n",
        "version: 1\ndefaults:\n  ids:\n    capture_start: 5\n",
        "version: 1\nfixtures:\n  devices:\n    - device_id: D\n      devicetype: X\n",
        "version: 1\nbehavior:\n  WaitCapture:\n    validation: {}\n",
        "version: 1\nfaults:\n  - when: {method: SaveCapture, nthcall: 2}\n    respond: {status: INTERNAL, message: x}\n",
    ];
    for doc in cases {
        assert!(
            ScenarioConfig::from_str(doc).is_err(),
            "expected load failure for:\n{doc}"
        );
    }
}

#[test]
fn test_omitted_keys_produce_documented_defaults() {
    let plan = compile(ScenarioConfig::from_str("version: 1\n").unwrap()).unwrap();

    assert_eq!(
        plan.defaults.status_on_unknown_capture_id,
        StatusCode::InvalidArgument
    );
    assert_eq!(plan.defaults.capture_id_start, 1);
    assert_eq!(plan.defaults.analyzer_id_start, 1);
    assert_eq!(plan.defaults.wait_capture_max_block, chrono::Duration::zero());

    assert!(plan.behavior.get_devices.filter_simulation_devices);
    assert!(plan.behavior.start_capture.require_device_exists);
    assert!(plan.behavior.load_capture.require_non_empty_filepath);
    assert!(!plan.behavior.load_capture.require_file_exists);
    assert!(plan.behavior.save_capture.require_capture_exists);
    assert!(!plan.behavior.save_capture.write_placeholder_file);
    assert_eq!(plan.behavior.save_capture.placeholder_bytes, b"SALAD_MOCK_SAL_V1\n");
    assert!(plan.behavior.stop_capture.require_capture_exists);
    assert!(plan.behavior.wait_capture.require_capture_exists);
    assert!(plan.behavior.wait_capture.error_on_manual_mode);
    assert!(plan.behavior.wait_capture.timed_captures_complete_after_duration);
    assert!(plan.behavior.close_capture.require_capture_exists);
    assert!(plan.behavior.add_analyzer.require_capture_exists);
    assert!(plan.behavior.add_analyzer.require_analyzer_name_non_empty);
    assert!(plan.behavior.remove_analyzer.require_analyzer_exists);
    assert!(plan.behavior.add_high_level_analyzer.require_input_analyzer_exists);
    assert!(plan.behavior.remove_high_level_analyzer.require_analyzer_exists);
    assert!(plan.behavior.export_raw_data_csv.require_capture_exists);
    assert_eq!(plan.behavior.export_raw_data_csv.digital_filename, "digital.csv");
    assert_eq!(plan.behavior.export_raw_data_csv.analog_filename, "analog.csv");
    assert_eq!(plan.behavior.export_raw_data_binary.digital_filename, "digital.bin");
    assert_eq!(plan.behavior.export_raw_data_binary.analog_filename, "analog.bin");
    assert!(!plan.behavior.export_data_table_csv.write_placeholder_file);

    assert!(plan.faults.is_empty());
    assert!(!plan.needs_file_side_effects());
}

#[test]
fn test_bundled_smoke_scenario_compiles() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/smoke.yaml");
    let cfg = ScenarioConfig::load(&path).unwrap();
    let plan = compile(cfg).unwrap();

    assert_eq!(plan.scenario, "smoke");
    assert_eq!(plan.defaults.status_on_unknown_capture_id, StatusCode::NotFound);
    assert_eq!(plan.defaults.analyzer_id_start, 10000);
    assert_eq!(plan.fixtures.devices.len(), 2);
    assert_eq!(plan.fixtures.captures.len(), 1);
    assert_eq!(plan.faults.len(), 1);
    assert!(plan.needs_file_side_effects());
}

#[test]
fn test_version_zero_is_normalized_and_others_fail() {
    assert_eq!(
        compile(ScenarioConfig::from_str("version: 0\n").unwrap())
            .unwrap()
            .version,
        1
    );
    assert!(compile(ScenarioConfig::from_str("version: 3\n").unwrap()).is_err());
}

#[test]
fn test_compile_error_names_the_bad_value() {
    let doc = "
version: 1
fixtures:
  captures:
    - capture_id: 12
      started_at: not-a-timestamp
";
    let err = compile(ScenarioConfig::from_str(doc).unwrap()).unwrap_err();
    assert!(err.to_string().contains("capture 12"));

    let doc = "
version: 1
defaults:
  grpc:
    status_on_unknown_capture_id: IM_A_TEAPOT
";
    let err = compile(ScenarioConfig::from_str(doc).unwrap()).unwrap_err();
    assert!(err.to_string().contains("IM_A_TEAPOT"));
}
