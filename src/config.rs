//! Scenario document loader.
//!
//! Parses the declarative YAML scenario into a configuration tree. Unknown
//! keys fail the load so a misspelled toggle can never silently revert to a
//! default. Enum-valued scalars stay as strings here; the plan compiler
//! resolves them so its errors can name the option set.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Scenario load failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("open scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("decode scenario: {0}")]
    Decode(#[from] serde_yaml::Error),
}

/// Top-level scenario document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub version: i64,
    pub scenario: String,
    pub defaults: DefaultsConfig,
    pub fixtures: FixturesConfig,
    pub behavior: BehaviorConfig,
    pub faults: Vec<FaultRuleConfig>,
}

impl ScenarioConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_slice(bytes)?)
    }

    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub grpc: GrpcDefaultsConfig,
    pub ids: IdsDefaultsConfig,
    pub timing: TimingDefaultsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrpcDefaultsConfig {
    pub status_on_unknown_capture_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdsDefaultsConfig {
    pub capture_id_start: u64,
    pub analyzer_id_start: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingDefaultsConfig {
    pub wait_capture_policy: String,
    pub max_block_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixturesConfig {
    pub appinfo: Option<AppInfoConfig>,
    pub devices: Vec<DeviceConfig>,
    pub captures: Vec<CaptureFixtureConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppInfoConfig {
    pub application_version: String,
    pub api_version: Option<VersionConfig>,
    pub launch_pid: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionConfig {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub device_id: String,
    pub device_type: String,
    pub is_simulation: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureFixtureConfig {
    pub capture_id: u64,
    pub status: String,
    pub origin: String,
    pub started_at: String,
    pub mode: Option<CaptureModeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureModeConfig {
    pub kind: String,
    pub duration_seconds: f64,
}

/// Per-method behavior sections, keyed by wire method name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    #[serde(rename = "GetDevices")]
    pub get_devices: GetDevicesBehaviorConfig,
    #[serde(rename = "StartCapture")]
    pub start_capture: StartCaptureBehaviorConfig,
    #[serde(rename = "LoadCapture")]
    pub load_capture: LoadCaptureBehaviorConfig,
    #[serde(rename = "SaveCapture")]
    pub save_capture: SaveCaptureBehaviorConfig,
    #[serde(rename = "StopCapture")]
    pub stop_capture: StopCaptureBehaviorConfig,
    #[serde(rename = "WaitCapture")]
    pub wait_capture: WaitCaptureBehaviorConfig,
    #[serde(rename = "CloseCapture")]
    pub close_capture: CloseCaptureBehaviorConfig,
    #[serde(rename = "AddAnalyzer")]
    pub add_analyzer: AddAnalyzerBehaviorConfig,
    #[serde(rename = "RemoveAnalyzer")]
    pub remove_analyzer: RemoveAnalyzerBehaviorConfig,
    #[serde(rename = "AddHighLevelAnalyzer")]
    pub add_high_level_analyzer: AddHighLevelAnalyzerBehaviorConfig,
    #[serde(rename = "RemoveHighLevelAnalyzer")]
    pub remove_high_level_analyzer: RemoveHighLevelAnalyzerBehaviorConfig,
    #[serde(rename = "ExportRawDataCsv")]
    pub export_raw_data_csv: ExportRawDataCsvBehaviorConfig,
    #[serde(rename = "ExportRawDataBinary")]
    pub export_raw_data_binary: ExportRawDataBinaryBehaviorConfig,
    #[serde(rename = "ExportDataTableCsv")]
    pub export_data_table_csv: ExportDataTableCsvBehaviorConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GetDevicesBehaviorConfig {
    pub filter_simulation_devices: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartCaptureBehaviorConfig {
    pub validate: StartCaptureValidateConfig,
    pub on_call: OnCallConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartCaptureValidateConfig {
    pub require_device_exists: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OnCallConfig {
    pub create_capture: Option<CaptureCreateConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureCreateConfig {
    pub status: String,
    pub mode: Option<CaptureModeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadCaptureBehaviorConfig {
    pub validate: LoadCaptureValidateConfig,
    pub on_call: OnCallConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadCaptureValidateConfig {
    pub require_non_empty_filepath: Option<bool>,
    pub require_file_exists: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveCaptureBehaviorConfig {
    pub validate: RequireCaptureExistsConfig,
    pub side_effect: SaveCaptureSideEffectConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequireCaptureExistsConfig {
    pub require_capture_exists: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveCaptureSideEffectConfig {
    pub write_placeholder_file: Option<bool>,
    pub placeholder_bytes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StopCaptureBehaviorConfig {
    pub validate: RequireCaptureExistsConfig,
    pub transition: TransitionConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransitionConfig {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitCaptureBehaviorConfig {
    pub validate: WaitCaptureValidateConfig,
    pub completion: WaitCaptureCompletionConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitCaptureValidateConfig {
    pub require_capture_exists: Option<bool>,
    pub error_on_manual_mode: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitCaptureCompletionConfig {
    pub timed_captures_complete_after_duration: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloseCaptureBehaviorConfig {
    pub validate: RequireCaptureExistsConfig,
    pub mode: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddAnalyzerBehaviorConfig {
    pub validate: AddAnalyzerValidateConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddAnalyzerValidateConfig {
    pub require_capture_exists: Option<bool>,
    pub require_analyzer_name_non_empty: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoveAnalyzerBehaviorConfig {
    pub validate: RemoveAnalyzerValidateConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoveAnalyzerValidateConfig {
    pub require_capture_exists: Option<bool>,
    pub require_analyzer_exists: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddHighLevelAnalyzerBehaviorConfig {
    pub validate: AddHighLevelAnalyzerValidateConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddHighLevelAnalyzerValidateConfig {
    pub require_capture_exists: Option<bool>,
    pub require_extension_dir_non_empty: Option<bool>,
    pub require_hla_name_non_empty: Option<bool>,
    pub require_input_analyzer_id_non_zero: Option<bool>,
    pub require_input_analyzer_exists: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoveHighLevelAnalyzerBehaviorConfig {
    pub validate: RemoveAnalyzerValidateConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportRawDataCsvBehaviorConfig {
    pub validate: RequireCaptureExistsConfig,
    pub side_effect: ExportRawCsvSideEffectConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportRawCsvSideEffectConfig {
    pub write_placeholders: Option<ExportRawCsvPlaceholdersConfig>,
    pub include_requested_channels_in_file: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportRawCsvPlaceholdersConfig {
    pub digital_csv: bool,
    pub analog_csv: bool,
    pub filenames: Option<ExportFilenamesConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportFilenamesConfig {
    pub digital: String,
    pub analog: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportRawDataBinaryBehaviorConfig {
    pub validate: RequireCaptureExistsConfig,
    pub side_effect: ExportRawBinarySideEffectConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportRawBinarySideEffectConfig {
    pub write_placeholders: Option<ExportRawBinaryPlaceholdersConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportRawBinaryPlaceholdersConfig {
    pub digital_bin: bool,
    pub analog_bin: bool,
    pub filenames: Option<ExportFilenamesConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportDataTableCsvBehaviorConfig {
    pub validate: RequireCaptureExistsConfig,
    pub side_effect: ExportDataTableSideEffectConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportDataTableSideEffectConfig {
    pub write_placeholder_file: Option<bool>,
    pub include_request_in_file: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultRuleConfig {
    pub when: FaultWhenConfig,
    pub respond: FaultRespondConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultWhenConfig {
    pub method: String,
    pub nth_call: Option<u64>,
    #[serde(rename = "match")]
    pub matcher: Option<FaultMatchConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultMatchConfig {
    pub capture_id: Option<u64>,
    pub filepath: Option<String>,
    pub analyzer_id: Option<u64>,
    pub analyzer_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultRespondConfig {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scenario_parses() {
        let cfg = ScenarioConfig::from_str("version: 1\n").unwrap();
        assert_eq!(cfg.version, 1);
        assert!(cfg.scenario.is_empty());
        assert!(cfg.faults.is_empty());
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let err = ScenarioConfig::from_str("version: 1\nbehaviour: {}\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_unknown_nested_key_is_rejected() {
        let doc = "
version: 1
behavior:
  LoadCapture:
    validate:
      require_nonempty_filepath: true
";
        assert!(ScenarioConfig::from_str(doc).is_err());
    }

    #[test]
    fn test_full_document_parses() {
        let doc = r#"
version: 1
scenario: smoke
defaults:
  grpc:
    status_on_unknown_capture_id: NOT_FOUND
  ids:
    capture_id_start: 1
    analyzer_id_start: 10000
  timing:
    wait_capture_policy: block_until_done
    max_block_ms: 2000
fixtures:
  appinfo:
    application_version: "2.4.22"
    api_version: {major: 1, minor: 0, patch: 0}
    launch_pid: 4242
  devices:
    - device_id: DEV1
      device_type: DEVICE_TYPE_LOGIC_PRO_8
    - device_id: SIM1
      device_type: DEVICE_TYPE_LOGIC_8
      is_simulation: true
  captures:
    - capture_id: 7
      status: running
      origin: started
      started_at: "2025-01-01T00:00:00Z"
      mode: {kind: timed, duration_seconds: 1.0}
behavior:
  WaitCapture:
    validate:
      error_on_manual_mode: true
  ExportDataTableCsv:
    side_effect:
      write_placeholder_file: true
      include_request_in_file: true
faults:
  - when:
      method: SaveCapture
      nth_call: 2
    respond:
      status: PERMISSION_DENIED
      message: blocked
"#;
        let cfg = ScenarioConfig::from_str(doc).unwrap();
        assert_eq!(cfg.scenario, "smoke");
        assert_eq!(cfg.defaults.ids.analyzer_id_start, 10000);
        assert_eq!(cfg.fixtures.devices.len(), 2);
        assert_eq!(cfg.fixtures.captures[0].capture_id, 7);
        assert_eq!(cfg.faults[0].when.nth_call, Some(2));
        assert_eq!(cfg.faults[0].respond.status, "PERMISSION_DENIED");
    }
}
