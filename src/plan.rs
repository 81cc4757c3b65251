//! Plan compiler.
//!
//! Turns a loose, validating scenario configuration into an immutable,
//! fully-typed execution plan: defaults resolved, enum strings translated
//! into variants, fixtures materialized, fault rules compiled into typed
//! matchers. Compilation either yields a complete plan or a structured
//! error naming the offending value; no partial plan ever escapes.

use chrono::{DateTime, Duration, Utc};
use salad_protocol::messages::{AppInfo, Device, DeviceType, Version};
use salad_protocol::{Method, StatusCode};
use thiserror::Error;

use crate::config::{
    AppInfoConfig, BehaviorConfig, CaptureCreateConfig, CaptureModeConfig, FaultMatchConfig,
    FaultRuleConfig, FixturesConfig, ScenarioConfig,
};
use crate::fault::{FaultRule, RequestMatcher};
use crate::state::{CaptureMode, CaptureOrigin, CaptureStatus};

/// Sentinel payload written by SaveCapture when no override is configured.
pub const SAVE_CAPTURE_PLACEHOLDER: &[u8] = b"SALAD_MOCK_SAL_V1\n";

/// Compilation failure. The server never starts on any of these.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unsupported scenario version {0}")]
    UnsupportedVersion(i64),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("unknown capture status {0:?} (running|stopped|completed|closed)")]
    UnknownCaptureStatus(String),
    #[error("unknown capture origin {0:?} (loaded|started)")]
    UnknownCaptureOrigin(String),
    #[error("unknown capture mode kind {0:?} (timed|manual|trigger)")]
    UnknownCaptureModeKind(String),
    #[error("unknown wait_capture_policy {0:?} (immediate|error_if_running|block_until_done)")]
    UnknownWaitPolicy(String),
    #[error("unknown close_capture mode {0:?} (delete|mark_closed)")]
    UnknownCloseMode(String),
    #[error(transparent)]
    UnknownStatusCode(#[from] salad_protocol::status::ParseStatusCodeError),
    #[error(transparent)]
    UnknownMethod(#[from] salad_protocol::method::ParseMethodError),
    #[error(transparent)]
    UnknownDeviceType(#[from] salad_protocol::messages::ParseDeviceTypeError),
    #[error("parse fixtures.captures.started_at for capture {capture_id}: {source}")]
    BadTimestamp {
        capture_id: u64,
        source: chrono::ParseError,
    },
    #[error("behavior.StopCapture.transition requires both from and to")]
    PartialTransition,
    #[error("faults.when.match supports at most one field")]
    AmbiguousMatch,
    #[error("fault matcher field {field:?} is not supported for {method}")]
    UnsupportedMatchField {
        method: Method,
        field: &'static str,
    },
}

/// Immutable execution plan. Built once, shared read-only by every handler.
#[derive(Debug, Clone)]
pub struct Plan {
    pub version: i64,
    pub scenario: String,
    pub defaults: DefaultsPlan,
    pub fixtures: FixturesPlan,
    pub behavior: BehaviorPlan,
    pub faults: Vec<FaultRule>,
}

impl Plan {
    /// True when any behavior section asks for real files on disk.
    pub fn needs_file_side_effects(&self) -> bool {
        self.behavior.save_capture.write_placeholder_file
            || self.behavior.export_raw_data_csv.write_digital_csv
            || self.behavior.export_raw_data_csv.write_analog_csv
            || self.behavior.export_raw_data_binary.write_digital_bin
            || self.behavior.export_raw_data_binary.write_analog_bin
            || self.behavior.export_data_table_csv.write_placeholder_file
    }
}

#[derive(Debug, Clone)]
pub struct DefaultsPlan {
    pub status_on_unknown_capture_id: StatusCode,
    pub capture_id_start: u64,
    pub analyzer_id_start: u64,
    pub wait_capture_policy: WaitCapturePolicy,
    pub wait_capture_max_block: Duration,
}

#[derive(Debug, Clone)]
pub struct FixturesPlan {
    pub app_info: Option<AppInfo>,
    pub devices: Vec<Device>,
    pub captures: Vec<CapturePlan>,
}

#[derive(Debug, Clone)]
pub struct CapturePlan {
    pub id: u64,
    pub status: CaptureStatus,
    pub origin: CaptureOrigin,
    pub started_at: Option<DateTime<Utc>>,
    pub mode: CaptureMode,
}

/// Template for captures created by Start/LoadCapture.
#[derive(Debug, Clone, Copy)]
pub struct CaptureCreatePlan {
    pub status: CaptureStatus,
    pub mode: CaptureMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCapturePolicy {
    Immediate,
    ErrorIfRunning,
    BlockUntilDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCaptureMode {
    Delete,
    MarkClosed,
}

#[derive(Debug, Clone)]
pub struct BehaviorPlan {
    pub get_devices: GetDevicesPlan,
    pub start_capture: StartCapturePlan,
    pub load_capture: LoadCapturePlan,
    pub save_capture: SaveCapturePlan,
    pub stop_capture: StopCapturePlan,
    pub wait_capture: WaitCapturePlan,
    pub close_capture: CloseCapturePlan,
    pub add_analyzer: AddAnalyzerPlan,
    pub remove_analyzer: RemoveAnalyzerPlan,
    pub add_high_level_analyzer: AddHighLevelAnalyzerPlan,
    pub remove_high_level_analyzer: RemoveAnalyzerPlan,
    pub export_raw_data_csv: ExportRawDataCsvPlan,
    pub export_raw_data_binary: ExportRawDataBinaryPlan,
    pub export_data_table_csv: ExportDataTableCsvPlan,
}

#[derive(Debug, Clone)]
pub struct GetDevicesPlan {
    pub filter_simulation_devices: bool,
}

#[derive(Debug, Clone)]
pub struct StartCapturePlan {
    pub require_device_exists: bool,
    pub create_capture: CaptureCreatePlan,
}

#[derive(Debug, Clone)]
pub struct LoadCapturePlan {
    pub require_non_empty_filepath: bool,
    pub require_file_exists: bool,
    pub create_capture: CaptureCreatePlan,
}

#[derive(Debug, Clone)]
pub struct SaveCapturePlan {
    pub require_capture_exists: bool,
    pub write_placeholder_file: bool,
    pub placeholder_bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StopCapturePlan {
    pub require_capture_exists: bool,
    pub transition_from: CaptureStatus,
    pub transition_to: CaptureStatus,
}

#[derive(Debug, Clone)]
pub struct WaitCapturePlan {
    pub require_capture_exists: bool,
    pub error_on_manual_mode: bool,
    pub timed_captures_complete_after_duration: bool,
    pub policy: WaitCapturePolicy,
    pub max_block: Duration,
}

#[derive(Debug, Clone)]
pub struct CloseCapturePlan {
    pub require_capture_exists: bool,
    pub mode: CloseCaptureMode,
}

#[derive(Debug, Clone)]
pub struct AddAnalyzerPlan {
    pub require_capture_exists: bool,
    pub require_analyzer_name_non_empty: bool,
}

#[derive(Debug, Clone)]
pub struct RemoveAnalyzerPlan {
    pub require_capture_exists: bool,
    pub require_analyzer_exists: bool,
}

#[derive(Debug, Clone)]
pub struct AddHighLevelAnalyzerPlan {
    pub require_capture_exists: bool,
    pub require_extension_dir_non_empty: bool,
    pub require_hla_name_non_empty: bool,
    pub require_input_analyzer_id_non_zero: bool,
    pub require_input_analyzer_exists: bool,
}

#[derive(Debug, Clone)]
pub struct ExportRawDataCsvPlan {
    pub require_capture_exists: bool,
    pub write_digital_csv: bool,
    pub write_analog_csv: bool,
    pub digital_filename: String,
    pub analog_filename: String,
    pub include_requested_channels_in_file: bool,
}

#[derive(Debug, Clone)]
pub struct ExportRawDataBinaryPlan {
    pub require_capture_exists: bool,
    pub write_digital_bin: bool,
    pub write_analog_bin: bool,
    pub digital_filename: String,
    pub analog_filename: String,
}

#[derive(Debug, Clone)]
pub struct ExportDataTableCsvPlan {
    pub require_capture_exists: bool,
    pub write_placeholder_file: bool,
    pub include_request_in_file: bool,
}

/// Compile a scenario into a plan.
pub fn compile(mut cfg: ScenarioConfig) -> Result<Plan, PlanError> {
    if cfg.version == 0 {
        cfg.version = 1;
    }
    if cfg.version != 1 {
        return Err(PlanError::UnsupportedVersion(cfg.version));
    }

    let mut defaults = DefaultsPlan {
        status_on_unknown_capture_id: StatusCode::InvalidArgument,
        capture_id_start: 1,
        analyzer_id_start: 1,
        wait_capture_policy: WaitCapturePolicy::Immediate,
        wait_capture_max_block: Duration::zero(),
    };

    if !cfg.defaults.grpc.status_on_unknown_capture_id.is_empty() {
        defaults.status_on_unknown_capture_id =
            cfg.defaults.grpc.status_on_unknown_capture_id.parse()?;
    }
    if cfg.defaults.ids.capture_id_start != 0 {
        defaults.capture_id_start = cfg.defaults.ids.capture_id_start;
    }
    if cfg.defaults.ids.analyzer_id_start != 0 {
        defaults.analyzer_id_start = cfg.defaults.ids.analyzer_id_start;
    }
    if !cfg.defaults.timing.wait_capture_policy.is_empty() {
        defaults.wait_capture_policy = parse_wait_policy(&cfg.defaults.timing.wait_capture_policy)?;
    }
    if cfg.defaults.timing.max_block_ms > 0 {
        defaults.wait_capture_max_block = Duration::milliseconds(cfg.defaults.timing.max_block_ms as i64);
    }

    let fixtures = compile_fixtures(&cfg.fixtures)?;
    let behavior = compile_behavior(&cfg.behavior, &defaults)?;
    let faults = compile_faults(&cfg.faults)?;

    Ok(Plan {
        version: cfg.version,
        scenario: cfg.scenario,
        defaults,
        fixtures,
        behavior,
        faults,
    })
}

fn compile_fixtures(cfg: &FixturesConfig) -> Result<FixturesPlan, PlanError> {
    let app_info = cfg.appinfo.as_ref().map(compile_app_info);

    let mut devices = Vec::with_capacity(cfg.devices.len());
    for device in &cfg.devices {
        if device.device_id.is_empty() {
            return Err(PlanError::MissingField("fixtures.devices.device_id"));
        }
        if device.device_type.is_empty() {
            return Err(PlanError::MissingField("fixtures.devices.device_type"));
        }
        devices.push(Device {
            device_id: device.device_id.clone(),
            device_type: device.device_type.parse::<DeviceType>()?,
            is_simulation: device.is_simulation,
        });
    }

    let mut captures = Vec::with_capacity(cfg.captures.len());
    for capture in &cfg.captures {
        if capture.capture_id == 0 {
            return Err(PlanError::MissingField("fixtures.captures.capture_id"));
        }
        let started_at = if capture.started_at.is_empty() {
            None
        } else {
            Some(
                DateTime::parse_from_rfc3339(&capture.started_at)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|source| PlanError::BadTimestamp {
                        capture_id: capture.capture_id,
                        source,
                    })?,
            )
        };
        captures.push(CapturePlan {
            id: capture.capture_id,
            status: parse_capture_status(&capture.status)?,
            origin: parse_capture_origin(&capture.origin)?,
            started_at,
            mode: parse_capture_mode(capture.mode.as_ref())?,
        });
    }

    Ok(FixturesPlan {
        app_info,
        devices,
        captures,
    })
}

fn compile_app_info(cfg: &AppInfoConfig) -> AppInfo {
    let api_version = match &cfg.api_version {
        Some(v) => Version {
            major: v.major,
            minor: v.minor,
            patch: v.patch,
        },
        None => Version {
            major: 1,
            minor: 0,
            patch: 0,
        },
    };
    let application_version = if cfg.application_version.is_empty() {
        "mock".to_string()
    } else {
        cfg.application_version.clone()
    };
    let launch_pid = if cfg.launch_pid == 0 {
        u64::from(std::process::id())
    } else {
        cfg.launch_pid
    };
    AppInfo {
        api_version,
        application_version,
        launch_pid,
    }
}

fn compile_behavior(cfg: &BehaviorConfig, defaults: &DefaultsPlan) -> Result<BehaviorPlan, PlanError> {
    let start_create = compile_create_capture(
        cfg.start_capture.on_call.create_capture.as_ref(),
        CaptureMode::manual(),
    )?;
    let load_create = compile_create_capture(
        cfg.load_capture.on_call.create_capture.as_ref(),
        CaptureMode::timed(Duration::zero()),
    )?;

    let mut stop_from = CaptureStatus::Running;
    let mut stop_to = CaptureStatus::Stopped;
    let transition = &cfg.stop_capture.transition;
    if !transition.from.is_empty() || !transition.to.is_empty() {
        if transition.from.is_empty() || transition.to.is_empty() {
            return Err(PlanError::PartialTransition);
        }
        stop_from = parse_capture_status(&transition.from)?;
        stop_to = parse_capture_status(&transition.to)?;
    }

    let close_mode = if cfg.close_capture.mode.is_empty() {
        CloseCaptureMode::Delete
    } else {
        parse_close_mode(&cfg.close_capture.mode)?
    };

    let mut export_csv = ExportRawDataCsvPlan {
        require_capture_exists: pick(cfg.export_raw_data_csv.validate.require_capture_exists, true),
        write_digital_csv: false,
        write_analog_csv: false,
        digital_filename: "digital.csv".to_string(),
        analog_filename: "analog.csv".to_string(),
        include_requested_channels_in_file: pick(
            cfg.export_raw_data_csv
                .side_effect
                .include_requested_channels_in_file,
            false,
        ),
    };
    if let Some(placeholders) = &cfg.export_raw_data_csv.side_effect.write_placeholders {
        export_csv.write_digital_csv = placeholders.digital_csv;
        export_csv.write_analog_csv = placeholders.analog_csv;
        if let Some(filenames) = &placeholders.filenames {
            if !filenames.digital.is_empty() {
                export_csv.digital_filename = filenames.digital.clone();
            }
            if !filenames.analog.is_empty() {
                export_csv.analog_filename = filenames.analog.clone();
            }
        }
    }

    let mut export_bin = ExportRawDataBinaryPlan {
        require_capture_exists: pick(
            cfg.export_raw_data_binary.validate.require_capture_exists,
            true,
        ),
        write_digital_bin: false,
        write_analog_bin: false,
        digital_filename: "digital.bin".to_string(),
        analog_filename: "analog.bin".to_string(),
    };
    if let Some(placeholders) = &cfg.export_raw_data_binary.side_effect.write_placeholders {
        export_bin.write_digital_bin = placeholders.digital_bin;
        export_bin.write_analog_bin = placeholders.analog_bin;
        if let Some(filenames) = &placeholders.filenames {
            if !filenames.digital.is_empty() {
                export_bin.digital_filename = filenames.digital.clone();
            }
            if !filenames.analog.is_empty() {
                export_bin.analog_filename = filenames.analog.clone();
            }
        }
    }

    let placeholder_bytes = if cfg.save_capture.side_effect.placeholder_bytes.is_empty() {
        SAVE_CAPTURE_PLACEHOLDER.to_vec()
    } else {
        cfg.save_capture.side_effect.placeholder_bytes.clone().into_bytes()
    };

    Ok(BehaviorPlan {
        get_devices: GetDevicesPlan {
            filter_simulation_devices: pick(cfg.get_devices.filter_simulation_devices, true),
        },
        start_capture: StartCapturePlan {
            require_device_exists: pick(cfg.start_capture.validate.require_device_exists, true),
            create_capture: start_create,
        },
        load_capture: LoadCapturePlan {
            require_non_empty_filepath: pick(
                cfg.load_capture.validate.require_non_empty_filepath,
                true,
            ),
            require_file_exists: pick(cfg.load_capture.validate.require_file_exists, false),
            create_capture: load_create,
        },
        save_capture: SaveCapturePlan {
            require_capture_exists: pick(cfg.save_capture.validate.require_capture_exists, true),
            write_placeholder_file: pick(cfg.save_capture.side_effect.write_placeholder_file, false),
            placeholder_bytes,
        },
        stop_capture: StopCapturePlan {
            require_capture_exists: pick(cfg.stop_capture.validate.require_capture_exists, true),
            transition_from: stop_from,
            transition_to: stop_to,
        },
        wait_capture: WaitCapturePlan {
            require_capture_exists: pick(cfg.wait_capture.validate.require_capture_exists, true),
            error_on_manual_mode: pick(cfg.wait_capture.validate.error_on_manual_mode, true),
            timed_captures_complete_after_duration: pick(
                cfg.wait_capture
                    .completion
                    .timed_captures_complete_after_duration,
                true,
            ),
            policy: defaults.wait_capture_policy,
            max_block: defaults.wait_capture_max_block,
        },
        close_capture: CloseCapturePlan {
            require_capture_exists: pick(cfg.close_capture.validate.require_capture_exists, true),
            mode: close_mode,
        },
        add_analyzer: AddAnalyzerPlan {
            require_capture_exists: pick(cfg.add_analyzer.validate.require_capture_exists, true),
            require_analyzer_name_non_empty: pick(
                cfg.add_analyzer.validate.require_analyzer_name_non_empty,
                true,
            ),
        },
        remove_analyzer: RemoveAnalyzerPlan {
            require_capture_exists: pick(cfg.remove_analyzer.validate.require_capture_exists, true),
            require_analyzer_exists: pick(
                cfg.remove_analyzer.validate.require_analyzer_exists,
                true,
            ),
        },
        add_high_level_analyzer: AddHighLevelAnalyzerPlan {
            require_capture_exists: pick(
                cfg.add_high_level_analyzer.validate.require_capture_exists,
                true,
            ),
            require_extension_dir_non_empty: pick(
                cfg.add_high_level_analyzer
                    .validate
                    .require_extension_dir_non_empty,
                true,
            ),
            require_hla_name_non_empty: pick(
                cfg.add_high_level_analyzer.validate.require_hla_name_non_empty,
                true,
            ),
            require_input_analyzer_id_non_zero: pick(
                cfg.add_high_level_analyzer
                    .validate
                    .require_input_analyzer_id_non_zero,
                true,
            ),
            require_input_analyzer_exists: pick(
                cfg.add_high_level_analyzer
                    .validate
                    .require_input_analyzer_exists,
                true,
            ),
        },
        remove_high_level_analyzer: RemoveAnalyzerPlan {
            require_capture_exists: pick(
                cfg.remove_high_level_analyzer.validate.require_capture_exists,
                true,
            ),
            require_analyzer_exists: pick(
                cfg.remove_high_level_analyzer.validate.require_analyzer_exists,
                true,
            ),
        },
        export_raw_data_csv: export_csv,
        export_raw_data_binary: export_bin,
        export_data_table_csv: ExportDataTableCsvPlan {
            require_capture_exists: pick(
                cfg.export_data_table_csv.validate.require_capture_exists,
                true,
            ),
            write_placeholder_file: pick(
                cfg.export_data_table_csv.side_effect.write_placeholder_file,
                false,
            ),
            include_request_in_file: pick(
                cfg.export_data_table_csv.side_effect.include_request_in_file,
                false,
            ),
        },
    })
}

fn compile_create_capture(
    cfg: Option<&CaptureCreateConfig>,
    default_mode: CaptureMode,
) -> Result<CaptureCreatePlan, PlanError> {
    let mut plan = CaptureCreatePlan {
        status: CaptureStatus::Completed,
        mode: default_mode,
    };
    if let Some(create) = cfg {
        plan.status = parse_capture_status(&create.status)?;
        if create.mode.is_some() {
            plan.mode = parse_capture_mode(create.mode.as_ref())?;
        }
    }
    Ok(plan)
}

fn compile_faults(cfg: &[FaultRuleConfig]) -> Result<Vec<FaultRule>, PlanError> {
    let mut faults = Vec::with_capacity(cfg.len());
    for fault in cfg {
        if fault.when.method.is_empty() {
            return Err(PlanError::MissingField("faults.when.method"));
        }
        let method: Method = fault.when.method.parse()?;
        if fault.respond.status.is_empty() {
            return Err(PlanError::MissingField("faults.respond.status"));
        }
        let code: StatusCode = fault.respond.status.parse()?;
        if fault.respond.message.is_empty() {
            return Err(PlanError::MissingField("faults.respond.message"));
        }
        let matcher = match &fault.when.matcher {
            Some(matcher) => compile_matcher(method, matcher)?,
            None => None,
        };
        faults.push(FaultRule {
            method,
            nth_call: fault.when.nth_call,
            matcher,
            code,
            message: fault.respond.message.clone(),
        });
    }
    Ok(faults)
}

fn compile_matcher(
    method: Method,
    cfg: &FaultMatchConfig,
) -> Result<Option<RequestMatcher>, PlanError> {
    let mut candidates: Vec<(&'static str, RequestMatcher)> = Vec::new();
    if let Some(filepath) = &cfg.filepath {
        candidates.push(("filepath", RequestMatcher::Filepath(filepath.clone())));
    }
    if let Some(capture_id) = cfg.capture_id {
        candidates.push(("capture_id", RequestMatcher::CaptureId(capture_id)));
    }
    if let Some(analyzer_id) = cfg.analyzer_id {
        candidates.push(("analyzer_id", RequestMatcher::AnalyzerId(analyzer_id)));
    }
    if let Some(analyzer_name) = &cfg.analyzer_name {
        candidates.push((
            "analyzer_name",
            RequestMatcher::AnalyzerName(analyzer_name.clone()),
        ));
    }

    match candidates.len() {
        0 => Ok(None),
        1 => {
            let (field, matcher) = candidates.remove(0);
            if !matcher.supports(method) {
                return Err(PlanError::UnsupportedMatchField { method, field });
            }
            Ok(Some(matcher))
        }
        _ => Err(PlanError::AmbiguousMatch),
    }
}

/// Convert a fractional seconds value into a duration, truncating to
/// millisecond resolution.
pub fn duration_from_seconds(seconds: f64) -> Duration {
    Duration::milliseconds((seconds * 1000.0) as i64)
}

fn parse_capture_status(status: &str) -> Result<CaptureStatus, PlanError> {
    match status.trim().to_lowercase().as_str() {
        "" | "completed" => Ok(CaptureStatus::Completed),
        "running" => Ok(CaptureStatus::Running),
        "stopped" => Ok(CaptureStatus::Stopped),
        "closed" => Ok(CaptureStatus::Closed),
        _ => Err(PlanError::UnknownCaptureStatus(status.to_string())),
    }
}

fn parse_capture_origin(origin: &str) -> Result<CaptureOrigin, PlanError> {
    match origin.trim().to_lowercase().as_str() {
        "" | "loaded" => Ok(CaptureOrigin::Loaded),
        "started" => Ok(CaptureOrigin::Started),
        _ => Err(PlanError::UnknownCaptureOrigin(origin.to_string())),
    }
}

fn parse_capture_mode(mode: Option<&CaptureModeConfig>) -> Result<CaptureMode, PlanError> {
    let Some(mode) = mode else {
        return Ok(CaptureMode::timed(Duration::zero()));
    };
    match mode.kind.trim().to_lowercase().as_str() {
        "" | "timed" => Ok(CaptureMode::timed(duration_from_seconds(
            mode.duration_seconds,
        ))),
        "manual" => Ok(CaptureMode::manual()),
        "trigger" | "digital_trigger" => Ok(CaptureMode::trigger()),
        _ => Err(PlanError::UnknownCaptureModeKind(mode.kind.clone())),
    }
}

fn parse_wait_policy(policy: &str) -> Result<WaitCapturePolicy, PlanError> {
    match policy.trim().to_lowercase().as_str() {
        "" | "immediate" => Ok(WaitCapturePolicy::Immediate),
        "error_if_running" => Ok(WaitCapturePolicy::ErrorIfRunning),
        "block_until_done" => Ok(WaitCapturePolicy::BlockUntilDone),
        _ => Err(PlanError::UnknownWaitPolicy(policy.to_string())),
    }
}

fn parse_close_mode(mode: &str) -> Result<CloseCaptureMode, PlanError> {
    match mode.trim().to_lowercase().as_str() {
        "" | "delete" => Ok(CloseCaptureMode::Delete),
        "mark_closed" => Ok(CloseCaptureMode::MarkClosed),
        _ => Err(PlanError::UnknownCloseMode(mode.to_string())),
    }
}

fn pick(value: Option<bool>, fallback: bool) -> bool {
    value.unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::state::CaptureModeKind;

    fn compile_yaml(doc: &str) -> Result<Plan, PlanError> {
        compile(ScenarioConfig::from_str(doc).unwrap())
    }

    #[test]
    fn test_version_zero_normalizes_to_one() {
        let plan = compile_yaml("scenario: v0\n").unwrap();
        assert_eq!(plan.version, 1);
        assert_eq!(plan.scenario, "v0");
    }

    #[test]
    fn test_unsupported_version_fails() {
        let err = compile_yaml("version: 2\n").unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_documented_defaults() {
        let plan = compile_yaml("version: 1\n").unwrap();
        assert_eq!(
            plan.defaults.status_on_unknown_capture_id,
            StatusCode::InvalidArgument
        );
        assert_eq!(plan.defaults.capture_id_start, 1);
        assert_eq!(plan.defaults.wait_capture_policy, WaitCapturePolicy::Immediate);
        assert!(plan.behavior.get_devices.filter_simulation_devices);
        assert!(plan.behavior.load_capture.require_non_empty_filepath);
        assert!(!plan.behavior.load_capture.require_file_exists);
        assert!(plan.behavior.save_capture.require_capture_exists);
        assert_eq!(
            plan.behavior.save_capture.placeholder_bytes,
            SAVE_CAPTURE_PLACEHOLDER
        );
        assert_eq!(plan.behavior.export_raw_data_csv.digital_filename, "digital.csv");
        assert_eq!(plan.behavior.export_raw_data_csv.analog_filename, "analog.csv");
        assert_eq!(plan.behavior.export_raw_data_binary.digital_filename, "digital.bin");
        assert_eq!(plan.behavior.close_capture.mode, CloseCaptureMode::Delete);
        assert_eq!(plan.behavior.stop_capture.transition_from, CaptureStatus::Running);
        assert_eq!(plan.behavior.stop_capture.transition_to, CaptureStatus::Stopped);
        assert!(plan.behavior.wait_capture.error_on_manual_mode);
        assert!(plan.behavior.add_high_level_analyzer.require_input_analyzer_exists);
        assert!(!plan.needs_file_side_effects());
    }

    #[test]
    fn test_load_capture_default_creates_completed_timed_zero() {
        let plan = compile_yaml("version: 1\n").unwrap();
        let create = plan.behavior.load_capture.create_capture;
        assert_eq!(create.status, CaptureStatus::Completed);
        assert_eq!(create.mode.kind, CaptureModeKind::Timed);
        assert_eq!(create.mode.duration, Duration::zero());
    }

    #[test]
    fn test_unknown_enum_tokens_fail() {
        assert!(matches!(
            compile_yaml("version: 1\nfixtures:\n  captures:\n    - {capture_id: 1, status: busy}\n"),
            Err(PlanError::UnknownCaptureStatus(_))
        ));
        assert!(matches!(
            compile_yaml("version: 1\ndefaults:\n  timing:\n    wait_capture_policy: spin\n"),
            Err(PlanError::UnknownWaitPolicy(_))
        ));
        assert!(matches!(
            compile_yaml("version: 1\ndefaults:\n  grpc:\n    status_on_unknown_capture_id: TEAPOT\n"),
            Err(PlanError::UnknownStatusCode(_))
        ));
        assert!(matches!(
            compile_yaml(
                "version: 1\nfixtures:\n  devices:\n    - {device_id: D, device_type: LOGIC_9000}\n"
            ),
            Err(PlanError::UnknownDeviceType(_))
        ));
    }

    #[test]
    fn test_malformed_timestamp_names_capture() {
        let err = compile_yaml(
            "version: 1\nfixtures:\n  captures:\n    - {capture_id: 3, started_at: yesterday}\n",
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("capture 3"), "got: {message}");
    }

    #[test]
    fn test_fault_rule_requires_method_status_message() {
        let missing_method = "version: 1\nfaults:\n  - respond: {status: INTERNAL, message: x}\n";
        assert!(matches!(
            compile_yaml(missing_method),
            Err(PlanError::MissingField("faults.when.method"))
        ));

        let missing_status = "version: 1\nfaults:\n  - when: {method: SaveCapture}\n    respond: {message: x}\n";
        assert!(matches!(
            compile_yaml(missing_status),
            Err(PlanError::MissingField("faults.respond.status"))
        ));

        let missing_message =
            "version: 1\nfaults:\n  - when: {method: SaveCapture}\n    respond: {status: INTERNAL}\n";
        assert!(matches!(
            compile_yaml(missing_message),
            Err(PlanError::MissingField("faults.respond.message"))
        ));
    }

    #[test]
    fn test_fault_matcher_field_must_fit_method() {
        let doc = "
version: 1
faults:
  - when:
      method: GetAppInfo
      match: {capture_id: 1}
    respond: {status: INTERNAL, message: x}
";
        assert!(matches!(
            compile_yaml(doc),
            Err(PlanError::UnsupportedMatchField { .. })
        ));

        let doc = "
version: 1
faults:
  - when:
      method: LoadCapture
      match: {filepath: /tmp/x.sal}
    respond: {status: INTERNAL, message: x}
";
        let plan = compile_yaml(doc).unwrap();
        assert!(plan.faults[0].matcher.is_some());
    }

    #[test]
    fn test_fault_matcher_rejects_multiple_fields() {
        let doc = "
version: 1
faults:
  - when:
      method: SaveCapture
      match: {capture_id: 1, filepath: /tmp/x.sal}
    respond: {status: INTERNAL, message: x}
";
        assert!(matches!(compile_yaml(doc), Err(PlanError::AmbiguousMatch)));
    }

    #[test]
    fn test_partial_stop_transition_fails() {
        let doc = "
version: 1
behavior:
  StopCapture:
    transition: {from: running}
";
        assert!(matches!(compile_yaml(doc), Err(PlanError::PartialTransition)));
    }

    #[test]
    fn test_placeholder_flags_enable_file_side_effects() {
        let doc = "
version: 1
behavior:
  SaveCapture:
    side_effect: {write_placeholder_file: true}
";
        assert!(compile_yaml(doc).unwrap().needs_file_side_effects());

        let doc = "
version: 1
behavior:
  ExportRawDataCsv:
    side_effect:
      write_placeholders: {digital_csv: true}
";
        assert!(compile_yaml(doc).unwrap().needs_file_side_effects());
    }

    #[test]
    fn test_duration_from_seconds_truncates_to_millis() {
        assert_eq!(duration_from_seconds(1.5), Duration::milliseconds(1500));
        assert_eq!(duration_from_seconds(0.0), Duration::zero());
        assert_eq!(duration_from_seconds(0.0001), Duration::zero());
    }
}
