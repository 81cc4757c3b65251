//! Typed request/reply messages for the automation surface.
//!
//! Field names and enum vocabularies mirror the Saleae Logic 2 Automation
//! schema. Absent payload fields decode to their proto-style defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::method::Method;

/// Semver-like API version triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Application identity returned by GetAppInfo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub api_version: Version,
    pub application_version: String,
    pub launch_pid: u64,
}

/// Known device hardware types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    #[default]
    #[serde(rename = "DEVICE_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "DEVICE_TYPE_LOGIC")]
    Logic,
    #[serde(rename = "DEVICE_TYPE_LOGIC_4")]
    Logic4,
    #[serde(rename = "DEVICE_TYPE_LOGIC_8")]
    Logic8,
    #[serde(rename = "DEVICE_TYPE_LOGIC_16")]
    Logic16,
    #[serde(rename = "DEVICE_TYPE_LOGIC_PRO_8")]
    LogicPro8,
    #[serde(rename = "DEVICE_TYPE_LOGIC_PRO_16")]
    LogicPro16,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "DEVICE_TYPE_UNSPECIFIED",
            Self::Logic => "DEVICE_TYPE_LOGIC",
            Self::Logic4 => "DEVICE_TYPE_LOGIC_4",
            Self::Logic8 => "DEVICE_TYPE_LOGIC_8",
            Self::Logic16 => "DEVICE_TYPE_LOGIC_16",
            Self::LogicPro8 => "DEVICE_TYPE_LOGIC_PRO_8",
            Self::LogicPro16 => "DEVICE_TYPE_LOGIC_PRO_16",
        }
    }
}

/// Parse error for device-type names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device type {0:?}")]
pub struct ParseDeviceTypeError(pub String);

impl FromStr for DeviceType {
    type Err = ParseDeviceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "DEVICE_TYPE_UNSPECIFIED" => Ok(Self::Unspecified),
            "DEVICE_TYPE_LOGIC" => Ok(Self::Logic),
            "DEVICE_TYPE_LOGIC_4" => Ok(Self::Logic4),
            "DEVICE_TYPE_LOGIC_8" => Ok(Self::Logic8),
            "DEVICE_TYPE_LOGIC_16" => Ok(Self::Logic16),
            "DEVICE_TYPE_LOGIC_PRO_8" => Ok(Self::LogicPro8),
            "DEVICE_TYPE_LOGIC_PRO_16" => Ok(Self::LogicPro16),
            other => Err(ParseDeviceTypeError(other.to_string())),
        }
    }
}

/// A connected (or simulated) device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub device_id: String,
    pub device_type: DeviceType,
    pub is_simulation: bool,
}

/// Handle to a capture, returned by Start/LoadCapture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureInfo {
    pub capture_id: u64,
}

/// Radix used when rendering analyzer frames in data-table exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadixType {
    #[default]
    #[serde(rename = "RADIX_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "RADIX_TYPE_BINARY")]
    Binary,
    #[serde(rename = "RADIX_TYPE_DECIMAL")]
    Decimal,
    #[serde(rename = "RADIX_TYPE_HEXADECIMAL")]
    Hexadecimal,
    #[serde(rename = "RADIX_TYPE_ASCII")]
    Ascii,
}

impl RadixType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "RADIX_TYPE_UNSPECIFIED",
            Self::Binary => "RADIX_TYPE_BINARY",
            Self::Decimal => "RADIX_TYPE_DECIMAL",
            Self::Hexadecimal => "RADIX_TYPE_HEXADECIMAL",
            Self::Ascii => "RADIX_TYPE_ASCII",
        }
    }
}

/// One scalar setting value: string, int64, bool, or double.
///
/// Serialized as a bare JSON scalar. Integral JSON floats fold into
/// `Int64`; NaN and infinities are rejected at decode time.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Int64(i64),
    Bool(bool),
    Double(f64),
}

/// High-level-analyzer setting value. Same shape as [`SettingValue`] but an
/// independent variant set, matching the schema's separate message type.
#[derive(Debug, Clone, PartialEq)]
pub enum HlaSettingValue {
    String(String),
    Int64(i64),
    Bool(bool),
    Double(f64),
}

struct ScalarVisitor;

enum Scalar {
    String(String),
    Int64(i64),
    Bool(bool),
    Double(f64),
}

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, integer, boolean, or finite float setting value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
        Ok(Scalar::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
        Ok(Scalar::String(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
        Ok(Scalar::Int64(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
        i64::try_from(v)
            .map(Scalar::Int64)
            .map_err(|_| E::custom("integer setting value out of int64 range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
        if !v.is_finite() {
            return Err(E::custom("non-finite setting value"));
        }
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            return Ok(Scalar::Int64(v as i64));
        }
        Ok(Scalar::Double(v))
    }
}

impl Serialize for SettingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(v) => serializer.serialize_str(v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Double(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for SettingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match deserializer.deserialize_any(ScalarVisitor)? {
            Scalar::String(v) => Self::String(v),
            Scalar::Int64(v) => Self::Int64(v),
            Scalar::Bool(v) => Self::Bool(v),
            Scalar::Double(v) => Self::Double(v),
        })
    }
}

impl Serialize for HlaSettingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(v) => serializer.serialize_str(v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Double(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for HlaSettingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match deserializer.deserialize_any(ScalarVisitor)? {
            Scalar::String(v) => Self::String(v),
            Scalar::Int64(v) => Self::Int64(v),
            Scalar::Bool(v) => Self::Bool(v),
            Scalar::Double(v) => Self::Double(v),
        })
    }
}

// --- Requests and replies ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetAppInfoRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetAppInfoReply {
    pub app_info: AppInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetDevicesRequest {
    pub include_simulation_devices: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetDevicesReply {
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualCaptureMode {
    pub trim_data_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimedCaptureMode {
    pub duration_seconds: f64,
    pub trim_data_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalTriggerCaptureMode {
    pub trim_data_seconds: Option<f64>,
    pub after_trigger_seconds: Option<f64>,
}

/// Capture configuration carried by StartCapture. At most one of the mode
/// fields is set; an absent mode means manual.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    pub buffer_size_megabytes: Option<u32>,
    pub manual_capture_mode: Option<ManualCaptureMode>,
    pub timed_capture_mode: Option<TimedCaptureMode>,
    pub digital_capture_mode: Option<DigitalTriggerCaptureMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StartCaptureRequest {
    pub device_id: String,
    pub capture_configuration: Option<CaptureConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StartCaptureReply {
    pub capture_info: CaptureInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadCaptureRequest {
    pub filepath: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadCaptureReply {
    pub capture_info: CaptureInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveCaptureRequest {
    pub capture_id: u64,
    pub filepath: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveCaptureReply {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopCaptureRequest {
    pub capture_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopCaptureReply {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitCaptureRequest {
    pub capture_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitCaptureReply {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseCaptureRequest {
    pub capture_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseCaptureReply {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddAnalyzerRequest {
    pub capture_id: u64,
    pub analyzer_name: String,
    pub analyzer_label: String,
    pub settings: BTreeMap<String, SettingValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddAnalyzerReply {
    pub analyzer_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveAnalyzerRequest {
    pub capture_id: u64,
    pub analyzer_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveAnalyzerReply {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddHighLevelAnalyzerRequest {
    pub capture_id: u64,
    pub extension_directory: String,
    pub hla_name: String,
    pub hla_label: String,
    pub input_analyzer_id: u64,
    pub settings: BTreeMap<String, HlaSettingValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddHighLevelAnalyzerReply {
    pub analyzer_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveHighLevelAnalyzerRequest {
    pub capture_id: u64,
    pub analyzer_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveHighLevelAnalyzerReply {}

/// Digital/analog channel selection for raw exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicChannels {
    pub digital_channels: Vec<u32>,
    pub analog_channels: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRawDataCsvRequest {
    pub capture_id: u64,
    pub directory: String,
    pub logic_channels: Option<LogicChannels>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRawDataCsvReply {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRawDataBinaryRequest {
    pub capture_id: u64,
    pub directory: String,
    pub logic_channels: Option<LogicChannels>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRawDataBinaryReply {}

/// Analyzer selector for data-table exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTableAnalyzerConfiguration {
    pub analyzer_id: u64,
    pub radix_type: RadixType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTableFilter {
    pub query: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDataTableCsvRequest {
    pub capture_id: u64,
    pub filepath: String,
    pub analyzers: Vec<DataTableAnalyzerConfiguration>,
    pub iso8601_timestamp: bool,
    pub export_columns: Vec<String>,
    pub filter: Option<DataTableFilter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDataTableCsvReply {}

/// A decoded request, tagged by method.
///
/// Fault-rule matchers and the handler dispatch both pattern-match on this,
/// so request shapes are resolved exactly once per call.
#[derive(Debug, Clone)]
pub enum AnyRequest {
    GetAppInfo(GetAppInfoRequest),
    GetDevices(GetDevicesRequest),
    StartCapture(StartCaptureRequest),
    LoadCapture(LoadCaptureRequest),
    SaveCapture(SaveCaptureRequest),
    StopCapture(StopCaptureRequest),
    WaitCapture(WaitCaptureRequest),
    CloseCapture(CloseCaptureRequest),
    AddAnalyzer(AddAnalyzerRequest),
    RemoveAnalyzer(RemoveAnalyzerRequest),
    AddHighLevelAnalyzer(AddHighLevelAnalyzerRequest),
    RemoveHighLevelAnalyzer(RemoveHighLevelAnalyzerRequest),
    ExportRawDataCsv(ExportRawDataCsvRequest),
    ExportRawDataBinary(ExportRawDataBinaryRequest),
    ExportDataTableCsv(ExportDataTableCsvRequest),
}

impl AnyRequest {
    /// Decode a request payload for the given method. An absent or null
    /// payload decodes as an empty message.
    pub fn decode(method: Method, payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        let payload = if payload.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            payload
        };
        Ok(match method {
            Method::GetAppInfo => Self::GetAppInfo(serde_json::from_value(payload)?),
            Method::GetDevices => Self::GetDevices(serde_json::from_value(payload)?),
            Method::StartCapture => Self::StartCapture(serde_json::from_value(payload)?),
            Method::LoadCapture => Self::LoadCapture(serde_json::from_value(payload)?),
            Method::SaveCapture => Self::SaveCapture(serde_json::from_value(payload)?),
            Method::StopCapture => Self::StopCapture(serde_json::from_value(payload)?),
            Method::WaitCapture => Self::WaitCapture(serde_json::from_value(payload)?),
            Method::CloseCapture => Self::CloseCapture(serde_json::from_value(payload)?),
            Method::AddAnalyzer => Self::AddAnalyzer(serde_json::from_value(payload)?),
            Method::RemoveAnalyzer => Self::RemoveAnalyzer(serde_json::from_value(payload)?),
            Method::AddHighLevelAnalyzer => {
                Self::AddHighLevelAnalyzer(serde_json::from_value(payload)?)
            }
            Method::RemoveHighLevelAnalyzer => {
                Self::RemoveHighLevelAnalyzer(serde_json::from_value(payload)?)
            }
            Method::ExportRawDataCsv => Self::ExportRawDataCsv(serde_json::from_value(payload)?),
            Method::ExportRawDataBinary => {
                Self::ExportRawDataBinary(serde_json::from_value(payload)?)
            }
            Method::ExportDataTableCsv => {
                Self::ExportDataTableCsv(serde_json::from_value(payload)?)
            }
        })
    }

    /// The capture id carried by capture-scoped requests, if any.
    pub fn capture_id(&self) -> Option<u64> {
        match self {
            Self::SaveCapture(r) => Some(r.capture_id),
            Self::StopCapture(r) => Some(r.capture_id),
            Self::WaitCapture(r) => Some(r.capture_id),
            Self::CloseCapture(r) => Some(r.capture_id),
            Self::AddAnalyzer(r) => Some(r.capture_id),
            Self::RemoveAnalyzer(r) => Some(r.capture_id),
            Self::AddHighLevelAnalyzer(r) => Some(r.capture_id),
            Self::RemoveHighLevelAnalyzer(r) => Some(r.capture_id),
            Self::ExportRawDataCsv(r) => Some(r.capture_id),
            Self::ExportRawDataBinary(r) => Some(r.capture_id),
            Self::ExportDataTableCsv(r) => Some(r.capture_id),
            Self::GetAppInfo(_)
            | Self::GetDevices(_)
            | Self::StartCapture(_)
            | Self::LoadCapture(_) => None,
        }
    }
}
