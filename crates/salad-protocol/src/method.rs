//! RPC method registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The full automation method surface served by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    GetAppInfo,
    GetDevices,
    StartCapture,
    LoadCapture,
    SaveCapture,
    StopCapture,
    WaitCapture,
    CloseCapture,
    AddAnalyzer,
    RemoveAnalyzer,
    AddHighLevelAnalyzer,
    RemoveHighLevelAnalyzer,
    ExportRawDataCsv,
    ExportRawDataBinary,
    ExportDataTableCsv,
}

/// All methods, in the order they appear on the wire schema.
pub const ALL_METHODS: [Method; 15] = [
    Method::GetAppInfo,
    Method::GetDevices,
    Method::StartCapture,
    Method::LoadCapture,
    Method::SaveCapture,
    Method::StopCapture,
    Method::WaitCapture,
    Method::CloseCapture,
    Method::AddAnalyzer,
    Method::RemoveAnalyzer,
    Method::AddHighLevelAnalyzer,
    Method::RemoveHighLevelAnalyzer,
    Method::ExportRawDataCsv,
    Method::ExportRawDataBinary,
    Method::ExportDataTableCsv,
];

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetAppInfo => "GetAppInfo",
            Self::GetDevices => "GetDevices",
            Self::StartCapture => "StartCapture",
            Self::LoadCapture => "LoadCapture",
            Self::SaveCapture => "SaveCapture",
            Self::StopCapture => "StopCapture",
            Self::WaitCapture => "WaitCapture",
            Self::CloseCapture => "CloseCapture",
            Self::AddAnalyzer => "AddAnalyzer",
            Self::RemoveAnalyzer => "RemoveAnalyzer",
            Self::AddHighLevelAnalyzer => "AddHighLevelAnalyzer",
            Self::RemoveHighLevelAnalyzer => "RemoveHighLevelAnalyzer",
            Self::ExportRawDataCsv => "ExportRawDataCsv",
            Self::ExportRawDataBinary => "ExportRawDataBinary",
            Self::ExportDataTableCsv => "ExportDataTableCsv",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error for method names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown method {0:?}")]
pub struct ParseMethodError(pub String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ALL_METHODS
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| ParseMethodError(s.to_string()))
    }
}
