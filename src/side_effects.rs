//! Side-effect sink: optional placeholder files for save/export handlers.
//!
//! The mock never produces real capture data. When a scenario enables the
//! placeholder flags, handlers call through this trait to materialize small
//! line-oriented ASCII files whose sentinel prefixes downstream tests match
//! on. The noop variant keeps the filesystem untouched.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use salad_protocol::messages::{
    ExportDataTableCsvRequest, ExportRawDataBinaryRequest, ExportRawDataCsvRequest,
};
use thiserror::Error;

/// Sink failure, surfaced to clients as INTERNAL.
#[derive(Debug, Error)]
pub enum SideEffectError {
    #[error("{0}")]
    MissingPath(&'static str),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SideEffectError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Options for raw CSV export placeholders.
#[derive(Debug, Clone)]
pub struct ExportCsvOptions {
    pub write_digital: bool,
    pub write_analog: bool,
    pub digital_filename: String,
    pub analog_filename: String,
    pub include_requested_channels: bool,
}

/// Options for raw binary export placeholders.
#[derive(Debug, Clone)]
pub struct ExportBinaryOptions {
    pub write_digital: bool,
    pub write_analog: bool,
    pub digital_filename: String,
    pub analog_filename: String,
}

/// Options for data-table export placeholders.
#[derive(Debug, Clone, Copy)]
pub struct ExportDataTableOptions {
    pub include_request: bool,
}

/// Filesystem writes performed by Save/Export handlers.
pub trait SideEffects: Send + Sync {
    fn save_capture(
        &self,
        path: &str,
        capture_id: u64,
        payload: &[u8],
    ) -> Result<(), SideEffectError>;

    fn export_raw_csv(
        &self,
        directory: &str,
        request: &ExportRawDataCsvRequest,
        opts: &ExportCsvOptions,
    ) -> Result<(), SideEffectError>;

    fn export_raw_binary(
        &self,
        directory: &str,
        request: &ExportRawDataBinaryRequest,
        opts: &ExportBinaryOptions,
    ) -> Result<(), SideEffectError>;

    fn export_data_table_csv(
        &self,
        path: &str,
        request: &ExportDataTableCsvRequest,
        opts: &ExportDataTableOptions,
    ) -> Result<(), SideEffectError>;
}

/// Sink that succeeds without touching the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSideEffects;

impl SideEffects for NoopSideEffects {
    fn save_capture(&self, _: &str, _: u64, _: &[u8]) -> Result<(), SideEffectError> {
        Ok(())
    }

    fn export_raw_csv(
        &self,
        _: &str,
        _: &ExportRawDataCsvRequest,
        _: &ExportCsvOptions,
    ) -> Result<(), SideEffectError> {
        Ok(())
    }

    fn export_raw_binary(
        &self,
        _: &str,
        _: &ExportRawDataBinaryRequest,
        _: &ExportBinaryOptions,
    ) -> Result<(), SideEffectError> {
        Ok(())
    }

    fn export_data_table_csv(
        &self,
        _: &str,
        _: &ExportDataTableCsvRequest,
        _: &ExportDataTableOptions,
    ) -> Result<(), SideEffectError> {
        Ok(())
    }
}

/// Sink that writes placeholder files. Directory creation is idempotent.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSideEffects;

impl SideEffects for FileSideEffects {
    fn save_capture(
        &self,
        path: &str,
        _capture_id: u64,
        payload: &[u8],
    ) -> Result<(), SideEffectError> {
        if path.is_empty() {
            return Err(SideEffectError::MissingPath("save capture path is required"));
        }
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                SideEffectError::io(
                    format!("create save capture directory for {}", path.display()),
                    err,
                )
            })?;
        }
        fs::write(path, payload).map_err(|err| {
            SideEffectError::io(
                format!("write save capture placeholder for {}", path.display()),
                err,
            )
        })
    }

    fn export_raw_csv(
        &self,
        directory: &str,
        request: &ExportRawDataCsvRequest,
        opts: &ExportCsvOptions,
    ) -> Result<(), SideEffectError> {
        if directory.is_empty() {
            return Err(SideEffectError::MissingPath("export directory is required"));
        }
        let directory = Path::new(directory);
        fs::create_dir_all(directory).map_err(|err| {
            SideEffectError::io(format!("create export directory {}", directory.display()), err)
        })?;

        if opts.write_digital {
            let path = directory.join(&opts.digital_filename);
            let payload = build_csv_placeholder("DIGITAL", request, opts.include_requested_channels);
            fs::write(&path, payload).map_err(|err| {
                SideEffectError::io(format!("write digital csv placeholder {}", path.display()), err)
            })?;
        }
        if opts.write_analog {
            let path = directory.join(&opts.analog_filename);
            let payload = build_csv_placeholder("ANALOG", request, opts.include_requested_channels);
            fs::write(&path, payload).map_err(|err| {
                SideEffectError::io(format!("write analog csv placeholder {}", path.display()), err)
            })?;
        }
        Ok(())
    }

    fn export_raw_binary(
        &self,
        directory: &str,
        request: &ExportRawDataBinaryRequest,
        opts: &ExportBinaryOptions,
    ) -> Result<(), SideEffectError> {
        if directory.is_empty() {
            return Err(SideEffectError::MissingPath("export directory is required"));
        }
        let directory = Path::new(directory);
        fs::create_dir_all(directory).map_err(|err| {
            SideEffectError::io(format!("create export directory {}", directory.display()), err)
        })?;

        if opts.write_digital {
            let path = directory.join(&opts.digital_filename);
            let payload = format!("SALAD_MOCK_DIGITAL_BIN capture_id={}\n", request.capture_id);
            fs::write(&path, payload).map_err(|err| {
                SideEffectError::io(format!("write digital bin placeholder {}", path.display()), err)
            })?;
        }
        if opts.write_analog {
            let path = directory.join(&opts.analog_filename);
            let payload = format!("SALAD_MOCK_ANALOG_BIN capture_id={}\n", request.capture_id);
            fs::write(&path, payload).map_err(|err| {
                SideEffectError::io(format!("write analog bin placeholder {}", path.display()), err)
            })?;
        }
        Ok(())
    }

    fn export_data_table_csv(
        &self,
        path: &str,
        request: &ExportDataTableCsvRequest,
        opts: &ExportDataTableOptions,
    ) -> Result<(), SideEffectError> {
        if path.is_empty() {
            return Err(SideEffectError::MissingPath("export filepath is required"));
        }
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                SideEffectError::io(
                    format!("create export directory for {}", path.display()),
                    err,
                )
            })?;
        }
        let payload = build_data_table_placeholder(request, opts.include_request);
        fs::write(path, payload).map_err(|err| {
            SideEffectError::io(
                format!("write data table csv placeholder {}", path.display()),
                err,
            )
        })
    }
}

fn build_csv_placeholder(
    kind: &str,
    request: &ExportRawDataCsvRequest,
    include_channels: bool,
) -> String {
    let mut out = format!("SALAD_MOCK_{}_CSV capture_id={}\n", kind, request.capture_id);
    if !include_channels {
        return out;
    }
    let Some(channels) = &request.logic_channels else {
        return out;
    };
    if !channels.digital_channels.is_empty() {
        let _ = writeln!(out, "digital={}", bracketed(&channels.digital_channels));
    }
    if !channels.analog_channels.is_empty() {
        let _ = writeln!(out, "analog={}", bracketed(&channels.analog_channels));
    }
    out
}

fn build_data_table_placeholder(request: &ExportDataTableCsvRequest, include_request: bool) -> String {
    let mut out = format!("SALAD_MOCK_DATA_TABLE_CSV capture_id={}\n", request.capture_id);
    if !include_request {
        return out;
    }

    let _ = writeln!(out, "iso8601_timestamp={}", request.iso8601_timestamp);
    if !request.export_columns.is_empty() {
        let _ = writeln!(out, "export_columns={}", bracketed(&request.export_columns));
    }
    if !request.analyzers.is_empty() {
        let pairs: Vec<String> = request
            .analyzers
            .iter()
            .map(|a| format!("{}:{}", a.analyzer_id, a.radix_type.as_str()))
            .collect();
        let _ = writeln!(out, "analyzers={}", bracketed(&pairs));
    }
    if let Some(filter) = &request.filter {
        if !filter.query.is_empty() {
            let _ = writeln!(out, "filter.query={}", filter.query);
        }
        if !filter.columns.is_empty() {
            let _ = writeln!(out, "filter.columns={}", bracketed(&filter.columns));
        }
    }
    out
}

fn bracketed<T: std::fmt::Display>(items: &[T]) -> String {
    let body: Vec<String> = items.iter().map(|item| item.to_string()).collect();
    format!("[{}]", body.join(" "))
}
