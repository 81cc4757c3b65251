//! Export handlers: raw CSV, raw binary, and data-table placeholders.

use salad_protocol::messages::{
    ExportDataTableCsvReply, ExportDataTableCsvRequest, ExportRawDataBinaryReply,
    ExportRawDataBinaryRequest, ExportRawDataCsvReply, ExportRawDataCsvRequest,
};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;
use crate::side_effects::{ExportBinaryOptions, ExportCsvOptions, ExportDataTableOptions};

pub fn handle_raw_csv(
    ctx: &mut RuntimeContext<'_>,
    req: &ExportRawDataCsvRequest,
) -> Result<ExportRawDataCsvReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.export_raw_data_csv;
    if behavior.require_capture_exists {
        ctx.state
            .capture_for(req.capture_id, ctx.plan.defaults.status_on_unknown_capture_id)?;
    }

    if behavior.write_digital_csv || behavior.write_analog_csv {
        ctx.side_effects
            .export_raw_csv(
                &req.directory,
                req,
                &ExportCsvOptions {
                    write_digital: behavior.write_digital_csv,
                    write_analog: behavior.write_analog_csv,
                    digital_filename: behavior.digital_filename.clone(),
                    analog_filename: behavior.analog_filename.clone(),
                    include_requested_channels: behavior.include_requested_channels_in_file,
                },
            )
            .map_err(|err| RpcStatus::internal(err.to_string()))?;
    }

    Ok(ExportRawDataCsvReply {})
}

pub fn handle_raw_binary(
    ctx: &mut RuntimeContext<'_>,
    req: &ExportRawDataBinaryRequest,
) -> Result<ExportRawDataBinaryReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.export_raw_data_binary;
    if behavior.require_capture_exists {
        ctx.state
            .capture_for(req.capture_id, ctx.plan.defaults.status_on_unknown_capture_id)?;
    }

    if behavior.write_digital_bin || behavior.write_analog_bin {
        ctx.side_effects
            .export_raw_binary(
                &req.directory,
                req,
                &ExportBinaryOptions {
                    write_digital: behavior.write_digital_bin,
                    write_analog: behavior.write_analog_bin,
                    digital_filename: behavior.digital_filename.clone(),
                    analog_filename: behavior.analog_filename.clone(),
                },
            )
            .map_err(|err| RpcStatus::internal(err.to_string()))?;
    }

    Ok(ExportRawDataBinaryReply {})
}

pub fn handle_data_table_csv(
    ctx: &mut RuntimeContext<'_>,
    req: &ExportDataTableCsvRequest,
) -> Result<ExportDataTableCsvReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.export_data_table_csv;
    if behavior.require_capture_exists {
        ctx.state
            .capture_for(req.capture_id, ctx.plan.defaults.status_on_unknown_capture_id)?;
    }

    if behavior.write_placeholder_file {
        ctx.side_effects
            .export_data_table_csv(
                &req.filepath,
                req,
                &ExportDataTableOptions {
                    include_request: behavior.include_request_in_file,
                },
            )
            .map_err(|err| RpcStatus::internal(err.to_string()))?;
    }

    Ok(ExportDataTableCsvReply {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Fixture;
    use salad_protocol::StatusCode;

    const ONE_CAPTURE: &str = "
version: 1
fixtures:
  captures:
    - capture_id: 1
      status: completed
";

    #[test]
    fn test_raw_csv_validates_capture() {
        let mut fixture = Fixture::from_yaml(ONE_CAPTURE);
        let req = ExportRawDataCsvRequest {
            capture_id: 9,
            directory: "/tmp/out".to_string(),
            logic_channels: None,
        };
        let err = handle_raw_csv(&mut fixture.ctx(), &req).unwrap_err();
        assert_eq!(err.code, StatusCode::InvalidArgument);
    }

    #[test]
    fn test_raw_csv_succeeds_without_placeholders() {
        let mut fixture = Fixture::from_yaml(ONE_CAPTURE);
        let req = ExportRawDataCsvRequest {
            capture_id: 1,
            directory: "/tmp/out".to_string(),
            logic_channels: None,
        };
        assert!(handle_raw_csv(&mut fixture.ctx(), &req).is_ok());
    }

    #[test]
    fn test_raw_binary_skips_validation_when_toggle_off() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
behavior:
  ExportRawDataBinary:
    validate:
      require_capture_exists: false
",
        );
        let req = ExportRawDataBinaryRequest {
            capture_id: 9,
            directory: "/tmp/out".to_string(),
            logic_channels: None,
        };
        assert!(handle_raw_binary(&mut fixture.ctx(), &req).is_ok());
    }

    #[test]
    fn test_data_table_validates_capture() {
        let mut fixture = Fixture::from_yaml(ONE_CAPTURE);
        let req = ExportDataTableCsvRequest {
            capture_id: 9,
            ..Default::default()
        };
        assert!(handle_data_table_csv(&mut fixture.ctx(), &req).is_err());
    }
}
