//! Per-method handlers.
//!
//! Every handler follows the same shape: validate, mutate state, run the
//! optional side effect, reply. Validation always happens before mutation,
//! so an erroring handler never commits partial state.

pub mod analyzers;
pub mod app_info;
pub mod close_capture;
pub mod devices;
pub mod export;
pub mod high_level_analyzers;
pub mod load_capture;
pub mod save_capture;
pub mod start_capture;
pub mod stop_capture;
pub mod wait_capture;

use salad_protocol::messages::AnyRequest;
use salad_protocol::RpcStatus;
use serde::Serialize;

use crate::server::RuntimeContext;

/// Route a decoded request to its handler and encode the reply.
pub fn dispatch(
    ctx: &mut RuntimeContext<'_>,
    request: &AnyRequest,
) -> Result<serde_json::Value, RpcStatus> {
    match request {
        AnyRequest::GetAppInfo(req) => encode(app_info::handle(ctx, req)?),
        AnyRequest::GetDevices(req) => encode(devices::handle(ctx, req)?),
        AnyRequest::StartCapture(req) => encode(start_capture::handle(ctx, req)?),
        AnyRequest::LoadCapture(req) => encode(load_capture::handle(ctx, req)?),
        AnyRequest::SaveCapture(req) => encode(save_capture::handle(ctx, req)?),
        AnyRequest::StopCapture(req) => encode(stop_capture::handle(ctx, req)?),
        AnyRequest::WaitCapture(req) => encode(wait_capture::handle(ctx, req)?),
        AnyRequest::CloseCapture(req) => encode(close_capture::handle(ctx, req)?),
        AnyRequest::AddAnalyzer(req) => encode(analyzers::handle_add(ctx, req)?),
        AnyRequest::RemoveAnalyzer(req) => encode(analyzers::handle_remove(ctx, req)?),
        AnyRequest::AddHighLevelAnalyzer(req) => {
            encode(high_level_analyzers::handle_add(ctx, req)?)
        }
        AnyRequest::RemoveHighLevelAnalyzer(req) => {
            encode(high_level_analyzers::handle_remove(ctx, req)?)
        }
        AnyRequest::ExportRawDataCsv(req) => encode(export::handle_raw_csv(ctx, req)?),
        AnyRequest::ExportRawDataBinary(req) => encode(export::handle_raw_binary(ctx, req)?),
        AnyRequest::ExportDataTableCsv(req) => encode(export::handle_data_table_csv(ctx, req)?),
    }
}

fn encode<T: Serialize>(reply: T) -> Result<serde_json::Value, RpcStatus> {
    serde_json::to_value(reply).map_err(|err| RpcStatus::internal(format!("encode reply: {err}")))
}
