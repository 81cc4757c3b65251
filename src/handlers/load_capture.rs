//! LoadCapture handler.

use salad_protocol::messages::{CaptureInfo, LoadCaptureReply, LoadCaptureRequest};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;
use crate::state::{CaptureOrigin, CaptureState};

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    req: &LoadCaptureRequest,
) -> Result<LoadCaptureReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.load_capture;
    if behavior.require_non_empty_filepath && req.filepath.is_empty() {
        return Err(RpcStatus::invalid_argument(
            "LoadCapture: filepath is required",
        ));
    }
    if behavior.require_file_exists && std::fs::metadata(&req.filepath).is_err() {
        return Err(RpcStatus::invalid_argument(
            "LoadCapture: file does not exist",
        ));
    }

    let capture_id = ctx.state.alloc_capture_id();
    ctx.state.captures.insert(
        capture_id,
        CaptureState {
            id: capture_id,
            status: behavior.create_capture.status,
            origin: CaptureOrigin::Loaded,
            started_at: ctx.clock.now(),
            mode: behavior.create_capture.mode,
        },
    );

    Ok(LoadCaptureReply {
        capture_info: CaptureInfo { capture_id },
    })
}
