//! CloseCapture handler.

use salad_protocol::messages::{CloseCaptureReply, CloseCaptureRequest};
use salad_protocol::RpcStatus;

use crate::plan::CloseCaptureMode;
use crate::server::RuntimeContext;
use crate::state::CaptureStatus;

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    req: &CloseCaptureRequest,
) -> Result<CloseCaptureReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.close_capture;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;
    let capture_id = req.capture_id;

    if let Err(err) = ctx.state.capture_for(capture_id, missing) {
        if behavior.require_capture_exists {
            return Err(err);
        }
        return Ok(CloseCaptureReply {});
    }

    match behavior.mode {
        CloseCaptureMode::Delete => {
            // Dependent analyzers and HLAs go in the same critical section,
            // so no mapping can ever outlive its capture.
            ctx.state.analyzers.remove(&capture_id);
            ctx.state.high_level_analyzers.remove(&capture_id);
            ctx.state.captures.remove(&capture_id);
        }
        CloseCaptureMode::MarkClosed => {
            if let Some(capture) = ctx.state.captures.get_mut(&capture_id) {
                capture.status = CaptureStatus::Closed;
            }
        }
    }

    Ok(CloseCaptureReply {})
}
