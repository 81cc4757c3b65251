//! StopCapture handler.

use salad_protocol::messages::{StopCaptureReply, StopCaptureRequest};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    req: &StopCaptureRequest,
) -> Result<StopCaptureReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.stop_capture;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;

    let capture = match ctx.state.capture_for(req.capture_id, missing) {
        Ok(capture) => capture,
        Err(err) => {
            if behavior.require_capture_exists {
                return Err(err);
            }
            return Ok(StopCaptureReply {});
        }
    };

    // Only the configured from-status transitions; repeated stops are not an
    // error.
    if capture.status == behavior.transition_from {
        capture.status = behavior.transition_to;
    }

    Ok(StopCaptureReply {})
}
