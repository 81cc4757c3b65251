//! SaveCapture handler.

use salad_protocol::messages::{SaveCaptureReply, SaveCaptureRequest};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    req: &SaveCaptureRequest,
) -> Result<SaveCaptureReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.save_capture;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;

    let capture_id = match ctx.state.capture_for(req.capture_id, missing) {
        Ok(capture) => capture.id,
        Err(err) => {
            if behavior.require_capture_exists {
                return Err(err);
            }
            return Ok(SaveCaptureReply {});
        }
    };

    if behavior.write_placeholder_file {
        ctx.side_effects
            .save_capture(&req.filepath, capture_id, &behavior.placeholder_bytes)
            .map_err(|err| RpcStatus::internal(err.to_string()))?;
    }

    Ok(SaveCaptureReply {})
}
