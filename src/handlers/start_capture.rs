//! StartCapture handler.

use salad_protocol::messages::{CaptureInfo, StartCaptureReply, StartCaptureRequest};
use salad_protocol::RpcStatus;

use crate::plan::duration_from_seconds;
use crate::server::RuntimeContext;
use crate::state::{CaptureMode, CaptureOrigin, CaptureState};

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    req: &StartCaptureRequest,
) -> Result<StartCaptureReply, RpcStatus> {
    // Empty device_id selects the first physical device.
    let mut device_id = req.device_id.clone();
    if device_id.is_empty() {
        device_id = ctx
            .state
            .devices
            .iter()
            .find(|device| !device.is_simulation)
            .map(|device| device.device_id.clone())
            .unwrap_or_default();
        if device_id.is_empty() {
            return Err(RpcStatus::not_found(
                "StartCapture: no physical device available",
            ));
        }
    }

    if ctx.plan.behavior.start_capture.require_device_exists
        && !ctx
            .state
            .devices
            .iter()
            .any(|device| device.device_id == device_id)
    {
        return Err(RpcStatus::not_found(format!(
            "StartCapture: device {device_id:?} not found"
        )));
    }

    let config = req.capture_configuration.as_ref().ok_or_else(|| {
        RpcStatus::invalid_argument("StartCapture: capture_configuration is required")
    })?;

    let mode = if config.manual_capture_mode.is_some() {
        CaptureMode::manual()
    } else if let Some(timed) = &config.timed_capture_mode {
        CaptureMode::timed(duration_from_seconds(timed.duration_seconds))
    } else if config.digital_capture_mode.is_some() {
        CaptureMode::trigger()
    } else {
        CaptureMode::manual()
    };

    let capture_id = ctx.state.alloc_capture_id();
    ctx.state.captures.insert(
        capture_id,
        CaptureState {
            id: capture_id,
            status: ctx.plan.behavior.start_capture.create_capture.status,
            origin: CaptureOrigin::Started,
            started_at: ctx.clock.now(),
            mode,
        },
    );

    Ok(StartCaptureReply {
        capture_info: CaptureInfo { capture_id },
    })
}
