//! GetDevices handler.

use salad_protocol::messages::{GetDevicesReply, GetDevicesRequest};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    req: &GetDevicesRequest,
) -> Result<GetDevicesReply, RpcStatus> {
    let mut devices = ctx.state.devices.clone();
    if ctx.plan.behavior.get_devices.filter_simulation_devices && !req.include_simulation_devices {
        devices.retain(|device| !device.is_simulation);
    }
    Ok(GetDevicesReply { devices })
}
