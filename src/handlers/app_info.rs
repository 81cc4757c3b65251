//! GetAppInfo handler.

use salad_protocol::messages::{GetAppInfoReply, GetAppInfoRequest};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    _req: &GetAppInfoRequest,
) -> Result<GetAppInfoReply, RpcStatus> {
    Ok(GetAppInfoReply {
        app_info: ctx.state.app_info.clone().unwrap_or_default(),
    })
}
