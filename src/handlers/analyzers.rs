//! AddAnalyzer / RemoveAnalyzer handlers.

use std::collections::BTreeMap;

use salad_protocol::messages::{
    AddAnalyzerReply, AddAnalyzerRequest, RemoveAnalyzerReply, RemoveAnalyzerRequest,
};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;
use crate::state::AnalyzerState;

pub fn handle_add(
    ctx: &mut RuntimeContext<'_>,
    req: &AddAnalyzerRequest,
) -> Result<AddAnalyzerReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.add_analyzer;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;

    let capture_id = req.capture_id;
    if capture_id == 0 {
        return Err(RpcStatus::invalid_argument(
            "AddAnalyzer: capture_id is required",
        ));
    }
    if behavior.require_capture_exists {
        ctx.state.capture_for(capture_id, missing)?;
    }
    if behavior.require_analyzer_name_non_empty && req.analyzer_name.is_empty() {
        return Err(RpcStatus::invalid_argument(
            "AddAnalyzer: analyzer_name is required",
        ));
    }

    let analyzer_id = ctx.state.alloc_analyzer_id();
    let created_at = ctx.clock.now();
    ctx.state
        .analyzers
        .entry(capture_id)
        .or_insert_with(BTreeMap::new)
        .insert(
            analyzer_id,
            AnalyzerState {
                id: analyzer_id,
                capture_id,
                name: req.analyzer_name.clone(),
                label: req.analyzer_label.clone(),
                settings: req.settings.clone(),
                created_at,
            },
        );

    Ok(AddAnalyzerReply { analyzer_id })
}

pub fn handle_remove(
    ctx: &mut RuntimeContext<'_>,
    req: &RemoveAnalyzerRequest,
) -> Result<RemoveAnalyzerReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.remove_analyzer;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;

    if req.capture_id == 0 {
        return Err(RpcStatus::invalid_argument(
            "RemoveAnalyzer: capture_id is required",
        ));
    }
    if req.analyzer_id == 0 {
        return Err(RpcStatus::invalid_argument(
            "RemoveAnalyzer: analyzer_id is required",
        ));
    }
    if behavior.require_capture_exists {
        ctx.state.capture_for(req.capture_id, missing)?;
    }

    let present = ctx
        .state
        .analyzers
        .get(&req.capture_id)
        .is_some_and(|by_capture| by_capture.contains_key(&req.analyzer_id));
    if !present {
        if behavior.require_analyzer_exists {
            return Err(RpcStatus::invalid_argument(format!(
                "RemoveAnalyzer: analyzer {} not found",
                req.analyzer_id
            )));
        }
        return Ok(RemoveAnalyzerReply {});
    }

    if let Some(by_capture) = ctx.state.analyzers.get_mut(&req.capture_id) {
        by_capture.remove(&req.analyzer_id);
    }
    Ok(RemoveAnalyzerReply {})
}
