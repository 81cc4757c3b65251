//! AddHighLevelAnalyzer / RemoveHighLevelAnalyzer handlers.

use std::collections::BTreeMap;

use salad_protocol::messages::{
    AddHighLevelAnalyzerReply, AddHighLevelAnalyzerRequest, RemoveHighLevelAnalyzerReply,
    RemoveHighLevelAnalyzerRequest,
};
use salad_protocol::RpcStatus;

use crate::server::RuntimeContext;
use crate::state::HighLevelAnalyzerState;

pub fn handle_add(
    ctx: &mut RuntimeContext<'_>,
    req: &AddHighLevelAnalyzerRequest,
) -> Result<AddHighLevelAnalyzerReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.add_high_level_analyzer;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;

    let capture_id = req.capture_id;
    if capture_id == 0 {
        return Err(RpcStatus::invalid_argument(
            "AddHighLevelAnalyzer: capture_id is required",
        ));
    }
    if behavior.require_capture_exists {
        ctx.state.capture_for(capture_id, missing)?;
    }
    if behavior.require_extension_dir_non_empty && req.extension_directory.is_empty() {
        return Err(RpcStatus::invalid_argument(
            "AddHighLevelAnalyzer: extension_directory is required",
        ));
    }
    if behavior.require_hla_name_non_empty && req.hla_name.is_empty() {
        return Err(RpcStatus::invalid_argument(
            "AddHighLevelAnalyzer: hla_name is required",
        ));
    }
    if behavior.require_input_analyzer_id_non_zero && req.input_analyzer_id == 0 {
        return Err(RpcStatus::invalid_argument(
            "AddHighLevelAnalyzer: input_analyzer_id is required",
        ));
    }
    if behavior.require_input_analyzer_exists {
        let input_present = ctx
            .state
            .analyzers
            .get(&capture_id)
            .is_some_and(|by_capture| by_capture.contains_key(&req.input_analyzer_id));
        if !input_present {
            return Err(RpcStatus::invalid_argument(format!(
                "AddHighLevelAnalyzer: input analyzer {} not found",
                req.input_analyzer_id
            )));
        }
    }

    // HLAs draw from the same counter as plain analyzers.
    let analyzer_id = ctx.state.alloc_analyzer_id();
    let created_at = ctx.clock.now();
    ctx.state
        .high_level_analyzers
        .entry(capture_id)
        .or_insert_with(BTreeMap::new)
        .insert(
            analyzer_id,
            HighLevelAnalyzerState {
                id: analyzer_id,
                capture_id,
                extension_directory: req.extension_directory.clone(),
                hla_name: req.hla_name.clone(),
                label: req.hla_label.clone(),
                input_analyzer_id: req.input_analyzer_id,
                settings: req.settings.clone(),
                created_at,
            },
        );

    Ok(AddHighLevelAnalyzerReply { analyzer_id })
}

pub fn handle_remove(
    ctx: &mut RuntimeContext<'_>,
    req: &RemoveHighLevelAnalyzerRequest,
) -> Result<RemoveHighLevelAnalyzerReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.remove_high_level_analyzer;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;

    if req.capture_id == 0 {
        return Err(RpcStatus::invalid_argument(
            "RemoveHighLevelAnalyzer: capture_id is required",
        ));
    }
    if req.analyzer_id == 0 {
        return Err(RpcStatus::invalid_argument(
            "RemoveHighLevelAnalyzer: analyzer_id is required",
        ));
    }
    if behavior.require_capture_exists {
        ctx.state.capture_for(req.capture_id, missing)?;
    }

    let present = ctx
        .state
        .high_level_analyzers
        .get(&req.capture_id)
        .is_some_and(|by_capture| by_capture.contains_key(&req.analyzer_id));
    if !present {
        if behavior.require_analyzer_exists {
            return Err(RpcStatus::invalid_argument(format!(
                "RemoveHighLevelAnalyzer: analyzer {} not found",
                req.analyzer_id
            )));
        }
        return Ok(RemoveHighLevelAnalyzerReply {});
    }

    if let Some(by_capture) = ctx.state.high_level_analyzers.get_mut(&req.capture_id) {
        by_capture.remove(&req.analyzer_id);
    }
    Ok(RemoveHighLevelAnalyzerReply {})
}
