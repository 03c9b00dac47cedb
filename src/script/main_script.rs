// src/script/main_script.rs

//! Main script assembly: one per stage, invoking every batch in plan order.

use crate::batch::BatchPlan;
use crate::script::worker::BuildContext;
use crate::script::{metadata_comment, wrapper, ScriptText};
use crate::sentinel::{marker_path, Marker};

/// Build the stage's main script.
///
/// Each batch gets one wrapped invocation line produced by the dispatcher.
/// The trailing `touch <main>_SUCCESS` is only reached when every
/// invocation returned zero.
pub fn build_main_script(plan: &BatchPlan, ctx: &BuildContext<'_>) -> ScriptText {
    let path = ctx.stage.main_script_path();

    let mut text = ScriptText::new();
    if let Some(header) = &ctx.cfg.script.default_header {
        text.push_block(header);
    }
    text.push(metadata_comment(&path, ctx.batch_size));
    text.push(format!("touch {}", marker_path(&path, Marker::Started).display()));
    text.push(wrapper::fail_log_assignment(&path));
    text.push_all(wrapper::execute_function());
    text.push_all(ctx.dispatcher.functions());

    for batch in plan.batches() {
        let worker = batch.script_path(ctx.stage);
        text.push_wrapped(&ctx.dispatcher.invocation(&worker));
    }

    text.push(format!("touch {}", marker_path(&path, Marker::Success).display()));
    text
}
