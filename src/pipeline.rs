// src/pipeline.rs

use crate::aggregate::Aggregates;
use crate::load::{LoadCache, LoadOutcome};
use crate::render::RenderModel;
use std::time::Instant;
use tracing::debug;

/// One full rerun: load (memoised) → derive (done at load) → aggregate →
/// render model. Called by the host on every interaction.
///
/// A failed load halts here with the banner model, and a table with no rows
/// halts with the title only; in both cases nothing is aggregated.
pub fn run_pipeline(cache: &LoadCache) -> RenderModel {
    let start = Instant::now();
    let outcome = cache.get();

    let model = match outcome.as_ref() {
        LoadOutcome::Failed(err) => RenderModel::halted(err),
        LoadOutcome::Loaded(table) if table.num_rows() == 0 => RenderModel::empty(),
        LoadOutcome::Loaded(table) => {
            let aggregates = Aggregates::compute(table);
            RenderModel::dashboard(table, &aggregates)
        }
    };

    debug!(
        source = %cache.source().display(),
        halted = model.is_halted(),
        elapsed = ?start.elapsed(),
        "pipeline run"
    );
    model
}
