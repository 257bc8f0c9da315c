// crates/lakeport-core/src/pipeline.rs
//
// Fixed stage sequence. Stages run strictly sequentially and fail fast; the
// only fan-in is the final reconciliation check, which re-reads everything.

use tracing::info;

use crate::config::LakeConfig;
use crate::error::Result;
use crate::session::LakeSession;
use crate::stages::{airport, city, immigration, reconcile, reference, temperature};

#[derive(Debug, Clone)]
pub struct StageSummary {
    pub stage: &'static str,
    pub rows_written: usize,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub stages: Vec<StageSummary>,
    pub reconciliation: reconcile::ReconciliationReport,
}

pub fn run_pipeline(session: &LakeSession, config: &LakeConfig) -> Result<PipelineOutcome> {
    let stages: &[(&'static str, StageFn)] = &[
        ("visa", reference::run_visa),
        ("transport", reference::run_transport),
        ("country", reference::run_country),
        ("airport", airport::run),
        ("city", city::run),
        ("temperature", temperature::run),
        ("immigration", immigration::run),
    ];

    let mut summaries = Vec::with_capacity(stages.len());
    for (name, stage) in stages {
        let rows_written = stage(session, config)?;
        info!(stage = name, rows_written, "stage complete");
        summaries.push(StageSummary {
            stage: name,
            rows_written,
        });
    }

    let reconciliation = reconcile::run(session, config)?;
    info!(clean = reconciliation.is_clean(), "reconciliation complete");

    Ok(PipelineOutcome {
        stages: summaries,
        reconciliation,
    })
}

type StageFn = fn(&LakeSession, &LakeConfig) -> Result<usize>;
