// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Sequential batch execution.

Runs are executed one after another. A recoverable failure is logged and the
batch moves on; a fatal failure (missing structural prerequisite) ends the
process.
*/

use crate::types::*;
use crate::workflows::Pipeline;
use std::path::PathBuf;
use tracing::{error, info};

/// Exit status used when a fatal error ends the batch
pub const FATAL_EXIT_CODE: i32 = 1;

/// One unit of work
#[derive(Debug, Clone)]
pub enum BatchRun {
    Functional(FunctionalRun),
    Structural(StructuralRun),
}

impl BatchRun {
    pub fn subject_id(&self) -> &str {
        match self {
            BatchRun::Functional(run) => &run.subject_id,
            BatchRun::Structural(run) => &run.subject_id,
        }
    }
}

/// Outcome of one run that did not end the batch
#[derive(Debug)]
pub enum RunOutcome {
    Functional(ThresholdResult),
    /// `None` when tractography failed at runtime
    Structural(Option<PathBuf>),
    Failed { subject_id: String, error: PipelineError },
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RunOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RunOutcome::Failed { .. }))
            .count()
    }
}

pub struct BatchRunner<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// Run every job, exiting the process on the first fatal error
    pub fn run(&self, runs: &[BatchRun]) -> BatchReport {
        match self.run_until_fatal(runs) {
            Ok(report) => report,
            Err(e) => {
                error!("Fatal: {}. Aborting batch.", e);
                std::process::exit(FATAL_EXIT_CODE);
            }
        }
    }

    /// Run every job, stopping at the first fatal error and returning it
    pub fn run_until_fatal(&self, runs: &[BatchRun]) -> PipelineResult<BatchReport> {
        let mut report = BatchReport::default();
        for (i, run) in runs.iter().enumerate() {
            info!(
                "Batch job {}/{}: subject {}",
                i + 1,
                runs.len(),
                run.subject_id()
            );
            let outcome = match run {
                BatchRun::Functional(r) => self.pipeline.run_functional(r).map(RunOutcome::Functional),
                BatchRun::Structural(r) => self.pipeline.run_structural(r).map(RunOutcome::Structural),
            };
            match outcome {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(
                        "Subject {} failed: {}",
                        run.subject_id(),
                        e
                    );
                    report.outcomes.push(RunOutcome::Failed {
                        subject_id: run.subject_id().to_string(),
                        error: e,
                    });
                }
            }
        }
        Ok(report)
    }
}
