//! Pass and pipeline execution model
//!
//! A pipeline is a frozen, ordered list of passes run linearly over one
//! [`DungeonState`]. Each pass declares the RNG streams it consumes; the
//! context hands out only those, so stray randomness in one pass can
//! never perturb another stream's sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::debug;

use crate::artifact::DungeonState;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::rng::{Rng, Stream, StreamSet, Streams};
use crate::seed::Seed;
use crate::trace::Trace;

/// Cooperative cancellation handle shared between the caller and a run.
///
/// Cancellation is polled between passes and at safe checkpoints inside
/// long passes; a signaled token ends the run with [`Error::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    signaled: Arc<AtomicBool>,
    reason: Arc<Mutex<Option<String>>>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.reason.lock() {
            slot.get_or_insert(reason.into());
        }
        self.signaled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn reason(&self) -> String {
        self.reason
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| "abort".to_string())
    }
}

/// Options for an interruptible run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub cancel: Option<CancelToken>,
    /// Wall-clock budget in milliseconds. `None` uses the default
    /// budget; zero or negative reports [`Error::GenerationTimeout`]
    /// before any pass runs.
    pub timeout_ms: Option<i64>,
}

/// The execution context a pass receives: its declared RNG streams, the
/// frozen config, the resolved seed, the trace, and the cancellation
/// checkpoints.
pub struct PassContext<'a> {
    streams: &'a mut Streams,
    allowed: StreamSet,
    pass_id: &'static str,
    pub config: &'a Config,
    pub seed: &'a Seed,
    pub trace: &'a mut Trace,
    cancel: Option<&'a CancelToken>,
    deadline: Option<Instant>,
    budget_ms: i64,
}

impl<'a> PassContext<'a> {
    /// The RNG for `stream`. Drawing from a stream the pass did not
    /// declare is a discipline violation and fails the run.
    pub fn rng(&mut self, stream: Stream) -> Result<&mut Rng> {
        if !self.allowed.contains(stream) {
            return Err(Error::failed(
                self.pass_id,
                format!("undeclared access to the `{}` stream", stream.name()),
            ));
        }
        Ok(self.streams.get(stream))
    }

    /// Cancellation/deadline checkpoint for long passes. Cheap enough to
    /// call per corridor, per CA sweep or per room placement.
    pub fn checkpoint(&self) -> Result<()> {
        if let Some(token) = self.cancel {
            if token.is_signaled() {
                return Err(Error::Cancelled {
                    reason: token.reason(),
                });
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::GenerationTimeout {
                    budget_ms: self.budget_ms,
                });
            }
        }
        Ok(())
    }

    /// Build a [`Error::GenerationFailed`] carrying this pass's id.
    pub fn fail(&self, message: impl Into<String>) -> Error {
        Error::failed(self.pass_id, message)
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.trace.note(message);
    }
}

/// A deterministic artifact transformation.
///
/// `run` must be deterministic given the same state and context, and may
/// only draw randomness through the streams named by `streams()`.
pub trait Pass {
    fn id(&self) -> &'static str;

    fn streams(&self) -> StreamSet {
        StreamSet::EMPTY
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()>;
}

/// Shared execution resources for one pipeline run.
pub struct RunContext<'a> {
    pub streams: &'a mut Streams,
    pub config: &'a Config,
    pub seed: &'a Seed,
    pub trace: &'a mut Trace,
    pub cancel: Option<&'a CancelToken>,
    pub deadline: Option<Instant>,
    pub budget_ms: i64,
}

/// A frozen ordered list of passes.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then<P: Pass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass in order. The first error stops the pipeline; the
    /// partial state is the caller's to discard.
    pub fn run(&self, state: &mut DungeonState, run: &mut RunContext<'_>) -> Result<()> {
        for pass in &self.passes {
            // Between-pass suspension point.
            {
                let probe = PassContext {
                    streams: &mut *run.streams,
                    allowed: StreamSet::EMPTY,
                    pass_id: pass.id(),
                    config: run.config,
                    seed: run.seed,
                    trace: &mut *run.trace,
                    cancel: run.cancel,
                    deadline: run.deadline,
                    budget_ms: run.budget_ms,
                };
                probe.checkpoint()?;
            }

            let started = Instant::now();
            run.trace.begin_span(pass.id());
            let mut ctx = PassContext {
                streams: &mut *run.streams,
                allowed: pass.streams(),
                pass_id: pass.id(),
                config: run.config,
                seed: run.seed,
                trace: &mut *run.trace,
                cancel: run.cancel,
                deadline: run.deadline,
                budget_ms: run.budget_ms,
            };
            let outcome = pass.run(state, &mut ctx);
            let elapsed = started.elapsed();
            run.trace.end_span(elapsed);
            debug!("pass {} finished in {:?}", pass.id(), elapsed);

            if outcome.is_ok() {
                run.trace.snapshot(pass.id(), &state.grid);
            }
            outcome?;
        }
        Ok(())
    }
}
