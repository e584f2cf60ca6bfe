//! Pipeline scheduler
//!
//! Stages are nodes in a directed graph. `process` enqueues a frame at every entry
//! stage and drains a FIFO queue of `(stage, frame)` pairs until it is empty, so
//! all work derived from one call is finished before the call returns. Each frame
//! a stage emits is enqueued once per successor; every successor gets its own
//! `Frame` value sharing pixel and tag buffers.

pub mod report;

pub use report::{format_stats_table, StageReport};

use crate::cache::ImageCache;
use crate::config::BambooConfig;
use crate::error::{ConfigError, FrameError, PipelineError};
use crate::frame::Frame;
use crate::stage::{FramePredicate, Stage, StageContext, StageStats};
use crate::storage::Location;
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn};

/// Handle to a stage added to a [`Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(usize);

impl StageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A recoverable per-frame failure that was logged and skipped
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFailure {
    pub location: Option<Location>,
    /// Stage that raised it; `None` when the frame source failed
    pub stage: Option<String>,
    pub message: String,
}

impl fmt::Display for FrameFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self
            .location
            .as_ref()
            .map(Location::as_str)
            .unwrap_or("<in-memory>");
        match &self.stage {
            Some(stage) => write!(f, "{} [{}]: {}", location, stage, self.message),
            None => write!(f, "{}: {}", location, self.message),
        }
    }
}

struct StageNode {
    stage: Box<dyn Stage>,
    name: String,
    successors: Vec<StageId>,
    input_filter: Option<FramePredicate>,
    output_filter: Option<FramePredicate>,
    stats: StageStats,
}

/// Single-threaded frame scheduler
pub struct Pipeline {
    nodes: Vec<StageNode>,
    entries: Vec<StageId>,
    queue: VecDeque<(StageId, Frame)>,
    cache: Arc<ImageCache>,
    running: bool,
    stats_on_stop: bool,
    failures: Vec<FrameFailure>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_cache(Arc::new(ImageCache::default()))
    }

    /// Build a pipeline whose stages share `cache`.
    pub fn with_cache(cache: Arc<ImageCache>) -> Self {
        Self {
            nodes: Vec::new(),
            entries: Vec::new(),
            queue: VecDeque::new(),
            cache,
            running: false,
            stats_on_stop: true,
            failures: Vec::new(),
        }
    }

    /// Validate `config` and build an empty pipeline from it.
    pub fn from_config(config: &BambooConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(|errors| {
            ConfigError::Invalid(errors.iter().map(ToString::to_string).collect())
        })?;
        let mut pipeline = Self::with_cache(Arc::new(ImageCache::new(config.cache.capacity)));
        pipeline.stats_on_stop = config.pipeline.stats_on_stop;
        Ok(pipeline)
    }

    /// Whether `stop` logs a summary line per stage.
    pub fn with_stats_on_stop(mut self, enabled: bool) -> Self {
        self.stats_on_stop = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_stage(&mut self, stage: impl Stage + 'static) -> StageId {
        self.add_boxed_stage(Box::new(stage))
    }

    pub fn add_boxed_stage(&mut self, stage: Box<dyn Stage>) -> StageId {
        let id = StageId(self.nodes.len());
        let name = stage.name();
        debug!(stage = %name, id = id.0, "Stage added");
        self.nodes.push(StageNode {
            stage,
            name,
            successors: Vec::new(),
            input_filter: None,
            output_filter: None,
            stats: StageStats::default(),
        });
        id
    }

    /// Route every frame `from` emits to `to` as well.
    pub fn connect(&mut self, from: StageId, to: StageId) -> Result<(), PipelineError> {
        self.check(to)?;
        self.node_mut(from)?.successors.push(to);
        Ok(())
    }

    /// Mark a stage as an entry point; `process` feeds every entry.
    pub fn add_entry(&mut self, id: StageId) -> Result<(), PipelineError> {
        self.check(id)?;
        if !self.entries.contains(&id) {
            self.entries.push(id);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[StageId] {
        &self.entries
    }

    /// Add `stages` in order, connect each adjacent pair and make the first an
    /// entry. Returns the first and last ids.
    pub fn add_linear_pipeline(
        &mut self,
        stages: Vec<Box<dyn Stage>>,
    ) -> Result<(StageId, StageId), PipelineError> {
        if stages.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }

        let ids: Vec<StageId> = stages
            .into_iter()
            .map(|stage| self.add_boxed_stage(stage))
            .collect();
        for pair in ids.windows(2) {
            self.connect(pair[0], pair[1])?;
        }

        let (first, last) = (ids[0], ids[ids.len() - 1]);
        self.add_entry(first)?;
        Ok((first, last))
    }

    /// Frames rejected by `filter` are not processed, but the arrival still counts.
    pub fn set_input_filter(
        &mut self,
        id: StageId,
        filter: impl FnMut(&Frame) -> bool + 'static,
    ) -> Result<(), PipelineError> {
        self.node_mut(id)?.input_filter = Some(Box::new(filter));
        Ok(())
    }

    /// Frames rejected by `filter` are not forwarded to successors.
    pub fn set_output_filter(
        &mut self,
        id: StageId,
        filter: impl FnMut(&Frame) -> bool + 'static,
    ) -> Result<(), PipelineError> {
        self.node_mut(id)?.output_filter = Some(Box::new(filter));
        Ok(())
    }

    pub fn stage_name(&self, id: StageId) -> Result<&str, PipelineError> {
        self.node(id).map(|node| node.name.as_str())
    }

    pub fn successors(&self, id: StageId) -> Result<&[StageId], PipelineError> {
        self.node(id).map(|node| node.successors.as_slice())
    }

    #[instrument(skip(self), fields(stages = self.nodes.len()))]
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.running {
            return Err(PipelineError::AlreadyRunning);
        }
        if self.entries.is_empty() {
            return Err(PipelineError::NoEntryStage);
        }
        self.running = true;
        info!(entries = self.entries.len(), "Pipeline started");
        Ok(())
    }

    /// Log statistics and call every stage's shutdown hook.
    ///
    /// All hooks run even if one fails; the first failure is returned.
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        if !self.running {
            return Err(PipelineError::NotRunning);
        }
        self.running = false;
        self.queue.clear();

        if self.stats_on_stop {
            for report in self.stats() {
                info!(stage = %report.name, calls = report.count, "{}", report.summary_line());
            }
        }

        let mut first_error = None;
        for node in &mut self.nodes {
            if let Err(source) = node.stage.shutdown() {
                error!(stage = %node.name, error = %source, "Stage shutdown failed");
                if first_error.is_none() {
                    first_error = Some(PipelineError::Shutdown {
                        stage: node.name.clone(),
                        source,
                    });
                }
            }
        }

        info!(failures = self.failures.len(), "Pipeline stopped");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Start, run `body`, then stop even if `body` failed.
    ///
    /// An error from `body` takes precedence over a shutdown error.
    pub fn run<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        self.start()?;
        let result = body(self);
        let stopped = if self.running { self.stop() } else { Ok(()) };
        let value = result?;
        stopped?;
        Ok(value)
    }

    /// Feed `frame` to every entry stage and drain the queue.
    pub fn process(&mut self, frame: Frame) -> Result<(), PipelineError> {
        self.ensure_running()?;
        let entries = self.entries.clone();
        fan_out(&mut self.queue, &entries, frame);
        self.drain()
    }

    /// Feed `frame` to one specific stage and drain the queue.
    pub fn process_at(&mut self, id: StageId, frame: Frame) -> Result<(), PipelineError> {
        self.ensure_running()?;
        self.check(id)?;
        self.queue.push_back((id, frame));
        self.drain()
    }

    pub fn process_list(
        &mut self,
        frames: impl IntoIterator<Item = Frame>,
    ) -> Result<usize, PipelineError> {
        let mut count = 0;
        for frame in frames {
            self.process(frame)?;
            count += 1;
        }
        Ok(count)
    }

    /// Process every frame a source yields. Recoverable source errors are logged
    /// and recorded as failures; anything else ends the run.
    ///
    /// Returns the number of frames submitted.
    pub fn process_stream<I>(&mut self, frames: I) -> Result<usize, PipelineError>
    where
        I: IntoIterator<Item = Result<Frame, FrameError>>,
    {
        self.ensure_running()?;
        let mut count = 0;
        for item in frames {
            match item {
                Ok(frame) => {
                    self.process(frame)?;
                    count += 1;
                }
                Err(err) if err.is_recoverable() => {
                    warn!(
                        location = err.location().map(Location::as_str).unwrap_or(""),
                        error = %err,
                        "Skipping frame from source"
                    );
                    self.failures.push(FrameFailure {
                        location: err.location().cloned(),
                        stage: None,
                        message: err.to_string(),
                    });
                }
                Err(err) => return Err(PipelineError::Source(err)),
            }
        }
        Ok(count)
    }

    fn drain(&mut self) -> Result<(), PipelineError> {
        let Self {
            nodes,
            queue,
            cache,
            failures,
            ..
        } = self;

        while let Some((id, frame)) = queue.pop_front() {
            let node = &mut nodes[id.0];
            let location = frame.location().cloned();
            let mut ctx = StageContext::new(cache.as_ref());

            let started = Instant::now();
            let accepted = match node.input_filter.as_mut() {
                Some(filter) => filter(&frame),
                None => true,
            };
            let result = if accepted {
                trace!(stage = %node.name, frame = %frame.describe(), "Processing frame");
                node.stage.process(frame, &mut ctx)
            } else {
                trace!(stage = %node.name, "Input filter rejected frame");
                Ok(())
            };
            node.stats.record(started.elapsed());

            for output in ctx.take_outputs() {
                if let Some(filter) = node.output_filter.as_mut() {
                    if !filter(&output) {
                        continue;
                    }
                }
                fan_out(queue, &node.successors, output);
            }

            match result {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    warn!(
                        stage = %node.name,
                        location = location.as_ref().map(Location::as_str).unwrap_or(""),
                        error = %err,
                        "Skipping frame"
                    );
                    failures.push(FrameFailure {
                        location,
                        stage: Some(node.name.clone()),
                        message: err.to_string(),
                    });
                }
                Err(source) => {
                    queue.clear();
                    error!(stage = %node.name, error = %source, "Stage failed, halting");
                    return Err(PipelineError::Stage {
                        stage: node.name.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> Vec<StageReport> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(id, node)| StageReport::new(id, node.name.clone(), &node.stats))
            .collect()
    }

    pub fn stage_stats(&self, id: StageId) -> Result<&StageStats, PipelineError> {
        self.node(id).map(|node| &node.stats)
    }

    /// Write the per-stage statistics table.
    pub fn print_stats(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "{}", format_stats_table(&self.stats()))
    }

    /// Recoverable failures recorded since the pipeline was built.
    pub fn failures(&self) -> &[FrameFailure] {
        &self.failures
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    fn ensure_running(&self) -> Result<(), PipelineError> {
        if self.running {
            Ok(())
        } else {
            Err(PipelineError::NotRunning)
        }
    }

    fn check(&self, id: StageId) -> Result<(), PipelineError> {
        self.node(id).map(|_| ())
    }

    fn node(&self, id: StageId) -> Result<&StageNode, PipelineError> {
        self.nodes
            .get(id.0)
            .ok_or(PipelineError::UnknownStage(id.0))
    }

    fn node_mut(&mut self, id: StageId) -> Result<&mut StageNode, PipelineError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(PipelineError::UnknownStage(id.0))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if self.running {
            if let Err(err) = self.stop() {
                warn!(error = %err, "Pipeline stop during drop failed");
            }
        }
    }
}

/// Enqueue `frame` for each target; the last target takes ownership.
fn fan_out(queue: &mut VecDeque<(StageId, Frame)>, targets: &[StageId], frame: Frame) {
    if let Some((last, rest)) = targets.split_last() {
        for &target in rest {
            queue.push_back((target, frame.clone()));
        }
        queue.push_back((*last, frame));
    }
}
