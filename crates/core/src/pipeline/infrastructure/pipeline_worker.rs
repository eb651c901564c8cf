use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::pipeline::analyze_frame_use_case::{AnalyzeFrameUseCase, PipelineError};
use crate::pipeline::frame_result::FrameResult;
use crate::shared::frame::Frame;

const DEFAULT_QUEUE_CAPACITY: usize = 4;

type Reply = Sender<Result<FrameResult, PipelineError>>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("analysis worker is no longer running")]
    Gone,
}

/// Owns an [`AnalyzeFrameUseCase`] on a dedicated thread.
///
/// Model handles are not safe for concurrent inference, so every caller
/// goes through one bounded queue and frames are analyzed one at a time.
/// `submit` blocks until its frame has been processed.
pub struct PipelineWorker {
    jobs: Option<Sender<(Frame, Reply)>>,
    handle: Option<JoinHandle<AnalyzeFrameUseCase>>,
}

impl PipelineWorker {
    pub fn spawn(use_case: AnalyzeFrameUseCase) -> Self {
        Self::with_capacity(use_case, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(use_case: AnalyzeFrameUseCase, capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded::<(Frame, Reply)>(capacity.max(1));
        let handle = std::thread::spawn(move || run(use_case, rx));
        Self {
            jobs: Some(tx),
            handle: Some(handle),
        }
    }

    /// Analyzes `frame` on the worker thread and waits for the result.
    pub fn submit(&self, frame: Frame) -> Result<FrameResult, WorkerError> {
        let jobs = self.jobs.as_ref().ok_or(WorkerError::Gone)?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        jobs.send((frame, reply_tx))
            .map_err(|_| WorkerError::Gone)?;
        let result = reply_rx.recv().map_err(|_| WorkerError::Gone)?;
        Ok(result?)
    }

    /// Stops accepting frames, waits for the thread and hands the use case
    /// back (e.g. to read its logger summary).
    pub fn shutdown(mut self) -> Option<AnalyzeFrameUseCase> {
        self.jobs.take();
        self.join()
    }

    fn join(&mut self) -> Option<AnalyzeFrameUseCase> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(use_case) => Some(use_case),
            Err(_) => {
                log::error!("Analysis worker thread panicked");
                None
            }
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        self.jobs.take();
        self.join();
    }
}

fn run(mut use_case: AnalyzeFrameUseCase, jobs: Receiver<(Frame, Reply)>) -> AnalyzeFrameUseCase {
    for (frame, reply) in jobs {
        let result = use_case.execute(&frame);
        if reply.send(result).is_err() {
            log::debug!("Caller stopped waiting for frame {}", frame.index());
        }
    }
    use_case
}
