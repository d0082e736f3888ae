use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info_span};

use crate::error::{Result, ToolError};
use crate::pipeline::{self, CompileReport};
use crate::settings::Settings;

use super::ShellMessage;

/// Inputs of one compilation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Background thread that runs compilations one at a time and posts each
/// outcome back to the shell.
pub struct Worker {
    requests: Option<Sender<RunRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Starts a worker running the real pipeline with `settings`.
    pub fn spawn(settings: Settings, results: Sender<ShellMessage>) -> Result<Self> {
        Self::spawn_with(results, move |request| {
            pipeline::compile_workbook(&request.source, &request.destination, &settings)
        })
    }

    /// Starts a worker running `job` for every request.
    pub fn spawn_with<F>(results: Sender<ShellMessage>, mut job: F) -> Result<Self>
    where
        F: FnMut(&RunRequest) -> Result<CompileReport> + Send + 'static,
    {
        let (requests, inbox) = mpsc::channel::<RunRequest>();
        let handle = thread::Builder::new()
            .name("pipeline".into())
            .spawn(move || {
                for request in inbox {
                    let span = info_span!("run", source = %request.source.display());
                    let _entered = span.enter();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&request)))
                        .unwrap_or_else(|payload| Err(ToolError::Panicked(panic_message(payload))));
                    if results.send(ShellMessage::Finished(outcome)).is_err() {
                        debug!("shell gone, dropping run outcome");
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests: Some(requests),
            handle: Some(handle),
        })
    }

    /// Queues a run.
    pub fn submit(&self, request: RunRequest) -> Result<()> {
        self.requests
            .as_ref()
            .ok_or(ToolError::WorkerUnavailable)?
            .send(request)
            .map_err(|_| ToolError::WorkerUnavailable)
    }

    /// Stops accepting requests and waits for the run in flight, if any.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                debug!("pipeline thread panicked during shutdown");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
