//! The compile form: two inputs, a "Go" trigger and an exit.
//!
//! The shell owns the form state and consumes a single message queue fed by
//! the front end (user events) and by the [`Worker`] (run outcomes), so the
//! form stays responsive while a compilation runs.

pub mod terminal;
pub mod worker;

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use tracing::{error, info};

use crate::error::{FailureKind, Result, ToolError};
use crate::logging::ErrorLog;
use crate::pipeline::CompileReport;

pub use worker::{RunRequest, Worker};

/// Lifecycle of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// At least one input is missing.
    Idle,
    /// Both inputs are chosen.
    Ready,
    /// A compilation is in flight.
    Running,
    /// The form was closed.
    Terminated,
}

/// User actions on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    SourceSelected(PathBuf),
    DestinationSelected(PathBuf),
    Go,
    Status,
    Exit,
    Closed,
}

/// Everything the shell reacts to.
#[derive(Debug)]
pub enum ShellMessage {
    Input(FormEvent),
    /// Informational text from the front end, such as help output.
    Notice(String),
    Finished(Result<CompileReport>),
}

/// Input values and run flags of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    running: bool,
    terminated: bool,
}

impl Form {
    /// Creates a form, optionally pre-filled.
    pub fn new(source: Option<PathBuf>, destination: Option<PathBuf>) -> Self {
        Self {
            source,
            destination,
            ..Self::default()
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn state(&self) -> FormState {
        if self.terminated {
            FormState::Terminated
        } else if self.running {
            FormState::Running
        } else if self.source.is_some() && self.destination.is_some() {
            FormState::Ready
        } else {
            FormState::Idle
        }
    }

    fn request(&self) -> Option<RunRequest> {
        Some(RunRequest {
            source: self.source.clone()?,
            destination: self.destination.clone()?,
        })
    }
}

/// A failed run as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub report: String,
    pub error_log: PathBuf,
}

/// Output side of the form.
pub trait Presenter {
    /// Called whenever inputs or state change, and on request.
    fn show_form(&mut self, form: &Form);

    /// A run was handed to the worker.
    fn show_busy(&mut self, request: &RunRequest);

    /// Informational message.
    fn show_notice(&mut self, message: &str);

    /// Confirmation popup after a successful run.
    fn show_done(&mut self, report: &CompileReport);

    /// Error dialog after a failed run.
    fn show_error(&mut self, failure: &Failure);
}

/// Event loop of the form.
pub struct Shell<P> {
    form: Form,
    presenter: P,
    error_log: ErrorLog,
    worker: Worker,
}

impl<P: Presenter> Shell<P> {
    pub fn new(form: Form, presenter: P, error_log: ErrorLog, worker: Worker) -> Self {
        Self {
            form,
            presenter,
            error_log,
            worker,
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Processes messages until the form is closed, then waits for any run
    /// still in flight and reports it. Returns the presenter.
    pub fn run(mut self, messages: Receiver<ShellMessage>) -> P {
        self.presenter.show_form(&self.form);

        while self.form.state() != FormState::Terminated {
            let message = messages
                .recv()
                .unwrap_or(ShellMessage::Input(FormEvent::Closed));
            self.handle(message);
        }

        self.worker.shutdown();
        for message in messages.try_iter() {
            if let ShellMessage::Finished(outcome) = message {
                self.finish(outcome);
            }
        }

        self.presenter
    }

    /// Applies one message to the form.
    pub fn handle(&mut self, message: ShellMessage) {
        match message {
            ShellMessage::Input(event) => self.handle_event(event),
            ShellMessage::Notice(text) => self.presenter.show_notice(&text),
            ShellMessage::Finished(outcome) => {
                self.form.running = false;
                self.finish(outcome);
                self.presenter.show_form(&self.form);
            }
        }
    }

    fn handle_event(&mut self, event: FormEvent) {
        match event {
            FormEvent::SourceSelected(path) => {
                self.form.source = Some(path);
                self.presenter.show_form(&self.form);
            }
            FormEvent::DestinationSelected(path) => {
                self.form.destination = Some(path);
                self.presenter.show_form(&self.form);
            }
            FormEvent::Go => self.go(),
            FormEvent::Status => self.presenter.show_form(&self.form),
            FormEvent::Exit | FormEvent::Closed => {
                self.form.terminated = true;
                self.presenter.show_form(&self.form);
            }
        }
    }

    fn go(&mut self) {
        match self.form.state() {
            FormState::Running => self
                .presenter
                .show_notice("A compilation is already running, please wait."),
            FormState::Terminated => {}
            FormState::Idle | FormState::Ready => {
                let Some(request) = self.form.request() else {
                    self.presenter.show_notice(
                        "Select a Reported Results workbook and a destination folder first.",
                    );
                    return;
                };
                match self.worker.submit(request.clone()) {
                    Ok(()) => {
                        self.form.running = true;
                        self.presenter.show_busy(&request);
                        self.presenter.show_form(&self.form);
                    }
                    Err(error) => self.fail(error),
                }
            }
        }
    }

    fn finish(&mut self, outcome: Result<CompileReport>) {
        match outcome {
            Ok(report) => {
                info!(output = %report.output.display(), rows = report.rows, "compilation finished");
                self.presenter.show_done(&report);
            }
            Err(error) => self.fail(error),
        }
    }

    fn fail(&mut self, failure: ToolError) {
        let failure = Failure {
            kind: failure.kind(),
            report: failure.report(),
            error_log: self.error_log.path().to_path_buf(),
        };
        error!(kind = %failure.kind, "compilation failed\n{}", failure.report);
        self.presenter.show_error(&failure);
    }
}
