//! Line-oriented front end for the compile form.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::error::Result;
use crate::pipeline::CompileReport;

use super::{Failure, Form, FormEvent, FormState, Presenter, RunRequest, ShellMessage};

pub const HELP: &str = "\
Commands:
  source <path>        Reported Results workbook (.xlsx)
  destination <path>   folder that receives the compiled workbook
  go                   compile
  status               show the current inputs
  exit                 close the form";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Form(FormEvent),
    Help,
}

/// Parses one input line. Blank lines yield `Ok(None)`; unknown commands
/// yield a message for the user.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, argument) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, unquote(rest.trim())),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "source" | "src" => Command::Form(FormEvent::SourceSelected(path_argument(word, argument)?)),
        "destination" | "dest" => {
            Command::Form(FormEvent::DestinationSelected(path_argument(word, argument)?))
        }
        "go" => Command::Form(FormEvent::Go),
        "status" => Command::Form(FormEvent::Status),
        "exit" | "quit" => Command::Form(FormEvent::Exit),
        "help" | "?" => Command::Help,
        other => return Err(format!("unknown command '{other}', type 'help' for a list")),
    };
    Ok(Some(command))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(value)
}

fn path_argument(word: &str, argument: &str) -> std::result::Result<PathBuf, String> {
    if argument.is_empty() {
        Err(format!("usage: {word} <path>"))
    } else {
        Ok(PathBuf::from(argument))
    }
}

/// Reads commands from `input` on a background thread and forwards them to
/// the shell. End of input closes the form.
pub fn spawn_input_reader<R>(input: R, messages: Sender<ShellMessage>) -> Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("form-input".into())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(%error, "failed to read form input");
                        break;
                    }
                };
                let message = match parse_command(&line) {
                    Ok(None) => continue,
                    Ok(Some(Command::Form(event))) => ShellMessage::Input(event),
                    Ok(Some(Command::Help)) => ShellMessage::Notice(HELP.to_string()),
                    Err(message) => ShellMessage::Notice(message),
                };
                if messages.send(message).is_err() {
                    return;
                }
            }
            let _ = messages.send(ShellMessage::Input(FormEvent::Closed));
        })?;
    Ok(handle)
}

/// Presenter that writes to a terminal stream.
pub struct ConsolePresenter<W> {
    out: W,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        let written = self
            .out
            .write_fmt(args)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        if let Err(error) = written {
            warn!(%error, "failed to write to console");
        }
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn show_form(&mut self, form: &Form) {
        let describe = |path: Option<&std::path::Path>| {
            path.map_or_else(|| "<not selected>".to_string(), |path| path.display().to_string())
        };
        self.emit(format_args!(
            "Reported Results Workbook:   {}\nCompiled Workbook Directory: {}",
            describe(form.source()),
            describe(form.destination())
        ));
        match form.state() {
            FormState::Idle => self.emit(format_args!("[idle] choose both inputs")),
            FormState::Ready => self.emit(format_args!("[ready] type 'go' to compile")),
            FormState::Running => self.emit(format_args!("[running] compiling...")),
            FormState::Terminated => self.emit(format_args!("[closed]")),
        }
    }

    fn show_busy(&mut self, request: &RunRequest) {
        self.emit(format_args!(
            "Compiling {} into {}...",
            request.source.display(),
            request.destination.display()
        ));
    }

    fn show_notice(&mut self, message: &str) {
        self.emit(format_args!("{message}"));
    }

    fn show_done(&mut self, report: &CompileReport) {
        let folder = report
            .output
            .parent()
            .map_or_else(|| report.output.display().to_string(), |dir| dir.display().to_string());
        self.emit(format_args!(
            "Done! {} rows from {} sheet(s).\nWorkbook can be found here\n{folder}",
            report.rows,
            report.sheets.len()
        ));
    }

    fn show_error(&mut self, failure: &Failure) {
        self.emit(format_args!(
            "Error ({}): error log can be found here: {}\n{}",
            failure.kind,
            failure.error_log.display(),
            failure.report
        ));
    }
}
