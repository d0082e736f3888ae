use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc;

use clap::Parser;
use results_compiler::logging;
use results_compiler::settings::Settings;
use results_compiler::shell::terminal::{self, ConsolePresenter};
use results_compiler::shell::{Form, Shell, Worker};
use results_compiler::{Result, ToolError};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;
    let error_log = logging::init(&settings.log_level, &settings.error_log)?;

    let (sender, receiver) = mpsc::channel();
    let worker = Worker::spawn(settings, sender.clone())?;
    terminal::spawn_input_reader(BufReader::new(std::io::stdin()), sender)?;

    let presenter = ConsolePresenter::new(std::io::stdout());
    let form = Form::new(cli.source, cli.destination);
    println!("{}", terminal::HELP);
    Shell::new(form, presenter, error_log, worker).run(receiver);
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Compile the tabs of a Reported Results workbook into one formatted sheet."
)]
struct Cli {
    /// Pre-select the Reported Results workbook.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Pre-select the folder that receives the compiled workbook.
    #[arg(long)]
    destination: Option<PathBuf>,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Console log level when RUST_LOG is not set.
    #[arg(long)]
    log_level: Option<String>,

    /// Location of the error log.
    #[arg(long)]
    error_log: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) if !path.exists() => return Err(ToolError::MissingInput(path.clone())),
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(path) = &self.error_log {
            settings.error_log = path.clone();
        }
        Ok(settings)
    }
}
