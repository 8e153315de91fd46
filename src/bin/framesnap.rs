use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesnap::{
    CompletionReason, ControllerSettings, ExtractOptions, ExtractionEvent, ExtractionJob,
    ExtractionWorker, FfmpegLogLevel, StopHandle, TerminalResult, writer::DEFAULT_JPEG_QUALITY,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;
use signal_hook::{SigId, consts, low_level};

const CLI_AFTER_HELP: &str = "Examples:\n  framesnap extract holiday.mp4 --out frames --every 10 --progress\n  framesnap config --export-dir ~/Pictures/frames --every 5\n  framesnap completions zsh > _framesnap";

#[derive(Debug, Parser)]
#[command(
    name = "framesnap",
    version,
    about = "Extract every Nth frame of a video as numbered JPEG files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract frames from a video into <out>/<video name>/.
    #[command(
        about = "Extract video frames",
        after_help = "Examples:\n  framesnap extract input.mp4\n  framesnap extract input.mp4 --out frames --every 30 --quality 85 --save-defaults"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Output root directory. Defaults to the saved export directory.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Keep every Nth frame. Defaults to the saved interval.
        #[arg(long)]
        every: Option<u64>,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Remember --out and --every as the new defaults.
        #[arg(long)]
        save_defaults: bool,
    },

    /// Show or change the saved defaults.
    #[command(about = "Show or change saved defaults")]
    Config {
        /// New default output root directory.
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// New default frame interval.
        #[arg(long)]
        every: Option<u64>,
        /// Print the settings as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let level = if global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        framesnap::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

fn progress_bar(enabled: bool) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos:>3}% [{msg}]")?;
    bar.set_style(style.progress_chars("##-"));
    Ok(Some(bar))
}

/// Runs an action on termination signals (e.g. `SIGINT`) while alive.
///
/// Extraction installs one that requests a stop, so Ctrl-C finishes the
/// current frame and still prints the summary instead of killing the
/// process mid-write.
struct StopOnSignal {
    sig_ids: Vec<SigId>,
}

impl StopOnSignal {
    /// `on_signal` must be async-signal-safe.
    fn install<F>(on_signal: F) -> Result<Self, std::io::Error>
    where
        F: Fn() + Clone + Send + Sync + 'static,
    {
        let mut guard = Self {
            sig_ids: Vec::with_capacity(consts::TERM_SIGNALS.len()),
        };
        for &signal in consts::TERM_SIGNALS {
            // SAFETY: callers pass handlers that only touch atomics.
            let sig_id = unsafe { low_level::register(signal, on_signal.clone()) }?;
            guard.sig_ids.push(sig_id);
        }
        Ok(guard)
    }

    fn stopping(stop: StopHandle) -> Result<Self, std::io::Error> {
        // `request_stop` is a single atomic store.
        Self::install(move || stop.request_stop())
    }
}

impl Drop for StopOnSignal {
    fn drop(&mut self) {
        for sig_id in self.sig_ids.drain(..) {
            low_level::unregister(sig_id);
        }
    }
}

fn extract(
    global: &GlobalOptions,
    input: PathBuf,
    out: Option<PathBuf>,
    every: Option<u64>,
    quality: u8,
    save_defaults: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = ControllerSettings::load();
    let out = out.unwrap_or_else(|| settings.export_dir.clone());
    let every = every.unwrap_or(settings.save_interval);

    if input.as_os_str().is_empty() {
        return Err("no video file selected".into());
    }
    if out.as_os_str().is_empty() {
        return Err("no output directory selected".into());
    }

    let job = ExtractionJob::new(&input, &out, every)?;

    if save_defaults {
        settings.export_dir = out.clone();
        settings.save_interval = every;
        settings.save()?;
    }

    log::info!("Extracting every {every} frame(s) of {}", input.display());

    let mut worker = ExtractionWorker::with_options(ExtractOptions::new().with_jpeg_quality(quality));
    let events = worker.start(job)?;
    let _signals = StopOnSignal::stopping(worker.stop_handle())?;
    let bar = progress_bar(global.progress)?;

    let mut outcome: Option<TerminalResult> = None;
    for event in events {
        match event {
            ExtractionEvent::Progress(update) => {
                if let Some(bar) = &bar {
                    bar.set_position(u64::from(update.percent));
                    bar.set_message(update.label);
                }
            }
            ExtractionEvent::Finished(result) => outcome = Some(result),
        }
    }
    worker.wait();

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let result = outcome.ok_or("extraction worker exited without reporting a result")?;
    if !result.success {
        return Err(result.message.into());
    }

    match &result.reason {
        CompletionReason::Cancelled => {
            println!(
                "{} {}",
                "stopped:".yellow().bold(),
                result.message.as_str().yellow()
            );
        }
        reason => {
            if let CompletionReason::Interrupted(error) = reason {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("extraction stopped early: {error}").yellow()
                );
            }
            println!(
                "{} {}",
                "success:".green().bold(),
                result.message.as_str().green()
            );
        }
    }
    println!("{}", result.output_path);
    Ok(())
}

fn config(
    export_dir: Option<PathBuf>,
    every: Option<u64>,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = ControllerSettings::load();
    let changed = export_dir.is_some() || every.is_some();

    if let Some(dir) = export_dir {
        settings.export_dir = dir;
    }
    if let Some(every) = every {
        if every == 0 {
            return Err("--every must be greater than 0".into());
        }
        settings.save_interval = every;
    }
    if changed {
        settings.save()?;
    }

    if as_json {
        let payload = json!({
            "export_dir": settings.export_dir,
            "save_interval": settings.save_interval,
            "path": ControllerSettings::default_path(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Export directory: {}", settings.export_dir.display());
        println!("Save interval: {}", settings.save_interval);
        println!(
            "Settings file: {}",
            ControllerSettings::default_path().display()
        );
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Extract {
            input,
            out,
            every,
            quality,
            save_defaults,
        } => extract(&cli.global, input, out, every, quality, save_defaults)?,
        Commands::Config {
            export_dir,
            every,
            json,
        } => config(export_dir, every, json)?,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesnap", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
