use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ff_core::{trace_entry, CaptureMode, DigestEntry, FlowError, Journal, LogLevel, PhaseStatus};
use ff_runner::{
    doctor, Config, ElevationPolicy, Environment, PhaseState, Pipeline, PipelineEvent, RunOutcome, RunRequest, StatusBoard,
};
use ff_tools::{ToolId, ToolManager};

#[derive(Parser)]
#[command(name = "forensicflow", version)]
struct Cli {
    /// Config file (default: ~/.forensicflow/forensicflow.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file
    Init,

    /// Check host, privileges, evidence root and tools
    Doctor {
        #[arg(long)]
        elevation: Option<String>,
    },

    /// Run the four-phase acquisition pipeline
    Run {
        /// selective | complete | none
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        device: Option<String>,
        #[arg(long)]
        evidence_root: Option<String>,
        /// strict | permissive
        #[arg(long)]
        elevation: Option<String>,
    },

    /// Inspect or install the external forensic tools
    Tools {
        #[command(subcommand)]
        cmd: ToolsCommand,
    },

    /// Print MD5 and SHA-256 of files
    Hash { files: Vec<PathBuf> },

    /// Compare the digests of an image and its copy
    Verify { original: PathBuf, copy: PathBuf },
}

#[derive(Subcommand)]
enum ToolsCommand {
    List,
    Install {
        /// winpmem | dd | volatility | tsk | ftk_imager (default: every missing tool)
        #[arg(long)]
        tool: Option<String>,
    },
}

/// Prints journal lines for the short synchronous commands.
struct ConsoleJournal;

impl Journal for ConsoleJournal {
    fn log(&self, level: LogLevel, message: &str) {
        trace_entry(level, message);
        println!("[{}] {}", level.as_str(), message);
    }
}

fn elevation(arg: Option<String>, cfg: &Config) -> anyhow::Result<ElevationPolicy> {
    match arg {
        Some(s) => ElevationPolicy::parse(&s).ok_or_else(|| anyhow!("unknown elevation policy {:?}", s)),
        None => cfg.elevation_policy(),
    }
}

fn status_word(state: PhaseState) -> &'static str {
    match state {
        PhaseState::Running => "running",
        PhaseState::Done(PhaseStatus::Success) => "done",
        PhaseState::Done(PhaseStatus::SoftFailure) => "done with warnings",
        PhaseState::Done(PhaseStatus::HardFailure) => "FAILED",
        PhaseState::Skipped => "skipped",
    }
}

fn run_pipeline(cfg: Config, request: RunRequest) -> anyhow::Result<i32> {
    println!("Capture mode: {}", request.mode.label());
    let handle = Pipeline::new(cfg, request).spawn()?;
    let cancel = handle.cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("stop requested; the pipeline halts before the next phase");
        cancel.cancel();
    })
    .context("install Ctrl-C handler")?;

    let mut board = StatusBoard::default();
    for event in handle.events.iter() {
        board.apply(&event);
        match &event {
            PipelineEvent::Log(entry) => println!("{}", entry.to_line()),
            PipelineEvent::Phase { phase, state } => {
                println!(">> phase {} {}: {}", phase.index() + 1, phase.title(), status_word(*state))
            }
            PipelineEvent::Finished(_) => {}
        }
    }
    let report = handle.join()?;

    println!();
    println!("Case {} ({:?})", report.case.id.as_str(), report.case.state);
    println!("Evidence: {}", report.case.root.display());
    println!("Warnings: {}  Errors: {}", board.warnings, board.errors);
    let code = match &report.outcome {
        RunOutcome::Completed => {
            println!("Analysis completed.");
            0
        }
        RunOutcome::Stopped { before } => {
            println!("Analysis stopped by user before phase {} ({}).", before.index() + 1, before.title());
            130
        }
        RunOutcome::Failed { phase, diagnostic, .. } => {
            if report.outcome.is_integrity_mismatch() {
                println!("!!! INTEGRITY MISMATCH: the working copy does not match the original image.");
                println!("!!! The evidence must not be analyzed; see the chain-of-custody record.");
            }
            println!("Analysis failed in phase {} ({}): {}", phase.index() + 1, phase.title(), diagnostic);
            1
        }
    };
    Ok(code)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match cli.cmd {
        Command::Init => {
            if config_path.exists() {
                println!("Config already present at {}", config_path.display());
            } else {
                Config::default_for_host().save_to(&config_path)?;
                println!("Wrote default config to {}", config_path.display());
            }
        }
        Command::Doctor { elevation: arg } => {
            let cfg = Config::load_or_init(&config_path)?;
            let policy = elevation(arg, &cfg)?;
            let report = doctor(&cfg, policy, &Environment::detect())?;
            println!("OS: {}  elevated: {}", report.environment.os, report.environment.elevated);
            for w in &report.warnings {
                println!("warning: {}", w);
            }
            println!("Evidence root: {}", report.evidence_root.display());
            for t in &report.tools {
                match &t.path {
                    Some(p) => println!("- {:<24} {}", t.display_name, p.display()),
                    None => println!("- {:<24} missing (install: {})", t.display_name, t.install),
                }
            }
            println!("OK");
        }
        Command::Run { mode, device, evidence_root, elevation: arg } => {
            let mut cfg = Config::load_or_init(&config_path)?;
            if let Some(root) = evidence_root {
                cfg.case.evidence_root = root;
            }
            let mut request = RunRequest::from_config(&cfg)?;
            if let Some(m) = mode {
                request.mode = CaptureMode::parse(&m).ok_or_else(|| anyhow!("unknown capture mode {:?}", m))?;
            }
            if let Some(d) = device {
                request.device = d;
            }
            request.elevation = elevation(arg, &cfg)?;
            let code = run_pipeline(cfg, request)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Command::Tools { cmd } => {
            let cfg = Config::load_or_init(&config_path)?;
            let locator = cfg.locator();
            let manager = ToolManager::new(&locator, &ConsoleJournal);
            match cmd {
                ToolsCommand::List => {
                    println!("Tools root: {}", locator.tools_root().display());
                    for t in manager.status() {
                        let where_ = t.path.map(|p| p.display().to_string()).unwrap_or_else(|| "missing".into());
                        println!("- {:<12} {:<24} [{}] {}", t.id.key(), t.display_name, t.install, where_);
                    }
                }
                ToolsCommand::Install { tool: Some(key) } => {
                    let id = ToolId::parse(&key).ok_or_else(|| anyhow!("unknown tool {:?}", key))?;
                    let path = manager.install(id)?;
                    println!("Installed {} at {}", id, path.display());
                }
                ToolsCommand::Install { tool: None } => {
                    let missing = manager.ensure_all(true).into_iter().filter(|t| !t.available()).count();
                    println!("{} tool(s) still missing", missing);
                }
            }
        }
        Command::Hash { files } => {
            let entries: Vec<DigestEntry> = files
                .iter()
                .map(|p| DigestEntry { name: p.display().to_string(), digests: ff_digest::digest_or_error(p) })
                .collect();
            print!("{}", ff_evidence::render_digest_table("FILE DIGESTS", &entries));
            if entries.iter().any(|e| e.digests.is_err()) {
                std::process::exit(1);
            }
        }
        Command::Verify { original, copy } => {
            let expected = ff_digest::digest_file(&original).with_context(|| format!("digest {}", original.display()))?;
            match ff_capture::verify_copy(&expected, &copy) {
                Ok(d) => {
                    println!("VERIFIED - digests match");
                    println!("MD5:    {}", d.md5);
                    println!("SHA256: {}", d.sha256);
                }
                Err(e @ FlowError::IntegrityMismatch { .. }) => {
                    println!("MISMATCH - {}", e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
