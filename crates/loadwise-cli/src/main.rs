//! loadwise CLI - Workload analysis for project plans
//!
//! Command-line interface for checking plans, summarizing resource workload,
//! and suggesting task shifts or replacements for overloaded resources.

mod config;
mod diagnostics;
mod output;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use loadwise_core::{ingest, DateRange, Diagnostic, DiagnosticEmitter, PlanRecords, Project};
use loadwise_engine::{AnalysisSession, DisplayMode, OptimizationMode, ResourceFilter};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use diagnostics::{DiagnosticPolicy, ExitCode, JsonEmitter, TerminalEmitter};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "loadwise")]
#[command(author, version, about = "Workload analysis for project plans", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ./loadwise.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Treat warnings as errors and hints as warnings
    #[arg(long, global = true)]
    strict: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

/// Plan file plus the part of it to analyze
#[derive(Args)]
struct ScopeArgs {
    /// Plan file (.json or .toml)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// First day of the analyzed range (defaults to the project start)
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,

    /// Last day of the analyzed range (defaults to the project finish)
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,

    /// Restrict to these resources
    #[arg(short, long = "resource", value_name = "ID")]
    resources: Vec<String>,

    /// Restrict to one resource group
    #[arg(short, long, conflicts_with = "resources")]
    group: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a plan and report dropped or suspicious records
    Check {
        /// Plan file (.json or .toml)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Per-resource workload summary
    Summary {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Show utilization or assigned hours
        #[arg(long, value_enum)]
        display: Option<DisplayArg>,
    },

    /// Per-resource weekly loads
    Weekly {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Ranked workload recommendations
    Recommend {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Suggest task shifts for overloaded weeks
    Optimize {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Largest shift to try, in days (1-30)
        #[arg(long, value_name = "DAYS")]
        max_shift: Option<u32>,

        /// Optimization mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Suggest underutilized resources to take over work
    Replace {
        /// Plan file (.json or .toml)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Overloaded resource to relieve
        #[arg(short, long, value_name = "ID")]
        resource: String,

        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,

        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DisplayArg {
    #[value(alias = "percentage")]
    Percent,
    Hours,
}

impl From<DisplayArg> for DisplayMode {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Percent => DisplayMode::Percentage,
            DisplayArg::Hours => DisplayMode::Hours,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Balance,
    MinimizePeaks,
}

impl From<ModeArg> for OptimizationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Balance => OptimizationMode::Balance,
            ModeArg::MinimizePeaks => OptimizationMode::MinimizePeaks,
        }
    }
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::Failure.into()
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    let out = Output {
        format: cli.format.unwrap_or(config.output.format),
        policy: DiagnosticPolicy {
            strict: cli.strict,
            quiet: cli.quiet,
        },
    };

    match cli.command {
        Commands::Check { file } => {
            let (project, diagnostics) = match load_project(&file)? {
                Loaded::Ready(loaded) => loaded,
                Loaded::Failed(diagnostics) => return out.finish(diagnostics, None),
            };
            let check = CheckReport::from(&project);
            let text = format!(
                "{}: {} task(s), {} resource(s), {} assignment(s), {}\n",
                check.project, check.tasks, check.resources, check.assignments, project.span
            );
            out.finish(diagnostics, Some(Rendered::new("plan", &check, text)?))
        }

        Commands::Summary { scope, display } => {
            let analysis = match Analysis::open(&scope, &config)? {
                Loaded::Ready(analysis) => analysis,
                Loaded::Failed(diagnostics) => return out.finish(diagnostics, None),
            };
            let mode = display.map_or(config.output.display, DisplayMode::from);
            let view = analysis.session.get_summary(analysis.range, &analysis.filter, mode)?;
            let text = output::render_summary(&view);
            out.finish(analysis.diagnostics, Some(Rendered::new("summary", &view, text)?))
        }

        Commands::Weekly { scope } => {
            let analysis = match Analysis::open(&scope, &config)? {
                Loaded::Ready(analysis) => analysis,
                Loaded::Failed(diagnostics) => return out.finish(diagnostics, None),
            };
            let loads = analysis.session.get_weekly_loads(analysis.range, &analysis.filter)?;
            let text = output::render_weekly(&loads);
            out.finish(analysis.diagnostics, Some(Rendered::new("weekly", &loads, text)?))
        }

        Commands::Recommend { scope } => {
            let analysis = match Analysis::open(&scope, &config)? {
                Loaded::Ready(analysis) => analysis,
                Loaded::Failed(diagnostics) => return out.finish(diagnostics, None),
            };
            let rows = analysis.session.aggregation(analysis.range, &analysis.filter)?.summary_rows();
            let recommendations = analysis.session.get_recommendations(&rows);
            let text = output::render_recommendations(&recommendations);
            out.finish(
                analysis.diagnostics,
                Some(Rendered::new("recommendations", &recommendations, text)?),
            )
        }

        Commands::Optimize { scope, max_shift, mode } => {
            let mut config = config;
            if let Some(days) = max_shift {
                config.optimizer.max_shift_days = days;
            }
            if let Some(mode) = mode {
                config.optimizer.mode = mode.into();
            }

            let mut analysis = match Analysis::open(&scope, &config)? {
                Loaded::Ready(analysis) => analysis,
                Loaded::Failed(diagnostics) => return out.finish(diagnostics, None),
            };
            let report = analysis.session.get_shift_suggestions(analysis.range, &analysis.filter)?;
            info!(
                suggestions = report.suggestions.len(),
                unresolved = report.unresolved.len(),
                mode = %config.optimizer.mode,
                "optimization finished"
            );
            analysis.diagnostics.extend(report.diagnostics());
            let text = output::render_shifts(&report);
            out.finish(analysis.diagnostics, Some(Rendered::new("shifts", &report, text)?))
        }

        Commands::Replace { file, resource, from, to } => {
            let scope = ScopeArgs {
                file,
                from,
                to,
                resources: Vec::new(),
                group: None,
            };
            let mut analysis = match Analysis::open(&scope, &config)? {
                Loaded::Ready(analysis) => analysis,
                Loaded::Failed(diagnostics) => return out.finish(diagnostics, None),
            };
            let report = analysis.session.get_replacement_suggestions(&resource, analysis.range)?;
            analysis.diagnostics.extend(report.diagnostics());
            let text = output::render_replacement(&report);
            out.finish(analysis.diagnostics, Some(Rendered::new("replacement", &report, text)?))
        }
    }
}

// ============================================================================
// Plan loading
// ============================================================================

/// Outcome of loading a plan; ingestion failures still carry diagnostics
enum Loaded<T> {
    Ready(T),
    Failed(Vec<Diagnostic>),
}

fn read_plan(path: &Path) -> Result<PlanRecords> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read plan file: {}", path.display()))?;

    let records = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content).with_context(|| format!("Invalid TOML plan: {}", path.display()))?,
        Some("json") => {
            serde_json::from_str(&content).with_context(|| format!("Invalid JSON plan: {}", path.display()))?
        }
        Some(other) => bail!("Unsupported plan format '.{}' (expected .json or .toml)", other),
        None => bail!("Cannot detect plan format of {} (expected .json or .toml)", path.display()),
    };
    Ok(records)
}

fn load_project(path: &Path) -> Result<Loaded<(Project, Vec<Diagnostic>)>> {
    let records = read_plan(path)?;
    debug!(
        tasks = records.tasks.len(),
        resources = records.resources.len(),
        assignments = records.assignments.len(),
        "read plan records"
    );

    match ingest(&records) {
        Ok(ingested) => Ok(Loaded::Ready((ingested.project, ingested.diagnostics))),
        Err(err) => {
            info!(path = %path.display(), "{}", err);
            Ok(Loaded::Failed(err.diagnostics().to_vec()))
        }
    }
}

/// An ingested plan ready for analysis
struct Analysis {
    session: AnalysisSession,
    range: DateRange,
    filter: ResourceFilter,
    diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    fn open(scope: &ScopeArgs, config: &Config) -> Result<Loaded<Self>> {
        let (project, mut diagnostics) = match load_project(&scope.file)? {
            Loaded::Ready(loaded) => loaded,
            Loaded::Failed(diagnostics) => return Ok(Loaded::Failed(diagnostics)),
        };

        let start = scope.from.unwrap_or(project.span.start);
        let end = scope.to.unwrap_or(project.span.end);
        let range = AnalysisSession::range(start, end)?;

        let filter = if !scope.resources.is_empty() {
            ResourceFilter::ids(scope.resources.iter().cloned())
        } else if let Some(group) = &scope.group {
            ResourceFilter::Group(group.clone())
        } else {
            ResourceFilter::All
        };

        debug!(range = %range, filter = %filter, "analysis scope");
        let session = AnalysisSession::new(project).with_options(config.engine_options());
        diagnostics.extend(session.aggregation(range, &filter)?.diagnostics.iter().cloned());

        Ok(Loaded::Ready(Self {
            session,
            range,
            filter,
            diagnostics,
        }))
    }
}

// ============================================================================
// Output
// ============================================================================

#[derive(Serialize)]
struct CheckReport {
    project: String,
    start: NaiveDate,
    finish: NaiveDate,
    tasks: usize,
    resources: usize,
    assignments: usize,
}

impl From<&Project> for CheckReport {
    fn from(project: &Project) -> Self {
        Self {
            project: project.name.clone(),
            start: project.span.start,
            finish: project.span.end,
            tasks: project.tasks.len(),
            resources: project.resources.len(),
            assignments: project.assignments.len(),
        }
    }
}

/// A command result in both output formats
struct Rendered {
    key: &'static str,
    json: serde_json::Value,
    text: String,
}

impl Rendered {
    fn new<T: Serialize>(key: &'static str, value: &T, text: String) -> Result<Self> {
        Ok(Self {
            key,
            json: serde_json::to_value(value).context("Failed to serialize result")?,
            text,
        })
    }
}

struct Output {
    format: OutputFormat,
    policy: DiagnosticPolicy,
}

impl Output {
    /// Diagnostics go to stderr in text mode; JSON mode prints one document
    fn finish(&self, diagnostics: Vec<Diagnostic>, result: Option<Rendered>) -> Result<ExitCode> {
        match self.format {
            OutputFormat::Text => {
                let mut emitter = TerminalEmitter::new(io::stderr(), self.policy);
                for diagnostic in diagnostics {
                    emitter.emit(diagnostic);
                }
                if let Some(result) = result {
                    print!("{}", result.text);
                }
                Ok(emitter.exit_code())
            }
            OutputFormat::Json => {
                let mut emitter = JsonEmitter::new(self.policy);
                for diagnostic in diagnostics {
                    emitter.emit(diagnostic);
                }

                let mut document = serde_json::Map::new();
                document.insert("diagnostics".to_string(), emitter.to_json_value());
                if let Some(result) = result {
                    document.insert(result.key.to_string(), result.json);
                }
                println!("{}", serde_json::to_string_pretty(&document)?);
                Ok(emitter.exit_code())
            }
        }
    }
}
