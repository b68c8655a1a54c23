use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use jgi_portal_fetch::app::{
    self, App, AutoAnswer, Confirm, DownloadPlan, ProgressSink, SubmitResult,
};
use jgi_portal_fetch::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use jgi_portal_fetch::domain::{Category, RawReadsGate};
use jgi_portal_fetch::error::PortalError;
use jgi_portal_fetch::jgi::JgiHttpClient;
use jgi_portal_fetch::manifest;
use jgi_portal_fetch::output::{ConsoleOutput, JsonOutput, OutputMode};
use jgi_portal_fetch::prompt::TerminalPrompt;

const TOKEN_ENV: &str = "JGI_TOKEN";

#[derive(Parser)]
#[command(name = "jgi-fetch")]
#[command(about = "Collect JGI portal file manifests per taxon and request archived files")]
#[command(version, author)]
struct Cli {
    /// Print JSON results and never prompt.
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Search the portal for each taxon and write manifest and metadata tables")]
    Collect(CollectArgs),
    #[command(about = "Request restore of the files listed in a manifest")]
    Submit(SubmitArgs),
    #[command(about = "Show how a manifest would be split into restore requests")]
    Plan(PlanArgs),
}

#[derive(Args)]
struct CollectArgs {
    /// Tab-separated file with taxon oids in the first column.
    #[arg(long)]
    tsv: Utf8PathBuf,

    #[arg(long)]
    output: Utf8PathBuf,

    #[arg(long)]
    metadata_output: Utf8PathBuf,

    #[arg(long, value_enum)]
    exclude: Vec<Category>,

    #[arg(long)]
    no_bins: bool,

    #[arg(long)]
    no_assemblies: bool,

    #[arg(long)]
    no_reads: bool,

    #[arg(long, value_enum)]
    raw_reads_gate: Option<RawReadsGate>,

    /// Request the collected files right away.
    #[arg(long)]
    submit: bool,

    #[command(flatten)]
    request: RequestArgs,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args)]
struct SubmitArgs {
    #[arg(long)]
    manifest: Utf8PathBuf,

    #[command(flatten)]
    request: RequestArgs,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args)]
struct PlanArgs {
    #[arg(long)]
    manifest: Utf8PathBuf,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args, Clone)]
struct RequestArgs {
    /// Portal API token; falls back to JGI_TOKEN.
    #[arg(long)]
    token: Option<String>,

    /// Answer yes to every confirmation.
    #[arg(long)]
    yes: bool,

    #[arg(long)]
    no_mail: bool,
}

#[derive(Args, Clone)]
struct LimitArgs {
    /// Total size (GB) above which the request is split.
    #[arg(long)]
    max_total_gb: Option<f64>,

    /// Ceiling for a single request (TB).
    #[arg(long)]
    max_batch_tb: Option<f64>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<PortalError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PortalError) -> u8 {
    match error {
        PortalError::InvalidTaxonOid(_)
        | PortalError::InvalidCategory(_)
        | PortalError::ConfigRead(_)
        | PortalError::ConfigParse(_)
        | PortalError::ConfigValue(_)
        | PortalError::MissingToken
        | PortalError::TableRead { .. } => 2,
        PortalError::SearchHttp(_)
        | PortalError::SearchStatus { .. }
        | PortalError::RestoreHttp(_)
        | PortalError::RestoreStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Collect(args) => run_collect(args, config, output_mode),
        Commands::Submit(args) => run_submit(args, config, output_mode),
        Commands::Plan(args) => run_plan(args, config, output_mode),
    }
}

fn run_collect(
    args: CollectArgs,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let mut exclude = args.exclude.clone();
    if args.no_bins {
        exclude.push(Category::Bins);
    }
    if args.no_assemblies {
        exclude.push(Category::Assembly);
    }
    if args.no_reads {
        exclude.push(Category::RawReads);
    }
    let config = config.apply(ConfigOverrides {
        max_total_gb: args.limits.max_total_gb,
        max_batch_tb: args.limits.max_batch_tb,
        raw_reads_gate: args.raw_reads_gate,
        exclude,
        no_mail: args.request.no_mail,
    })?;

    let taxa = manifest::read_taxon_oids(&args.tsv)?;
    tracing::info!(taxa = taxa.len(), input = %args.tsv, "collecting portal records");

    let client = JgiHttpClient::new(config.endpoints.clone())?;
    let app = App::new(client);
    let sink = sink_for(output_mode);
    let result = app.collect(&taxa, &config.extract, sink.as_ref());

    manifest::write_manifest(&args.output, &result.manifest_rows())?;
    manifest::write_metadata(&args.metadata_output, &result.metadata_rows())?;
    tracing::info!(
        manifest = %args.output,
        metadata = %args.metadata_output,
        unavailable = result.unavailable(),
        "tables written"
    );

    if !args.submit {
        match output_mode {
            OutputMode::NonInteractive => JsonOutput::print_collect(&result).into_diagnostic()?,
            OutputMode::Interactive => ConsoleOutput::print_collect(&result),
        }
        return Ok(());
    }

    if matches!(output_mode, OutputMode::Interactive) {
        ConsoleOutput::print_collect(&result);
    }
    let plan = app::plan(&result.records, &config.thresholds);
    let submitted = submit_plan(&app, &plan, &args.request, &config, output_mode, sink.as_ref())?;
    match output_mode {
        OutputMode::NonInteractive => {
            JsonOutput::print_collect_and_submit(&result, &submitted).into_diagnostic()?
        }
        OutputMode::Interactive => ConsoleOutput::print_submit(&submitted),
    }
    Ok(())
}

fn run_submit(
    args: SubmitArgs,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let config = config.apply(limit_overrides(&args.limits, args.request.no_mail))?;
    let rows = manifest::read_manifest(&args.manifest)?;
    let plan = app::plan(&rows, &config.thresholds);
    if matches!(output_mode, OutputMode::Interactive) {
        ConsoleOutput::print_plan(&plan);
    }

    let client = JgiHttpClient::new(config.endpoints.clone())?;
    let app = App::new(client);
    let sink = sink_for(output_mode);
    let result = submit_plan(&app, &plan, &args.request, &config, output_mode, sink.as_ref())?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_submit(&result).into_diagnostic()?,
        OutputMode::Interactive => ConsoleOutput::print_submit(&result),
    }
    Ok(())
}

fn run_plan(args: PlanArgs, config: ResolvedConfig, output_mode: OutputMode) -> miette::Result<()> {
    let config = config.apply(limit_overrides(&args.limits, false))?;
    let rows = manifest::read_manifest(&args.manifest)?;
    let plan = app::plan(&rows, &config.thresholds);
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_plan(&plan).into_diagnostic()?,
        OutputMode::Interactive => ConsoleOutput::print_plan(&plan),
    }
    Ok(())
}

fn submit_plan(
    app: &App<JgiHttpClient>,
    plan: &DownloadPlan,
    request: &RequestArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
    sink: &dyn ProgressSink,
) -> miette::Result<SubmitResult> {
    let token = resolve_token(request.token.as_deref())?;
    let confirm = confirm_for(request.yes, output_mode);
    Ok(app.submit(plan, &token, config.send_mail, confirm.as_ref(), sink)?)
}

fn limit_overrides(limits: &LimitArgs, no_mail: bool) -> ConfigOverrides {
    ConfigOverrides {
        max_total_gb: limits.max_total_gb,
        max_batch_tb: limits.max_batch_tb,
        no_mail,
        ..ConfigOverrides::default()
    }
}

fn resolve_token(flag: Option<&str>) -> Result<String, PortalError> {
    flag.map(str::to_string)
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(PortalError::MissingToken)
}

fn confirm_for(assume_yes: bool, output_mode: OutputMode) -> Box<dyn Confirm> {
    if assume_yes {
        return Box::new(AutoAnswer(true));
    }
    match output_mode {
        OutputMode::Interactive => Box::new(TerminalPrompt),
        OutputMode::NonInteractive => {
            tracing::warn!("non-interactive run without --yes; every request will be declined");
            Box::new(AutoAnswer(false))
        }
    }
}

fn sink_for(output_mode: OutputMode) -> Box<dyn ProgressSink> {
    match output_mode {
        OutputMode::Interactive => Box::new(ConsoleOutput),
        OutputMode::NonInteractive => Box::new(JsonOutput),
    }
}
