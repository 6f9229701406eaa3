mod completion;
mod render;

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use reclaim_core::UninstallSpec;
use reclaim_engine::{
    uninstall_with_progress, DryRunExecutor, EngineOptions, HostExecutor, SystemCommand,
    UninstallContext, UninstallReport,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::completion::{write_completions_script, CliCompletionShell};
use crate::render::{
    format_plan_lines, format_planned_lines, format_report_lines, plan_json, report_json,
    resolve_output_style, OutputStyle, TerminalRenderer,
};

const DEFAULT_SUDO_PROGRAM: &str = "/usr/bin/sudo";

#[derive(Parser, Debug)]
#[command(name = "reclaim")]
#[command(about = "Reverse macOS package installations", long_about = None)]
struct Cli {
    /// Disable badges, colors and progress bars.
    #[arg(long, global = true, env = "RECLAIM_PLAIN")]
    plain: bool,
    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every uninstall directive of a package description.
    Uninstall(UninstallArgs),
    /// Print the directives in execution order without running anything.
    Plan {
        description: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate a shell completion script.
    Completions { shell: CliCompletionShell },
}

#[derive(Args, Debug)]
struct UninstallArgs {
    /// Package description (TOML).
    description: PathBuf,
    /// Directory holding the unpacked package payload; scripts resolve against it.
    #[arg(long, env = "RECLAIM_STAGED_PATH")]
    staged_path: PathBuf,
    /// Print the mutating commands instead of running them.
    #[arg(long, env = "RECLAIM_DRY_RUN")]
    dry_run: bool,
    #[arg(long)]
    json: bool,
    /// Per-command timeout; 0 disables it.
    #[arg(long, env = "RECLAIM_TIMEOUT_SECS", default_value_t = 300)]
    timeout_secs: u64,
    /// Wait for quit requests to take effect.
    #[arg(long, env = "RECLAIM_QUIT_WAIT_SECS")]
    quit_wait_secs: Option<u64>,
    #[arg(long, env = "RECLAIM_SUDO", default_value = DEFAULT_SUDO_PROGRAM)]
    sudo: PathBuf,
    /// Home directory used for `~` expansion.
    #[arg(long, env = "RECLAIM_HOME")]
    home: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli)
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "reclaim=warn",
        1 => "reclaim=info",
        _ => "reclaim=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let style = current_output_style(cli.plain);

    match cli.command {
        Commands::Uninstall(args) => run_uninstall(args, style),
        Commands::Plan { description, json } => {
            let spec = load_description(&description)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan_json(&spec))?);
            } else {
                let renderer = TerminalRenderer::from_style(style);
                renderer.print_section(&format!("plan for {}", spec.token));
                renderer.print_lines(&format_plan_lines(&spec, style));
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut stdout = io::stdout();
            write_completions_script(shell, &mut stdout)
        }
    }
}

fn current_output_style(force_plain: bool) -> OutputStyle {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    resolve_output_style(force_plain || no_color, io::stdout().is_terminal())
}

fn load_description(path: &Path) -> Result<UninstallSpec> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed reading package description: {}", path.display()))?;
    UninstallSpec::from_toml_str(&content)
        .with_context(|| format!("invalid package description: {}", path.display()))
}

fn build_context(args: &UninstallArgs) -> Result<UninstallContext> {
    let home_dir = match &args.home {
        Some(home) => home.clone(),
        None => dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?,
    };
    let options = EngineOptions {
        quit_wait: args.quit_wait_secs.map(Duration::from_secs),
        ..EngineOptions::default()
    };
    Ok(UninstallContext::new(&args.staged_path, home_dir).with_options(options))
}

fn build_host_executor(args: &UninstallArgs) -> HostExecutor {
    let timeout = (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs));
    HostExecutor::new()
        .with_sudo_program(&args.sudo)
        .with_timeout(timeout)
}

fn run_uninstall(args: UninstallArgs, style: OutputStyle) -> Result<()> {
    let spec = load_description(&args.description)?;
    if !args.staged_path.is_dir() {
        bail!(
            "staged path is not a directory: {}",
            args.staged_path.display()
        );
    }
    let context = build_context(&args)?;
    let host = build_host_executor(&args);
    debug!(?context, ?host, "resolved uninstall configuration");

    // JSON output must stay machine-readable, so no badges or progress bar.
    let renderer = TerminalRenderer::from_style(if args.json {
        OutputStyle::Plain
    } else {
        style
    });

    let (report, planned) = if args.dry_run {
        let mut executor = DryRunExecutor::new(host);
        let report = execute(&spec, &context, &mut executor, renderer);
        (report, Some(executor.into_planned()))
    } else {
        let mut executor = host;
        (execute(&spec, &context, &mut executor, renderer), None)
    };

    if args.json {
        let value = report_json(&report, planned.as_deref());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        renderer.print_section(&format!("uninstall {}", report.token));
        renderer.print_lines(&format_report_lines(&report, renderer.style()));
        if let Some(planned) = &planned {
            renderer.print_section("planned commands");
            renderer.print_lines(&format_planned_lines(planned, renderer.style()));
        }
    }

    let problems = report.problems().count();
    if problems > 0 {
        bail!(
            "uninstall of {} finished with {problems} unresolved directive(s)",
            report.token
        );
    }
    Ok(())
}

fn execute<E>(
    spec: &UninstallSpec,
    context: &UninstallContext,
    executor: &mut E,
    renderer: TerminalRenderer,
) -> UninstallReport
where
    E: SystemCommand,
{
    let total = spec.groups().len() as u64;
    info!(token = %spec.token, techniques = total, "starting uninstall");
    let mut progress = renderer.start_progress("uninstall", total);
    let mut finished = 0_u64;
    let report = uninstall_with_progress(spec, context, executor, |technique| {
        finished += 1;
        progress.set_message(technique.technique.as_str());
        progress.set(finished);
    });
    if report.is_clean() {
        progress.finish_success();
    } else {
        progress.finish_abandon();
    }
    report
}
