use std::thread;
use std::time::{Duration, Instant};

use reclaim_core::SignalDirective;
use tracing::{info, warn};

use crate::command::{run_checked, run_logged, Invocation, SystemCommand};
use crate::error::UninstallError;
use crate::osascript::{
    count_processes_script, osascript_argv, quit_application_script, unix_ids_script,
};
use crate::types::{DirectiveStatus, EngineOptions};

pub(crate) const KILL_PATH: &str = "/bin/kill";

pub(crate) fn quit_application<E>(
    executor: &mut E,
    bundle_id: &str,
    options: &EngineOptions,
    warnings: &mut Vec<String>,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    if count_running_processes(executor, bundle_id)? == 0 {
        info!(bundle_id, "application not running");
        return Ok(DirectiveStatus::Absent);
    }

    info!(bundle_id, "asking application to quit");
    run_checked(
        executor,
        Invocation::mutation(osascript_argv(quit_application_script(bundle_id))).elevated(),
    )?;

    if let Some(wait) = options.quit_wait {
        if !wait_for_quit(executor, bundle_id, wait, options.quit_poll_interval)? {
            warn!(bundle_id, "application still running after quit request");
            warnings.push(format!(
                "{bundle_id} was still running {}s after the quit request",
                wait.as_secs()
            ));
        }
    }

    Ok(DirectiveStatus::Applied)
}

fn count_running_processes<E>(executor: &mut E, bundle_id: &str) -> Result<u32, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let output = run_checked(
        executor,
        Invocation::query(osascript_argv(count_processes_script(bundle_id))).elevated(),
    )?;
    Ok(output.stdout.trim().parse().unwrap_or(0))
}

fn wait_for_quit<E>(
    executor: &mut E,
    bundle_id: &str,
    wait: Duration,
    poll_interval: Duration,
) -> Result<bool, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    // An unrepresentable deadline waits until the application exits.
    let deadline = Instant::now().checked_add(wait);
    loop {
        if count_running_processes(executor, bundle_id)? == 0 {
            return Ok(true);
        }
        let now = Instant::now();
        let pause = match deadline {
            Some(deadline) if now >= deadline => return Ok(false),
            Some(deadline) => poll_interval.min(deadline - now),
            None => poll_interval,
        };
        thread::sleep(pause);
    }
}

pub(crate) fn signal_application<E>(
    executor: &mut E,
    directive: &SignalDirective,
    warnings: &mut Vec<String>,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let bundle_id = directive.bundle_id.as_str();
    let output = run_checked(
        executor,
        Invocation::query(osascript_argv(unix_ids_script(bundle_id))).elevated(),
    )?;
    let pids = parse_unix_ids(&output.stdout);
    if pids.is_empty() {
        info!(bundle_id, "no running processes to signal");
        return Ok(DirectiveStatus::Absent);
    }

    for signal in &directive.signals {
        info!(bundle_id, signal = signal.as_str(), pids = ?pids, "sending signal");
        let mut argv = vec![
            KILL_PATH.to_string(),
            "-s".to_string(),
            signal.as_str().to_string(),
        ];
        argv.extend(pids.iter().map(u32::to_string));
        let kill = Invocation::mutation(argv).elevated();
        let result = run_logged(executor, &kill)?;
        if !result.success() {
            // Processes may already have exited after an earlier signal.
            warn!(
                bundle_id,
                signal = signal.as_str(),
                status = ?result.status,
                "kill reported failure"
            );
            warnings.push(format!(
                "{} delivery to {bundle_id} reported {}",
                signal.as_str(),
                UninstallError::command_failed(&kill, &result)
            ));
        }
    }

    Ok(DirectiveStatus::Applied)
}

pub(crate) fn parse_unix_ids(stdout: &str) -> Vec<u32> {
    stdout
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter_map(|token| token.trim().parse().ok())
        .collect()
}
