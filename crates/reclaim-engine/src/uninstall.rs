use reclaim_core::{Directive, UninstallSpec};
use tracing::{info, info_span, warn};

use crate::command::SystemCommand;
use crate::error::UninstallError;
use crate::fs_utils::{delete_paths, remove_empty_directories};
use crate::kext::remove_kext;
use crate::launchctl::remove_launchctl_service;
use crate::osascript::remove_login_item;
use crate::pkgutil::remove_receipts_matching;
use crate::process::{quit_application, signal_application};
use crate::script::run_uninstall_script;
use crate::types::{
    DirectiveOutcome, DirectiveStatus, TechniqueReport, UninstallContext, UninstallReport,
};

pub trait ArtifactPhases {
    type Report: Default;

    fn install_phase(&mut self) -> Self::Report {
        Self::Report::default()
    }

    fn uninstall_phase(&mut self) -> Self::Report;

    fn zap_phase(&mut self) -> Self::Report {
        Self::Report::default()
    }
}

pub struct UninstallArtifact<'a, E: ?Sized> {
    spec: &'a UninstallSpec,
    context: &'a UninstallContext,
    executor: &'a mut E,
}

impl<'a, E> UninstallArtifact<'a, E>
where
    E: SystemCommand + ?Sized,
{
    pub fn new(
        spec: &'a UninstallSpec,
        context: &'a UninstallContext,
        executor: &'a mut E,
    ) -> Self {
        Self {
            spec,
            context,
            executor,
        }
    }
}

impl<E> ArtifactPhases for UninstallArtifact<'_, E>
where
    E: SystemCommand + ?Sized,
{
    type Report = UninstallReport;

    fn uninstall_phase(&mut self) -> UninstallReport {
        uninstall(self.spec, self.context, self.executor)
    }
}

pub fn uninstall<E>(
    spec: &UninstallSpec,
    context: &UninstallContext,
    executor: &mut E,
) -> UninstallReport
where
    E: SystemCommand + ?Sized,
{
    uninstall_with_progress(spec, context, executor, |_| {})
}

pub fn uninstall_with_progress<E, P>(
    spec: &UninstallSpec,
    context: &UninstallContext,
    executor: &mut E,
    mut on_technique: P,
) -> UninstallReport
where
    E: SystemCommand + ?Sized,
    P: FnMut(&TechniqueReport),
{
    let _span = info_span!("uninstall", token = %spec.token).entered();
    let mut report = UninstallReport::new(spec.token.clone());

    for (technique, directives) in spec.groups() {
        info!(
            technique = technique.as_str(),
            count = directives.len(),
            "running uninstall phase"
        );
        let mut technique_report = TechniqueReport {
            technique,
            outcomes: Vec::with_capacity(directives.len()),
        };

        let mut aborted = false;
        for directive in directives {
            let target = directive.target();
            if aborted {
                technique_report.outcomes.push(DirectiveOutcome {
                    technique,
                    target,
                    status: DirectiveStatus::Skipped,
                    warnings: Vec::new(),
                });
                continue;
            }

            let mut warnings = Vec::new();
            let status = match execute_directive(executor, context, directive, &mut warnings) {
                Ok(status) => status,
                Err(err) => {
                    warn!(
                        technique = technique.as_str(),
                        target = %target,
                        error = %err,
                        "directive failed"
                    );
                    aborted = true;
                    DirectiveStatus::Failed(err)
                }
            };
            technique_report.outcomes.push(DirectiveOutcome {
                technique,
                target,
                status,
                warnings,
            });
        }

        on_technique(&technique_report);
        report.techniques.push(technique_report);
    }

    report
}

fn execute_directive<E>(
    executor: &mut E,
    context: &UninstallContext,
    directive: &Directive,
    warnings: &mut Vec<String>,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let options = &context.options;
    match directive {
        Directive::EarlyScript(script) | Directive::Script(script) => {
            run_uninstall_script(executor, &context.staged_path, script, warnings)
        }
        Directive::Launchctl(label) => remove_launchctl_service(executor, label),
        Directive::Quit(bundle_id) => quit_application(executor, bundle_id, options, warnings),
        Directive::Signal(signal) => signal_application(executor, signal, warnings),
        Directive::LoginItem(name) => remove_login_item(executor, name),
        Directive::Kext(kext_id) => remove_kext(executor, kext_id, warnings),
        Directive::Pkgutil(pattern) => {
            remove_receipts_matching(executor, pattern, options.rm_batch_size)
        }
        Directive::Rmdir(paths) => {
            remove_empty_directories(executor, paths, &context.home_dir, warnings)
        }
        Directive::Delete(paths) | Directive::Trash(paths) => delete_paths(
            executor,
            paths,
            &context.home_dir,
            options.rm_batch_size,
            warnings,
        ),
    }
}
