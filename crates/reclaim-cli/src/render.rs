use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use reclaim_core::UninstallSpec;
use reclaim_engine::{
    DirectiveOutcome, DirectiveStatus, Invocation, TechniqueReport, UninstallReport,
};
use serde_json::{json, Value};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalProgress {
    style: OutputStyle,
    label: String,
    total: u64,
    current: u64,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_section(self, title: &str) {
        if let Some(line) = render_section_header(self.style, title) {
            println!();
            println!("{}", colorize(section_style(), &line));
        }
    }

    pub(crate) fn start_progress(self, label: &str, total: u64) -> TerminalProgress {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new(total.max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<12} [{bar:20.cyan/blue}] {pos:>3}/{len:3} {elapsed_precise}",
            ) {
                progress_bar.set_style(style.tick_chars("\\|/- ").progress_chars("=>-"));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalProgress {
            style: self.style,
            label: label.to_string(),
            total,
            current: 0,
            progress_bar,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

impl TerminalProgress {
    pub(crate) fn set(&mut self, current: u64) {
        self.current = current.min(self.total);

        let Some(progress_bar) = &self.progress_bar else {
            return;
        };

        let safe_total = self.total.max(1);
        progress_bar.set_length(safe_total);
        progress_bar.set_position(self.current.min(safe_total));
    }

    pub(crate) fn set_message(&self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.set_message(message.to_string());
        }
    }

    pub(crate) fn finish_success(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };

        progress_bar.finish_and_clear();
        if let Some(line) = render_progress_line(
            self.style,
            &self.label,
            self.current,
            self.total,
            Some(self.started_at.elapsed()),
        ) {
            println!("{line}");
        }
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn resolve_output_style(force_plain: bool, stdout_is_tty: bool) -> OutputStyle {
    if force_plain || !stdout_is_tty {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "error" => "[ERR]",
        _ => "[..]",
    }
}

fn outcome_badge_status(status: &DirectiveStatus) -> &'static str {
    match status {
        DirectiveStatus::Applied => "ok",
        DirectiveStatus::Absent => "step",
        DirectiveStatus::Partial(_) | DirectiveStatus::Skipped => "warn",
        DirectiveStatus::Failed(_) => "error",
    }
}

fn outcome_errors(status: &DirectiveStatus) -> Vec<String> {
    match status {
        DirectiveStatus::Partial(errors) => errors.iter().map(ToString::to_string).collect(),
        DirectiveStatus::Failed(error) => vec![error.to_string()],
        _ => Vec::new(),
    }
}

pub(crate) fn format_report_lines(report: &UninstallReport, style: OutputStyle) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in report.outcomes() {
        let message = format!(
            "{} {}: {}",
            outcome.technique,
            outcome.target,
            outcome.status.as_str()
        );
        lines.push(render_status_line(
            style,
            outcome_badge_status(&outcome.status),
            &message,
        ));
        for error in outcome_errors(&outcome.status) {
            lines.push(render_status_line(style, "error", &format!("  {error}")));
        }
        for warning in &outcome.warnings {
            lines.push(render_status_line(style, "warn", &format!("  {warning}")));
        }
    }
    lines.push(format_summary_line(report));
    lines
}

pub(crate) fn format_summary_line(report: &UninstallReport) -> String {
    let mut counts = [0_usize; 5];
    for outcome in report.outcomes() {
        let index = match outcome.status {
            DirectiveStatus::Applied => 0,
            DirectiveStatus::Absent => 1,
            DirectiveStatus::Partial(_) => 2,
            DirectiveStatus::Failed(_) => 3,
            DirectiveStatus::Skipped => 4,
        };
        counts[index] += 1;
    }
    format!(
        "uninstall summary: applied={} absent={} partial={} failed={} skipped={} warnings={}",
        counts[0],
        counts[1],
        counts[2],
        counts[3],
        counts[4],
        report.warnings().count()
    )
}

pub(crate) fn format_planned_lines(planned: &[Invocation], style: OutputStyle) -> Vec<String> {
    planned
        .iter()
        .map(|invocation| render_status_line(style, "step", &format!("would run: {invocation}")))
        .collect()
}

pub(crate) fn format_plan_lines(spec: &UninstallSpec, style: OutputStyle) -> Vec<String> {
    spec.execution_order()
        .into_iter()
        .map(|directive| {
            render_status_line(
                style,
                "step",
                &format!("{} {}", directive.technique(), directive.target()),
            )
        })
        .collect()
}

pub(crate) fn plan_json(spec: &UninstallSpec) -> Value {
    json!({
        "token": spec.token,
        "version": spec.version,
        "directives": spec.execution_order(),
    })
}

pub(crate) fn report_json(report: &UninstallReport, planned: Option<&[Invocation]>) -> Value {
    let techniques = report
        .techniques
        .iter()
        .map(technique_json)
        .collect::<Vec<_>>();
    let mut value = json!({
        "token": report.token,
        "clean": report.is_clean(),
        "techniques": techniques,
    });
    if let Some(planned) = planned {
        value["planned"] = json!(planned
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>());
    }
    value
}

fn technique_json(technique: &TechniqueReport) -> Value {
    json!({
        "technique": technique.technique.as_str(),
        "aborted": technique.aborted(),
        "directives": technique.outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
    })
}

fn outcome_json(outcome: &DirectiveOutcome) -> Value {
    json!({
        "target": outcome.target,
        "status": outcome.status.as_str(),
        "errors": outcome_errors(&outcome.status),
        "warnings": outcome.warnings,
    })
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn progress_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn progress_bar_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(format!("== {title} ==")),
    }
}

fn render_progress_line(
    style: OutputStyle,
    label: &str,
    current: u64,
    total: u64,
    elapsed: Option<Duration>,
) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }

    let width = 18_usize;
    let safe_total = total.max(1);
    let bounded_current = current.min(safe_total);
    let filled = ((bounded_current as usize) * width) / (safe_total as usize);
    let bar = format!(
        "{}{}",
        "=".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let percent = (bounded_current * 100) / safe_total;
    let counts = format!("{}/{}", HumanCount(current), HumanCount(total));
    let suffix = elapsed
        .map(|value| format!(" complete in {}", format_elapsed(value)))
        .unwrap_or_default();

    Some(format!(
        "{} [{}] {:>3}% {}{}",
        colorize(progress_label_style(), label),
        colorize(progress_bar_style(), &bar),
        percent,
        counts,
        suffix
    ))
}
