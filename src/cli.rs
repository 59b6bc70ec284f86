//! CLI: discover requests → (generate | show)
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::class_map::{ClassMap, Targets};
use crate::config::Project;
use crate::generate::{Generator, Mode, Report};
use crate::rules::RuleDump;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate `@property-read` docblocks for FormRequest classes from their validation rules
#[derive(Parser, Debug)]
#[command(name = "form-request-phpdoc", version)]
pub struct CommandLineInterface {
    /// project root; relative config paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    base_path: PathBuf,

    /// config file (default: <base-path>/form-request-phpdoc.json, optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// merge generated annotations into each request's docblock
    Generate(GenerateOut),
    /// print the merged docblock of each request without writing anything
    Show(InputSettings),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// class names, file paths, or quoted glob patterns (every discovered request if omitted)
    targets: Vec<String>,

    /// JSON rule dump (overrides `rules_dump` from the config)
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// write into the request classes instead of the side-channel stub file
    #[arg(long, default_value_t = false)]
    write: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_rules(&self, project: &Project) -> anyhow::Result<RuleDump> {
        let path = match self.rules.as_ref() {
            Some(path) => project.resolve(&path.to_string_lossy()),
            None => project.rules_dump(),
        };
        let dump = RuleDump::load(&path).with_context(|| "failed to load the rule dump")?;
        log::debug!("{} classes in {}", dump.len(), path.display());
        Ok(dump)
    }

    fn load_classes(&self, project: &Project) -> anyhow::Result<(ClassMap, Targets)> {
        let classes = ClassMap::scan_dirs(&project.scan_dirs()).context("failed to scan for classes")?;
        log::debug!("discovered {} classes", classes.len());
        let raw = resolve_target_patterns(&self.targets)?;
        let targets = Targets::resolve(raw, &classes);
        if targets.is_unresolved() {
            bail!("none of the given targets name a discovered class or file");
        }
        Ok((classes, targets))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        let base_path = self
            .base_path
            .canonicalize()
            .with_context(|| format!("invalid base path {}", self.base_path.display()))?;
        let project = Project::load(base_path, self.config.as_deref())?;

        let (settings, mode, write_flag) = match &self.cmd {
            Command::Generate(target) => (&target.input_settings, Mode::Write, target.write),
            Command::Show(settings) => (settings, Mode::Show, false),
        };
        let rules = settings.load_rules(&project)?;
        let (classes, targets) = settings.load_classes(&project)?;
        let selected = classes.select(&targets);

        let destination = project.destination(write_flag);
        let mut generator = Generator::new(rules, &destination, mode);
        let stdout = std::io::stdout();
        let report = generator.run(&selected, &mut stdout.lock());
        generator.finish(&project.config.form_request_extends)?;

        print_report(&report);
        Ok(ExitCode::from(report.exit_code()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_report(report: &Report) {
    let mut stderr = std::io::stderr().lock();
    for item in &report.problems {
        let label = if item.problem.is_fatal() { "error".red().bold() } else { "conflict".yellow().bold() };
        let _ = writeln!(stderr, "{label} {}: {}", item.class.bold(), item.problem);
    }
    let summary = format!(
        "{} written, {} unchanged, {} printed, {} skipped, {} failed, {} problems",
        report.written,
        report.unchanged,
        report.printed,
        report.skipped,
        report.failed,
        report.problems.len(),
    );
    let summary = if report.problems.is_empty() { summary.green() } else { summary.yellow() };
    let _ = writeln!(stderr, "{summary}");
}

/// Class names and literal paths pass through; anything with glob syntax is expanded.
fn resolve_target_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched_any = false;
        for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
            out.push(entry?);
            matched_any = true;
        }
        if !matched_any {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}
