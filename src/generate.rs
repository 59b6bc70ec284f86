//! The per-class driver.
//!
//! For each selected class, in sorted order:
//! rules → path tree → annotations → merge with the current docblock → output.
//! Classes are independent; a failing class never stops the run.
use std::io::Write;
use std::path::PathBuf;

use crate::class_map::ClassEntry;
use crate::config::WriteDestination;
use crate::diagnostics::Problem;
use crate::error::{Error, Result};
use crate::external_doc::ExternalDocFile;
use crate::ir::AnnotationEntry;
use crate::rules::{RuleDump, RuleLookup};
use crate::{lower, merge, path_tree, php_source};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Persist merged docblocks.
    Write,
    /// Print merged docblocks, touch nothing.
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Unchanged,
    Printed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassProblem {
    pub class: String,
    pub problem: Problem,
}

#[derive(Debug, Default)]
pub struct Report {
    pub written: usize,
    pub unchanged: usize,
    pub printed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub problems: Vec<ClassProblem>,
}

enum Sink {
    InPlace,
    SideChannel(ExternalDocFile),
}

pub struct Generator {
    rules: RuleDump,
    sink: Sink,
    mode: Mode,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Report {
    fn record(&mut self, class: &str, problem: impl Into<Problem>) {
        let problem = problem.into();
        log::debug!("{class}: {problem}");
        self.problems.push(ClassProblem { class: class.to_string(), problem });
    }

    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Written => self.written += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Printed => self.printed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// 0 clean, 1 when anything was reported, 2 when no class made it through.
    pub fn exit_code(&self) -> u8 {
        let succeeded = self.written + self.unchanged + self.printed;
        if self.failed > 0 && succeeded == 0 {
            2
        } else if !self.problems.is_empty() {
            1
        } else {
            0
        }
    }
}

impl Generator {
    /// The side-channel file, if any, is loaded here and saved by [`Generator::finish`].
    pub fn new(rules: RuleDump, destination: &WriteDestination, mode: Mode) -> Self {
        let sink = match destination {
            WriteDestination::InPlace => Sink::InPlace,
            WriteDestination::SideChannel(path) => Sink::SideChannel(ExternalDocFile::load(path.clone())),
        };
        Self { rules, sink, mode }
    }

    pub fn run(&mut self, classes: &[&ClassEntry], out: &mut dyn Write) -> Report {
        let mut report = Report::default();
        for entry in classes {
            let outcome = match self.process(entry, out, &mut report) {
                Ok(outcome) => outcome,
                Err(error) => {
                    log::error!("{}: {error}", entry.qualified_name);
                    report.record(&entry.qualified_name, Problem::Artifact(error.to_string()));
                    Outcome::Failed
                }
            };
            report.count(outcome);
        }
        report
    }

    /// Flush the side-channel file. No-op for in-place runs and `Show`.
    pub fn finish(self, base_class: &str) -> Result<Option<PathBuf>> {
        match (self.sink, self.mode) {
            (Sink::SideChannel(doc), Mode::Write) => {
                doc.save(base_class)?;
                log::info!("Written {} class stubs to {}", doc.len(), doc.path().display());
                Ok(Some(doc.path().to_path_buf()))
            }
            _ => Ok(None),
        }
    }

    fn process(&mut self, entry: &ClassEntry, out: &mut dyn Write, report: &mut Report) -> Result<Outcome> {
        let class = entry.qualified_name.as_str();
        let entries = match self.annotations(entry, report) {
            Ok(entries) => entries,
            Err(outcome) => return Ok(outcome),
        };
        let mode = self.mode;

        match &mut self.sink {
            Sink::InPlace => {
                let source = std::fs::read_to_string(&entry.path).map_err(|e| Error::read(&entry.path, e))?;
                // offsets from discovery may be stale if an earlier class in this file was rewritten
                let decl = php_source::scan(&source)
                    .into_iter()
                    .find(|decl| decl.qualified_name() == class)
                    .ok_or_else(|| Error::ClassVanished { class: class.to_string(), path: entry.path.clone() })?;
                let block = merge::merge(decl.doc_text(&source), &entries);

                if mode == Mode::Show {
                    return print_block(out, class, &block);
                }
                let updated = php_source::with_doc_block(&source, &decl, &block);
                if updated == source {
                    return Ok(Outcome::Unchanged);
                }
                std::fs::write(&entry.path, updated).map_err(|e| Error::write(&entry.path, e))?;
                log::info!("Written new phpDocBlock to {}", entry.path.display());
                Ok(Outcome::Written)
            }
            Sink::SideChannel(doc) => {
                let (namespace, name) = (&entry.decl.namespace, &entry.decl.name);
                let existing = doc.class_doc(namespace, name);
                let block = merge::merge(existing, &entries);

                if mode == Mode::Show {
                    return print_block(out, class, &block);
                }
                if existing == Some(block.as_str()) {
                    return Ok(Outcome::Unchanged);
                }
                doc.replace_class_doc(namespace, name, block);
                Ok(Outcome::Written)
            }
        }
    }

    /// The class's annotations, or why there are none (`Skipped` / `Failed`).
    fn annotations(&self, entry: &ClassEntry, report: &mut Report) -> std::result::Result<Vec<AnnotationEntry>, Outcome> {
        let class = entry.qualified_name.as_str();
        if entry.decl.is_abstract {
            log::debug!("{class} is not instantiable, skipping");
            return Err(Outcome::Skipped);
        }
        let rules = match self.rules.lookup(class) {
            RuleLookup::Rules(rules) => rules,
            RuleLookup::NoCapability => {
                log::debug!("{class} has no rules(), skipping");
                return Err(Outcome::Skipped);
            }
            RuleLookup::Missing => {
                log::debug!("{class} is not in the rule dump, skipping");
                return Err(Outcome::Skipped);
            }
        };

        let (tree, diagnostics) = path_tree::build(rules);
        for diagnostic in diagnostics {
            report.record(class, diagnostic);
        }
        match lower::synthesize(&tree) {
            Ok(entries) => Ok(entries),
            Err(error) => {
                log::warn!("{class}: annotation generation aborted");
                report.record(class, error);
                Err(Outcome::Failed)
            }
        }
    }
}

fn print_block(out: &mut dyn Write, class: &str, block: &str) -> Result<Outcome> {
    writeln!(out, "// {class}\n{block}\n").map_err(|e| Error::write("<stdout>", e))?;
    Ok(Outcome::Printed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::php_source::ClassDecl;

    fn entry(namespace: &str, name: &str, is_abstract: bool) -> ClassEntry {
        let decl = ClassDecl {
            namespace: namespace.into(),
            name: name.into(),
            is_abstract,
            start: 0,
            doc: None,
        };
        ClassEntry { qualified_name: decl.qualified_name(), path: PathBuf::from("/nowhere.php"), decl }
    }

    fn dump() -> RuleDump {
        RuleDump::parse(std::path::Path::new("rules.json"), r#"{
            "App\\Store": {"age": "nullable|integer", "name": "required|string"},
            "App\\Broken": {"tags.*": "string", "tags.label": "string", "ok": "boolean"},
            "App\\Ping": null,
            "App\\Base": {"x": "string"}
        }"#).unwrap()
    }

    fn side_channel() -> WriteDestination {
        WriteDestination::SideChannel("/definitely/not/here/_form_request_phpdoc.php".into())
    }

    #[test]
    fn show_prints_merged_blocks() {
        let mut generator = Generator::new(dump(), &side_channel(), Mode::Show);
        let store = entry("App", "Store", false);
        let mut out = Vec::new();
        let report = generator.run(&[&store], &mut out);
        assert_eq!(report.printed, 1);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "// App\\Store\n/**\n * @property-read ?int $age\n * @property-read string $name\n */\n\n"
        );
    }

    #[test]
    fn skips_are_not_problems() {
        let mut generator = Generator::new(dump(), &side_channel(), Mode::Write);
        let ping = entry("App", "Ping", false);
        let base = entry("App", "Base", true);
        let unknown = entry("App", "Unknown", false);
        let report = generator.run(&[&ping, &base, &unknown], &mut std::io::sink());
        assert_eq!(report.skipped, 3);
        assert!(report.problems.is_empty());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn conflicts_are_reported_but_class_is_still_written() {
        let mut generator = Generator::new(dump(), &side_channel(), Mode::Write);
        let broken = entry("App", "Broken", false);
        let report = generator.run(&[&broken], &mut std::io::sink());
        assert_eq!(report.written, 1);
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].class, "App\\Broken");
        assert!(!report.problems[0].problem.is_fatal());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn second_identical_run_is_unchanged() {
        let mut generator = Generator::new(dump(), &side_channel(), Mode::Write);
        let store = entry("App", "Store", false);
        let first = generator.run(&[&store], &mut std::io::sink());
        let second = generator.run(&[&store], &mut std::io::sink());
        assert_eq!(first.written, 1);
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn missing_source_file_fails_only_that_class() {
        let mut generator = Generator::new(dump(), &WriteDestination::InPlace, Mode::Write);
        let store = entry("App", "Store", false);
        let report = generator.run(&[&store], &mut std::io::sink());
        assert_eq!(report.failed, 1);
        assert!(report.problems[0].problem.is_fatal());
        assert_eq!(report.exit_code(), 2);
    }
}
