//! Class discovery: scan directories for PHP classes, keyed by qualified name.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::php_source::{self, ClassDecl};

#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub qualified_name: String,
    pub path: PathBuf,
    pub decl: ClassDecl,
}

/// Sorted by qualified name, so runs are reproducible.
#[derive(Debug, Default)]
pub struct ClassMap {
    classes: BTreeMap<String, ClassEntry>,
}

/// Optional subset requested on the command line.
#[derive(Debug, Default)]
pub struct Targets {
    specified: bool,
    classes: Vec<String>,
    files: Vec<PathBuf>,
}

impl ClassMap {
    /// Scan every `*.php` below each directory. Missing directories are skipped.
    pub fn scan_dirs(dirs: &[PathBuf]) -> Result<Self> {
        let mut files = Vec::new();
        for dir in dirs {
            if !dir.is_dir() {
                log::debug!("scan directory {} does not exist", dir.display());
                continue;
            }
            let pattern = format!("{}/**/*.php", glob::Pattern::escape(&dir.to_string_lossy()));
            let paths = glob::glob(&pattern).map_err(|source| Error::Pattern { pattern: pattern.clone(), source })?;
            for entry in paths {
                match entry {
                    Ok(path) => files.push(path),
                    Err(error) => log::warn!("skipping unreadable path: {error}"),
                }
            }
        }

        // parse in parallel, insert in input order
        let scanned = files
            .par_iter()
            .filter_map(|path| match std::fs::read_to_string(path) {
                Ok(src) => Some((canonical(path), php_source::scan(&src))),
                Err(error) => {
                    log::warn!("skipping {}: {error}", path.display());
                    None
                }
            })
            .collect::<Vec<_>>();

        let mut map = ClassMap::default();
        for (path, decls) in scanned {
            for decl in decls {
                map.insert(path.clone(), decl);
            }
        }
        Ok(map)
    }

    pub fn insert(&mut self, path: PathBuf, decl: ClassDecl) {
        let qualified_name = decl.qualified_name();
        if let Some(existing) = self.classes.get(&qualified_name) {
            log::warn!(
                "class {qualified_name} is declared in both {} and {}; keeping the first",
                existing.path.display(),
                path.display(),
            );
            return;
        }
        self.classes.insert(qualified_name.clone(), ClassEntry { qualified_name, path, decl });
    }

    pub fn get(&self, qualified_name: &str) -> Option<&ClassEntry> {
        self.classes.get(qualified_name.trim_start_matches('\\'))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Every class when no target was given, otherwise the ones a target names.
    pub fn select<'a>(&'a self, targets: &Targets) -> Vec<&'a ClassEntry> {
        self.classes
            .values()
            .filter(|entry| !targets.specified || targets.matches(entry))
            .collect()
    }
}

impl Targets {
    /// Each raw target is a class name known to `map`, or else a file path.
    pub fn resolve<I>(raw: I, map: &ClassMap) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut targets = Targets::default();
        for target in raw {
            targets.specified = true;
            let target = target.as_ref();
            let as_class = target.to_string_lossy();
            if let Some(entry) = map.get(&as_class) {
                targets.classes.push(entry.qualified_name.clone());
            } else if let Ok(path) = target.canonicalize() {
                targets.files.push(path);
            } else {
                log::warn!("target {} is neither a known class nor a file", target.display());
            }
        }
        targets
    }

    /// True when targets were given but none of them resolved.
    pub fn is_unresolved(&self) -> bool {
        self.specified && self.classes.is_empty() && self.files.is_empty()
    }

    fn matches(&self, entry: &ClassEntry) -> bool {
        self.classes.contains(&entry.qualified_name) || self.files.contains(&entry.path)
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(namespace: &str, name: &str) -> ClassDecl {
        ClassDecl {
            namespace: namespace.into(),
            name: name.into(),
            is_abstract: false,
            start: 0,
            doc: None,
        }
    }

    fn sample_map() -> ClassMap {
        let mut map = ClassMap::default();
        map.insert("/app/Requests/Zed.php".into(), decl("App\\Requests", "Zed"));
        map.insert("/app/Requests/Alpha.php".into(), decl("App\\Requests", "Alpha"));
        map.insert("/app/Other/Alpha.php".into(), decl("App\\Requests", "Alpha"));
        map
    }

    #[test]
    fn classes_are_sorted_and_first_declaration_wins() {
        let map = sample_map();
        let all = map.select(&Targets::default());
        let names = all.iter().map(|e| e.qualified_name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["App\\Requests\\Alpha", "App\\Requests\\Zed"]);
        assert_eq!(all[0].path, PathBuf::from("/app/Requests/Alpha.php"));
    }

    #[test]
    fn targets_by_class_name() {
        let map = sample_map();
        let targets = Targets::resolve(["\\App\\Requests\\Zed"], &map);
        let picked = map.select(&targets);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].decl.name, "Zed");
    }

    #[test]
    fn unknown_targets_select_nothing() {
        let map = sample_map();
        let targets = Targets::resolve(["App\\Nope", "/definitely/not/here.php"], &map);
        assert!(targets.is_unresolved());
        assert!(map.select(&targets).is_empty());
    }
}
