//! Side-channel stub file holding one docblock per FormRequest.
//!
//! Instead of touching the request classes, the generated docblocks can be
//! collected into a single PHP file made of empty class stubs, which IDEs and
//! static analysers merge with the real classes:
//!
//! ```text
//! <?php
//!
//! namespace App\Http\Requests {
//! /**
//!  * @property-read string $name
//!  */
//! class StoreUser extends \Illuminate\Foundation\Http\FormRequest {}
//! }
//! ```
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::php_source::{self, qualified_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStub {
    pub namespace: String,
    pub name: String,
    pub doc: Option<String>,
}

#[derive(Debug)]
pub struct ExternalDocFile {
    path: PathBuf,
    classes: IndexMap<String, ClassStub>,
}

impl ExternalDocFile {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), classes: IndexMap::new() }
    }

    /// Load the stub file; a missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(path, &text),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist yet", path.display());
                Self::empty(path)
            }
            Err(error) => {
                log::warn!("cannot read {}, starting empty: {error}", path.display());
                Self::empty(path)
            }
        }
    }

    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Self {
        let mut doc = Self::empty(path);
        for decl in php_source::scan(text) {
            let stub = ClassStub {
                doc: decl.doc_text(text).map(str::to_string),
                namespace: decl.namespace,
                name: decl.name,
            };
            doc.classes.insert(qualified_name(&stub.namespace, &stub.name), stub);
        }
        doc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_doc(&self, namespace: &str, name: &str) -> Option<&str> {
        self.classes
            .get(&qualified_name(namespace, name))
            .and_then(|stub| stub.doc.as_deref())
    }

    pub fn replace_class_doc(&mut self, namespace: &str, name: &str, doc: String) {
        self.classes
            .entry(qualified_name(namespace, name))
            .and_modify(|stub| stub.doc = Some(doc.clone()))
            .or_insert_with(|| ClassStub {
                namespace: namespace.to_string(),
                name: name.to_string(),
                doc: Some(doc),
            });
    }

    pub fn render(&self, base_class: &str) -> String {
        let mut blocks = vec!["<?php".to_string()];
        for stub in self.classes.values() {
            let namespace = if stub.namespace.is_empty() {
                "namespace {".to_string()
            } else {
                format!("namespace {} {{", stub.namespace)
            };
            let mut block = namespace;
            block.push('\n');
            if let Some(doc) = &stub.doc {
                block.push_str(doc);
                block.push('\n');
            }
            block.push_str(&format!("class {} extends {base_class} {{}}\n}}", stub.name));
            blocks.push(block);
        }
        blocks.join("\n\n") + "\n"
    }

    pub fn save(&self, base_class: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
        }
        std::fs::write(&self.path, self.render(base_class)).map_err(|e| Error::write(&self.path, e))
    }
}
