//! Generate `@property-read` docblocks for Laravel FormRequest classes from
//! their validation rules.
//!
//! rules → path tree → annotations → merged docblock
pub mod class_map;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod external_doc;
pub mod generate;
pub mod ir;
pub mod lower;
pub mod merge;
pub mod path_de;
pub mod path_tree;
pub mod php_source;
pub mod phpdoc;
pub mod rules;
