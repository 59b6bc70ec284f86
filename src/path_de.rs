//! JSON loading that reports where in the document deserialization failed.
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize `src`, read from `origin`, with the JSON path in the error.
///
/// Rule dumps are keyed by class name, so the path usually tells the user
/// which FormRequest produced the bad value.
pub fn from_str_with_path<T: DeserializeOwned>(origin: &Path, src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let at = err.path().to_string();
        Error::Parse {
            path: origin.to_path_buf(),
            message: format!("at JSON path {at} → {}", err.into_inner()),
        }
    })
}
