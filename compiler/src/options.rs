//! Compilation options.

use serde::{Deserialize, Serialize};
use source::diagnostics::Diagnostic;

use std::fs;
use std::path::{Path, PathBuf};

/// Build mode. Informational only: attribute transforms can read it to
/// decide how to rewrite values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Dev,
    Prod,
}

impl Default for Model {
    fn default() -> Self {
        Model::Dev
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Options {
    /// Template loaded when a module reference names a directory
    pub entry: String,
    pub ext: String,
    /// Root that module references resolve against
    pub basedir: PathBuf,
    /// The file being compiled. `./` and `../` references resolve
    /// relative to it.
    pub filename: Option<PathBuf>,
    pub instance: String,
    /// Whether this file's scope id and instance prefix the instances of
    /// the templates it extends or includes
    pub instance_through: bool,
    pub model: Model,
    /// Indent non-inline tags
    pub pretty: bool,
    /// Starting indentation when `pretty` is set
    pub indent: String,
    /// Record every executed `extends` / `include`
    pub dep: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            entry: "view.made".into(),
            ext: ".made".into(),
            basedir: PathBuf::from("."),
            filename: None,
            instance: String::new(),
            instance_through: true,
            model: Model::default(),
            pretty: false,
            indent: "\n".into(),
            dep: false,
        }
    }
}

impl Options {
    pub fn from_json_str(text: &str) -> Result<Options, Diagnostic> {
        serde_json::from_str(text)
            .map_err(|err| Diagnostic::error().with_message(format!("Invalid options: {}", err)))
    }

    pub fn from_json_file(path: &Path) -> Result<Options, Diagnostic> {
        let text = fs::read_to_string(path).map_err(|err| {
            Diagnostic::error().with_message(format!("Unable to read {}: {}", path.display(), err))
        })?;
        Options::from_json_str(&text).map_err(|err| err.in_file(path))
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = basedir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let options = Options::from_json_str(r#"{"pretty": true, "model": "prod"}"#).unwrap();
        assert!(options.pretty);
        assert_eq!(options.model, Model::Prod);
        assert_eq!(options.ext, ".made");
        assert_eq!(options.indent, "\n");
        assert!(options.instance_through);
    }

    #[test]
    fn rejects_unknown_models() {
        let err = Options::from_json_str(r#"{"model": "staging"}"#).unwrap_err();
        assert!(err.message.starts_with("Invalid options"));
    }
}
