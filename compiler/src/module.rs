//! Module references: `id[:instance][!forced_instance]`.

use crate::options::Options;

use path_dedot::ParseDot;
use source::diagnostics::{Diagnostic, ErrorCode};
use source::FileSystem;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleReference<'a> {
    pub id: &'a str,
    pub instance: Option<&'a str>,
    /// Replaces the derived instance outright
    pub forced: Option<&'a str>,
}

impl<'a> ModuleReference<'a> {
    pub fn parse(reference: &'a str) -> Option<Self> {
        let reference = reference.trim();
        if reference.contains(char::is_whitespace) {
            return None;
        }
        let (rest, forced) = match reference.split_once('!') {
            Some((rest, forced)) => (rest, Some(forced)),
            None => (reference, None),
        };
        let (id, instance) = match rest.split_once(':') {
            Some((id, instance)) => (id, Some(instance)),
            None => (rest, None),
        };
        let empty = |part: Option<&str>| part.map_or(false, str::is_empty);
        if id.is_empty() || empty(instance) || empty(forced) {
            return None;
        }
        Some(ModuleReference {
            id,
            instance,
            forced,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub filename: PathBuf,
    pub instance: String,
}

/// Collapse `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.parse_dot()
        .map_or_else(|_| path.to_path_buf(), Cow::into_owned)
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(ext);
    PathBuf::from(name)
}

/// The file a module id names. `./` and `../` ids are relative to the
/// current file, anything else to `basedir`. An id without the template
/// extension is tried as `<id><ext>` and then as `<id>/<entry>`.
pub fn module_path(id: &str, options: &Options, files: &FileSystem) -> PathBuf {
    let relative = id.starts_with("./") || id.starts_with("../");
    let base = match options.filename.as_deref().and_then(Path::parent) {
        Some(dir) if relative => dir.to_path_buf(),
        _ => options.basedir.clone(),
    };
    let path = base.join(id);
    if id.ends_with(options.ext.as_str()) {
        return normalize_path(&path);
    }
    let file = normalize_path(&with_extension(&path, &options.ext));
    let entry = normalize_path(&path.join(&options.entry));
    if !files.exists(&file) && files.exists(&entry) {
        entry
    } else {
        file
    }
}

/// Resolve `reference` from a file compiled with scope id `sid` and
/// `options`.
pub fn resolve(
    reference: &str,
    sid: &str,
    options: &Options,
    files: &FileSystem,
) -> Result<ResolvedModule, Diagnostic> {
    let parsed = ModuleReference::parse(reference).ok_or_else(|| {
        Diagnostic::error()
            .with_code(ErrorCode::InvalidModuleReference)
            .with_message(format!("Invalid module reference `{}`", reference.trim()))
    })?;
    let instance = match parsed.forced {
        Some(forced) => forced.to_string(),
        None => {
            let mut parts = vec![];
            if options.instance_through {
                parts.push(sid);
                if !options.instance.is_empty() {
                    parts.push(options.instance.as_str());
                }
            }
            parts.extend(parsed.instance);
            parts.join("-")
        }
    };
    Ok(ResolvedModule {
        filename: module_path(parsed.id, options, files),
        instance,
    })
}

/// The scope id of a file compiled as `instance`.
pub fn scope_id(filename: Option<&Path>, instance: &str) -> String {
    format!("m{:08x}", fxhash::hash32(&(filename, instance)))
}
