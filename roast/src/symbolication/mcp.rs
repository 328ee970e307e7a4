//! Loader for MCP style mapping directories (`joined.srg` + `methods.csv`).

use std::fs;
use std::path::{Path, PathBuf};

use fnv::FnvHashMap;
use tracing::info;

use super::Symbols;

pub const JOINED_SRG: &str = "joined.srg";
pub const METHODS_CSV: &str = "methods.csv";

#[derive(thiserror::Error, Debug)]
pub enum MappingError {
    #[error("unable to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}:{line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl Symbols {
    /// Load `joined.srg` and `methods.csv` from `dir`. Either both load
    /// completely or nothing is returned.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, MappingError> {
        let dir = dir.as_ref();
        let srg_path = dir.join(JOINED_SRG);
        let csv_path = dir.join(METHODS_CSV);

        let csv = read(&csv_path)?;
        let srg = read(&srg_path)?;

        let names = parse_methods_csv(&csv, &csv_path)?;
        let syms = parse_srg(&srg, &srg_path, &names)?;
        info!(
            "loaded {} classes, {} method ids from {:?}",
            syms.classes.len(),
            syms.method_ids.len(),
            dir
        );
        Ok(syms)
    }
}

fn read(path: &Path) -> Result<String, MappingError> {
    fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.to_owned(),
        source,
    })
}

fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> MappingError {
    MappingError::Malformed {
        path: path.to_owned(),
        line: line + 1,
        reason: reason.into(),
    }
}

/// `searge,name,side,desc`, returns searge id -> readable name
pub(crate) fn parse_methods_csv(
    contents: &str,
    path: &Path,
) -> Result<FnvHashMap<String, String>, MappingError> {
    let mut names = FnvHashMap::default();
    for (i, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || (i == 0 && line.starts_with("searge")) {
            continue;
        }
        let mut fields = line.splitn(3, ',');
        let searge = fields.next().unwrap_or_default();
        let name = fields
            .next()
            .ok_or_else(|| malformed(path, i, "expected at least two columns"))?;
        if searge.is_empty() || name.is_empty() {
            return Err(malformed(path, i, "empty searge id or name"));
        }
        names.insert(searge.to_owned(), name.to_owned());
    }
    Ok(names)
}

/// split `a/b/c` into (`a.b`, `c`)
fn split_member(path: &str) -> Option<(String, &str)> {
    let (class, member) = path.rsplit_once('/')?;
    if class.is_empty() || member.is_empty() {
        return None;
    }
    Some((class.replace('/', "."), member))
}

pub(crate) fn parse_srg(
    contents: &str,
    path: &Path,
    names: &FnvHashMap<String, String>,
) -> Result<Symbols, MappingError> {
    let mut syms = Symbols::new();
    for (searge, name) in names {
        syms.add_method_id(searge.as_str(), name.as_str());
    }

    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (kind, rest) = line
            .split_once(':')
            .ok_or_else(|| malformed(path, i, "missing record kind"))?;
        let fields = rest.split_whitespace().collect::<Vec<_>>();

        match kind {
            "PK" | "FD" => {}
            "CL" => {
                let [obf, actual] = fields[..] else {
                    return Err(malformed(path, i, "CL expects 2 fields"));
                };
                let actual = actual.replace('/', ".");
                let class = syms.class_mut(obf.replace('/', "."), actual.as_str());
                class.actual = actual;
            }
            "MD" => {
                let [obf, _, actual, _] = fields[..] else {
                    return Err(malformed(path, i, "MD expects 4 fields"));
                };
                let (obf_class, obf_method) =
                    split_member(obf).ok_or_else(|| malformed(path, i, "bad obfuscated method"))?;
                let (actual_class, searge) =
                    split_member(actual).ok_or_else(|| malformed(path, i, "bad method"))?;
                let name = names.get(searge).map(String::as_str).unwrap_or(searge);
                syms.class_mut(obf_class, actual_class)
                    .add_method(obf_method, name);
            }
            other => return Err(malformed(path, i, format!("unknown record kind {other:?}"))),
        }
    }

    Ok(syms)
}
