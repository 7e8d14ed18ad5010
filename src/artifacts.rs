//! Hardhat artifact lookup.
//!
//! Hardhat writes one JSON file per compiled contract under
//! `artifacts/<source path>/<ContractName>.json`, next to a `.dbg.json`
//! pointer into `build-info/`.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use eyre::{bail, eyre, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::constants::{ARTIFACT_FORMAT, BUILD_INFO_DIR, DEBUG_ARTIFACT_SUFFIX};

/// Matches solc's library placeholders, `__$<34 hex chars>$__`.
static LINK_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__\$[0-9a-fA-F]{34}\$__").expect("valid regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(rename = "_format")]
    pub format: String,
    pub contract_name: String,
    pub source_name: String,
    pub abi: Vec<AbiItem>,
    pub bytecode: String,
    /// Source file -> library name -> offsets into `bytecode`.
    #[serde(default)]
    pub link_references: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

/// The parts of an ABI entry we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct AbiItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub inputs: Vec<serde_json::Value>,
}

impl Artifact {
    /// `contracts/MetaChess.sol:MetaChess`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Number of parameters the constructor takes.
    pub fn constructor_inputs(&self) -> usize {
        self.abi
            .iter()
            .find(|item| item.kind == "constructor")
            .map_or(0, |item| item.inputs.len())
    }

    /// Decoded creation bytecode, without constructor arguments.
    pub fn creation_code(&self) -> eyre::Result<Vec<u8>> {
        let code = self.bytecode.trim_start_matches("0x");
        if code.is_empty() {
            bail!(
                "{} is abstract or an interface and cannot be deployed",
                self.fully_qualified_name()
            );
        }

        if !self.link_references.is_empty() || LINK_PLACEHOLDER.is_match(code) {
            let libraries = self
                .link_references
                .iter()
                .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{source}:{lib}")))
                .collect::<Vec<_>>();
            bail!(
                "{} needs to be linked against libraries before deploying: [{}]",
                self.fully_qualified_name(),
                libraries.join(", ")
            );
        }

        hex::decode(code).wrap_err_with(|| {
            format!("bytecode of {} is not valid hex", self.fully_qualified_name())
        })
    }
}

/// Reads and validates a single artifact file.
pub fn read(path: impl AsRef<Path>) -> eyre::Result<Artifact> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .wrap_err_with(|| eyre!("failed to read artifact {}", path.to_string_lossy()))?;
    let artifact: Artifact = serde_json::from_str(&contents)
        .wrap_err_with(|| eyre!("failed to parse artifact {}", path.to_string_lossy()))?;
    if artifact.format != ARTIFACT_FORMAT {
        bail!(
            "unsupported artifact format {:?} in {}, expected {ARTIFACT_FORMAT:?}",
            artifact.format,
            path.to_string_lossy()
        );
    }

    Ok(artifact)
}

/// Finds the artifact file for `name` in `dir`.
///
/// `name` is either a bare contract name, searched for in every source, or a
/// fully-qualified `source:Contract` name, which maps to one exact path.
pub fn find(dir: impl AsRef<Path>, name: &str) -> eyre::Result<PathBuf> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        bail!(
            "artifacts directory {} does not exist, compile the contracts first",
            dir.to_string_lossy()
        );
    }

    if let Some((source, contract)) = name.rsplit_once(':') {
        let path = dir.join(source).join(format!("{contract}.json"));
        if !path.is_file() {
            bail!(
                "artifact for {name} not found at {}",
                path.to_string_lossy()
            );
        }
        return Ok(path);
    }

    let file_name = format!("{name}.json");
    let mut candidates = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() != 1 || e.file_name() != BUILD_INFO_DIR);
    for entry in walker {
        let entry = entry.wrap_err("failed to walk artifacts directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let entry_name = entry.file_name().to_string_lossy();
        if entry_name.ends_with(DEBUG_ARTIFACT_SUFFIX) || entry_name != file_name {
            continue;
        }
        candidates.push(entry.into_path());
    }

    match candidates.len() {
        0 => bail!(
            "artifact for contract {name} not found in {}",
            dir.to_string_lossy()
        ),
        1 => Ok(candidates.remove(0)),
        _ => {
            let names = candidates
                .iter()
                .map(|path| qualified_name(dir, path, name))
                .collect::<Vec<_>>();
            bail!(
                "there are multiple artifacts for contract {name}, use one of these fully-qualified names instead: [{}]",
                names.join(", ")
            )
        }
    }
}

/// Finds and reads the artifact for `name`.
pub fn load(dir: impl AsRef<Path>, name: &str) -> eyre::Result<Artifact> {
    let path = find(dir, name)?;
    let artifact = read(&path)?;
    let expected = name.rsplit_once(':').map_or(name, |(_, contract)| contract);
    if artifact.contract_name != expected {
        bail!(
            "artifact {} holds contract {}, not {expected}",
            path.to_string_lossy(),
            artifact.contract_name
        );
    }

    Ok(artifact)
}

fn qualified_name(dir: &Path, path: &Path, name: &str) -> String {
    let source = path
        .parent()
        .and_then(|parent| parent.strip_prefix(dir).ok())
        .map(|source| source.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    format!("{source}:{name}")
}
