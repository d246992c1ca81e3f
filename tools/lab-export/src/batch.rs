//! Parallel conversion of many `.lab` files
//!
//! Each file is an independent orchestrator run on the rayon pool; a failure
//! is recorded for that file and the others carry on.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use hashbrown::HashMap;
use lab_common::formats::LAB_EXT;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::convert::{self, ConvertOptions};

/// One file found by [`collect_inputs`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BatchInput {
    pub path: PathBuf,
    /// Path below the directory argument it was found under (file name for
    /// files named directly); mirrored under the output directory
    pub relative: PathBuf,
}

impl BatchInput {
    /// A file named directly on the command line
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let relative = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.clone());
        Self { path, relative }
    }
}

/// Outcome for one input file
#[derive(Debug)]
pub struct BatchEntry {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<()>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|e| e.result.is_err())
    }
}

/// Expand files and directories (recursively) into `.lab` files, sorted
pub fn collect_inputs(inputs: &[PathBuf]) -> Vec<BatchInput> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
                if !(entry.file_type().is_file() && has_lab_extension(entry.path())) {
                    continue;
                }
                let relative = match entry.path().strip_prefix(input) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => PathBuf::from(entry.file_name()),
                };
                files.push(BatchInput {
                    path: entry.into_path(),
                    relative,
                });
            }
        } else {
            files.push(BatchInput::file(input));
        }
    }
    files.sort();
    files.dedup_by(|a, b| a.path == b.path);
    files
}

fn has_lab_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(LAB_EXT))
}

/// Where the `.dae` for `input` goes: next to it, or under `output_dir`
/// keeping its relative path
pub fn output_path(input: &BatchInput, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => convert::default_output(&dir.join(&input.relative)),
        None => convert::default_output(&input.path),
    }
}

/// Convert every file in parallel.
///
/// Inputs that would write the same output path all fail without writing.
pub fn convert_all(
    inputs: &[BatchInput],
    output_dir: Option<&Path>,
    options: &ConvertOptions,
) -> BatchReport {
    let outputs: Vec<PathBuf> = inputs
        .iter()
        .map(|input| output_path(input, output_dir))
        .collect();
    let mut claims: HashMap<&Path, usize> = HashMap::with_capacity(outputs.len());
    for output in &outputs {
        *claims.entry(output.as_path()).or_default() += 1;
    }

    let entries = inputs
        .par_iter()
        .zip(outputs.par_iter())
        .map(|(input, output)| {
            let shared = claims.get(output.as_path()).copied().unwrap_or(0);
            let result = if shared > 1 {
                Err(anyhow!(
                    "output {:?} is shared with {} other input(s)",
                    output,
                    shared - 1
                ))
            } else {
                convert::convert_to_file(&input.path, output, options)
            };
            if let Err(e) = &result {
                tracing::warn!("{:?}: {:#}", input.path, e);
            }
            BatchEntry {
                input: input.path.clone(),
                output: output.clone(),
                result,
            }
        })
        .collect();

    BatchReport { entries }
}
