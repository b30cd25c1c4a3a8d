//! Query content gathering.
//!
//! Collects the prompt from positional words, `--file` arguments and piped
//! stdin, in that order.

use crate::error::{Error, Result};
use crate::resolve::StdinMode;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Separator between content sources.
const SOURCE_SEPARATOR: &str = "\n\n";

/// Language tag for a fenced block, taken from the file extension.
fn fence_tag(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Wrap content in a markdown code fence.
fn fence(tag: &str, content: &str) -> String {
    format!("```{}\n{}\n```", tag, content.trim_end())
}

/// Read every file and wrap each in a fenced block tagged with its extension.
/// The first missing or unreadable file aborts the whole read.
pub fn read_file_blocks(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths.iter().map(PathBuf::as_path).map(read_file_block).collect()
}

fn read_file_block(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::ReadFile {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(fence(&fence_tag(path), &String::from_utf8_lossy(&bytes)))
}

/// Whether stdin is attached to an interactive terminal.
pub fn stdin_is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Read piped input according to `mode`. Returns an empty string when stdin
/// is skipped. Trailing whitespace is dropped.
pub fn read_stdin<R: Read>(mode: StdinMode, interactive: bool, mut reader: R) -> Result<String> {
    match mode {
        StdinMode::Disabled => return Ok(String::new()),
        StdinMode::Auto if interactive => return Ok(String::new()),
        StdinMode::Auto | StdinMode::Force => {}
    }

    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(Error::Stdin)?;
    Ok(String::from_utf8_lossy(&buf).trim_end().to_string())
}

/// Join the query text, file blocks and stdin with blank lines between them.
/// Blank sources are skipped; an empty result is an error.
pub fn assemble(query_text: &str, file_blocks: &[String], stdin_text: &str) -> Result<String> {
    let mut parts: Vec<&str> = Vec::with_capacity(file_blocks.len() + 2);

    if !query_text.is_empty() {
        parts.push(query_text);
    }
    parts.extend(file_blocks.iter().map(String::as_str));
    if !stdin_text.trim().is_empty() {
        parts.push(stdin_text);
    }

    let query = parts.join(SOURCE_SEPARATOR);
    if query.is_empty() {
        return Err(Error::EmptyQuery);
    }
    Ok(query)
}
