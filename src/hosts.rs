//! The marked block focus appends to the hosts file.
//!
//! Everything focus writes lives between `# BEGIN FOCUS BLOCK` and
//! `# END FOCUS BLOCK`, so removing it never touches entries the user added.
//! File access goes through `fs2` advisory locks: shared for reads, exclusive
//! for writes, with truncation only after the exclusive lock is held.

use crate::error::{FocusError, Result};
use fs2::FileExt;
use regex::Regex;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const BLOCK_BEGIN: &str = "# BEGIN FOCUS BLOCK";
pub const BLOCK_END: &str = "# END FOCUS BLOCK";

static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^# BEGIN FOCUS BLOCK\n[\s\S]*?# END FOCUS BLOCK\n?")
        .expect("Invalid block pattern")
});

/// Render the block for `sites`, one `<ip>\t<site>` line each.
pub fn render_block(block_ip: &str, sites: &[String]) -> String {
    let mut block = String::from(BLOCK_BEGIN);
    block.push('\n');
    for site in sites {
        block.push_str(block_ip);
        block.push('\t');
        block.push_str(site);
        block.push('\n');
    }
    block.push_str(BLOCK_END);
    block.push('\n');
    block
}

pub fn is_blocked(content: &str) -> bool {
    BLOCK_PATTERN.is_match(content)
}

/// Remove every focus block, leaving the rest of the content as it was.
pub fn strip_blocks(content: &str) -> String {
    BLOCK_PATTERN.replace_all(content, "").into_owned()
}

pub fn with_block(content: &str, block: &str) -> String {
    let mut out = String::with_capacity(content.len() + block.len() + 1);
    out.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(block);
    out
}

/// Handle on the hosts file being edited.
#[derive(Debug, Clone)]
pub struct HostsFile {
    path: PathBuf,
}

impl HostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<String> {
        let file = File::open(&self.path).map_err(|e| self.err(e))?;
        file.lock_shared().map_err(|e| self.err(e))?;
        let mut content = String::new();
        BufReader::new(&file)
            .read_to_string(&mut content)
            .map_err(|e| self.err(e))?;
        Ok(content)
    }

    pub fn is_blocked(&self) -> Result<bool> {
        Ok(is_blocked(&self.read()?))
    }

    /// True when the exact `block` is present, untouched.
    pub fn contains(&self, block: &str) -> Result<bool> {
        Ok(self.read()?.contains(block))
    }

    /// Append `block` unless a focus block is already there.
    ///
    /// Returns `false` without writing when blocking is already active.
    pub fn apply(&self, block: &str) -> Result<bool> {
        self.update(|content| {
            if is_blocked(content) {
                None
            } else {
                Some(with_block(content, block))
            }
        })
    }

    /// Replace whatever focus blocks exist (possibly edited) with `block`.
    pub fn reapply(&self, block: &str) -> Result<()> {
        self.update(|content| {
            let cleaned = strip_blocks(content);
            Some(with_block(&cleaned, block))
        })?;
        Ok(())
    }

    /// Strip all focus blocks. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        self.update(|content| {
            if is_blocked(content) {
                Some(strip_blocks(content))
            } else {
                None
            }
        })
    }

    /// Read-modify-write under a single exclusive lock. `edit` returns `None`
    /// to leave the file alone.
    fn update<F>(&self, edit: F) -> Result<bool>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| self.err(e))?;
        file.lock_exclusive().map_err(|e| self.err(e))?;

        let mut current = String::new();
        BufReader::new(&file)
            .read_to_string(&mut current)
            .map_err(|e| self.err(e))?;

        let Some(updated) = edit(&current) else {
            return Ok(false);
        };

        file.set_len(0).map_err(|e| self.err(e))?;
        // The read above left the cursor at the old end of file.
        file.rewind().map_err(|e| self.err(e))?;
        let mut writer = BufWriter::new(&file);
        writer
            .write_all(updated.as_bytes())
            .map_err(|e| self.err(e))?;
        writer.flush().map_err(|e| self.err(e))?;
        Ok(true)
    }

    fn err(&self, source: std::io::Error) -> FocusError {
        FocusError::hosts(&self.path, source)
    }
}
