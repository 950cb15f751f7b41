use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::Result;

fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Duplicate-detection identity of one raw input line.
///
/// Older output and caches hashed lines that still carried a carriage
/// return, so every line is checked under both spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHashes {
    pub primary: String,
    pub alt_ending: String,
}

impl ContentHashes {
    /// `line` is the line as read, without its trailing `\n`.
    pub fn of(line: &str) -> Self {
        let mut alt = Vec::with_capacity(line.len() + 1);
        alt.extend_from_slice(line.as_bytes());
        alt.push(b'\r');
        Self {
            primary: digest(line.as_bytes()),
            alt_ending: digest(&alt),
        }
    }
}

pub trait DuplicateIndex {
    /// Whether either hash was already seen in the output or the cache.
    fn is_duplicate(&mut self, hashes: &ContentHashes) -> Result<bool>;

    /// Remember an accepted record.
    fn record(&mut self, hashes: &ContentHashes) -> Result<()>;
}

fn read_if_exists(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

fn append_hash(cache: &Path, hash: &str) -> Result<()> {
    if let Some(parent) = cache.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(cache)?;
    writeln!(file, "{hash}")?;
    Ok(())
}

/// Looks hashes up by re-reading the output file and then the cache on every
/// call. Linear per lookup; `MemoryIndex` is checked against it.
#[cfg(test)]
pub struct ScanIndex {
    output: PathBuf,
    cache: Option<PathBuf>,
    persist: bool,
}

#[cfg(test)]
impl ScanIndex {
    pub fn new(output: &Path, cache: Option<&Path>, persist: bool) -> Self {
        Self {
            output: output.to_path_buf(),
            cache: cache.map(Path::to_path_buf),
            persist,
        }
    }
}

#[cfg(test)]
fn contains_either(content: &str, hashes: &ContentHashes) -> bool {
    content.contains(&hashes.primary) || content.contains(&hashes.alt_ending)
}

#[cfg(test)]
impl DuplicateIndex for ScanIndex {
    fn is_duplicate(&mut self, hashes: &ContentHashes) -> Result<bool> {
        if let Some(content) = read_if_exists(&self.output)? {
            if contains_either(&content, hashes) {
                return Ok(true);
            }
        }
        if let Some(cache) = &self.cache {
            if let Some(content) = read_if_exists(cache)? {
                if contains_either(&content, hashes) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn record(&mut self, hashes: &ContentHashes) -> Result<()> {
        match &self.cache {
            Some(cache) if self.persist => append_hash(cache, &hashes.primary),
            _ => Ok(()),
        }
    }
}

fn hash_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[0-9a-f]{64}").expect("static regex"))
}

/// Hash set seeded from the output file and the cache at start-up, then
/// grown as records are accepted.
pub struct MemoryIndex {
    seen: HashSet<String>,
    cache: Option<PathBuf>,
    persist: bool,
}

impl MemoryIndex {
    pub fn load(output: Option<&Path>, cache: Option<&Path>, persist: bool) -> Result<Self> {
        let mut seen = HashSet::new();
        for path in output.into_iter().chain(cache) {
            if let Some(content) = read_if_exists(path)? {
                seen.extend(hash_token().find_iter(&content).map(|m| m.as_str().to_string()));
            }
        }
        Ok(Self {
            seen,
            cache: cache.map(Path::to_path_buf),
            persist,
        })
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

impl DuplicateIndex for MemoryIndex {
    fn is_duplicate(&mut self, hashes: &ContentHashes) -> Result<bool> {
        Ok(self.seen.contains(&hashes.primary) || self.seen.contains(&hashes.alt_ending))
    }

    fn record(&mut self, hashes: &ContentHashes) -> Result<()> {
        self.seen.insert(hashes.primary.clone());
        match &self.cache {
            Some(cache) if self.persist => append_hash(cache, &hashes.primary),
            _ => Ok(()),
        }
    }
}
