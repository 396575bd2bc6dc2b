//! File-backed cache: one JSON document per URL.

use super::{is_fresh, CacheError, CacheProvider, CacheResult, Freshness, DEFAULT_MAX_AGE};
use crate::headers::Headers;
use crate::response::{into_mapping, ResponseData};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use httpmaker_config::CacheConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Timestamp layout of the `time` field.
const TIME_FORMAT: &str = "%H:%M:%S %d-%m-%Y";

/// Substitutions applied to every URL after the scheme is stripped.
const BUILTIN_REPLACEMENTS: [(&str, &str); 7] = [
    ("%20", "_"),
    (" ", "_"),
    ("/", "_"),
    ("\\", "_"),
    (":", "_"),
    ("?", "-"),
    ("&", "-"),
];

/// Which response headers are written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HeaderFilter {
    /// Store `null` instead of headers.
    #[default]
    None,
    /// Store every header.
    All,
    /// Store only the listed names (case-insensitive).
    Allow(Vec<String>),
}

impl HeaderFilter {
    /// Build from the config representation: absent → `None`, a `"*"`
    /// entry → `All`, anything else → `Allow`.
    pub fn from_config(allow_headers: Option<&[String]>) -> Self {
        match allow_headers {
            None => Self::None,
            Some(names) if names.iter().any(|n| n == CacheConfig::ALL_HEADERS) => Self::All,
            Some(names) => Self::Allow(names.to_vec()),
        }
    }

    /// Derive the header set to persist. Never modifies `headers`.
    pub fn apply(&self, headers: &Headers) -> Option<Headers> {
        match self {
            Self::None => None,
            Self::All => Some(headers.clone()),
            Self::Allow(names) => Some(
                headers
                    .iter()
                    .filter(|(key, _)| names.iter().any(|n| n.eq_ignore_ascii_case(key)))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        }
    }
}

/// On-disk document layout.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    headers: Option<Headers>,
    #[serde(default)]
    json: Option<Value>,
}

impl StoredEntry {
    /// A document written for another URL whose key sanitizes to the same
    /// file name. Documents without a `url` are accepted.
    fn belongs_to_other(&self, key: &str) -> bool {
        self.url.as_deref().is_some_and(|url| url != key)
    }

    fn into_response(self) -> ResponseData {
        let fetched_at = self
            .time
            .as_deref()
            .and_then(parse_time)
            .unwrap_or_else(fallback_time);

        ResponseData::new(
            self.url.unwrap_or_else(|| "url_not_found".to_string()),
            self.status,
            self.headers.unwrap_or_default(),
            self.json.map(into_mapping).unwrap_or_default(),
            fetched_at,
        )
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, TIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Timestamp given to entries whose `time` is missing or unreadable.
/// Old enough that the default freshness check always fails.
fn fallback_time() -> DateTime<Utc> {
    let naive = NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .unwrap_or_default();
    Utc.from_utc_datetime(&naive)
}

/// Cache provider storing each response as `<root>/<sanitized url>.json`.
///
/// Times are written in UTC with second precision.
#[derive(Clone)]
pub struct FileCache {
    root: PathBuf,
    header_filter: HeaderFilter,
    ignore_url_part: Option<String>,
    replacements: Vec<(String, String)>,
    max_age: Duration,
    condition: Option<Freshness>,
}

impl fmt::Debug for FileCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCache")
            .field("root", &self.root)
            .field("header_filter", &self.header_filter)
            .field("ignore_url_part", &self.ignore_url_part)
            .field("replacements", &self.replacements)
            .field("max_age", &self.max_age)
            .field("custom_condition", &self.condition.is_some())
            .finish()
    }
}

impl FileCache {
    /// Create a cache rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> CacheResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            header_filter: HeaderFilter::None,
            ignore_url_part: None,
            replacements: Vec::new(),
            max_age: DEFAULT_MAX_AGE,
            condition: None,
        })
    }

    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        let mut cache = Self::new(&config.dir)?
            .with_header_filter(HeaderFilter::from_config(config.allow_headers.as_deref()))
            .with_max_age(config.max_age());

        if let Some(prefix) = &config.ignore_url_part {
            cache = cache.ignore_url_part(prefix.clone());
        }
        for (from, to) in &config.replacements {
            cache = cache.with_replacement(from.clone(), to.clone());
        }

        Ok(cache)
    }

    pub fn with_header_filter(mut self, filter: HeaderFilter) -> Self {
        self.header_filter = filter;
        self
    }

    /// Strip this prefix from URLs before naming files.
    pub fn ignore_url_part(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.ignore_url_part = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Add a substitution applied after the built-in ones.
    pub fn with_replacement(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let from = from.into();
        if !from.is_empty() {
            self.replacements.push((from, to.into()));
        }
        self
    }

    /// Change the window used by the default freshness check.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Replace the freshness check entirely.
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ResponseData) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File-system-safe key for a URL.
    pub fn key_for(&self, url: &str) -> String {
        let mut key = match &self.ignore_url_part {
            Some(prefix) => url.replace(prefix.as_str(), ""),
            None => url.to_string(),
        };

        for scheme in ["https://", "http://"] {
            if let Some(rest) = key.strip_prefix(scheme) {
                key = rest.to_string();
            }
        }

        for (from, to) in BUILTIN_REPLACEMENTS {
            key = key.replace(from, to);
        }
        for (from, to) in &self.replacements {
            key = key.replace(from.as_str(), to);
        }

        if key.is_empty() {
            key.push('_');
        }
        key
    }

    /// Path of the file holding the entry for `url`.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(format!("{}.json", self.key_for(url)))
    }

    /// Remove every entry, returning how many files were deleted.
    pub fn clear(&self) -> CacheResult<usize> {
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl CacheProvider for FileCache {
    fn get(&self, key: &str) -> CacheResult<Option<ResponseData>> {
        let path = self.path_for(key);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io(e)),
        };

        let stored: StoredEntry = serde_json::from_slice(&contents)?;
        if stored.belongs_to_other(key) {
            tracing::debug!(
                key,
                stored_url = stored.url.as_deref().unwrap_or_default(),
                path = %path.display(),
                "cache file holds another url"
            );
            return Ok(None);
        }

        Ok(Some(stored.into_response()))
    }

    fn put(&self, entry: &ResponseData) -> CacheResult<()> {
        let stored = StoredEntry {
            url: Some(entry.url().to_string()),
            status: entry.status(),
            time: Some(format_time(entry.fetched_at())),
            headers: self.header_filter.apply(entry.headers()),
            json: Some(Value::Object(entry.body().clone())),
        };

        let path = self.path_for(entry.url());
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&stored)?)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(url = %entry.url(), path = %path.display(), "cache entry written");
        Ok(())
    }

    fn condition(&self, entry: &ResponseData) -> bool {
        match &self.condition {
            Some(condition) => condition(entry),
            None => is_fresh(entry, self.max_age),
        }
    }

    fn evict(&self, key: &str) -> CacheResult<bool> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        }
    }
}
