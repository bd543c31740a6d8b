//! `key=value` settings from the command line or an ini file
//!
//! Values may carry nested lists, split by the delimiters `;`, `,` and `:`
//! in that order of precedence:
//!
//! ```text
//! test=a:b:c,d:e:f;1:2:3
//! ```
//!
//! splits at `;` into `a:b:c,d:e:f` and `1:2:3`, the first of which splits at
//! `,` into `a:b:c` and `d:e:f`, and so on. Delimiters may be skipped but not
//! reordered.

use crate::domain::lines::{read_lines, skip_comments};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const DELIMITERS: &str = ";,:";

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Leaf(String),
    List { raw: String, items: Vec<ArgValue> },
}

impl ArgValue {
    pub fn parse(value: &str) -> Self {
        Self::parse_with(value, DELIMITERS)
    }

    fn parse_with(value: &str, delimiters: &str) -> Self {
        for (offset, delimiter) in delimiters.char_indices() {
            if !value.contains(delimiter) {
                continue;
            }
            let deeper = &delimiters[offset + delimiter.len_utf8()..];
            let items = value
                .split(delimiter)
                .filter(|piece| !piece.is_empty())
                .map(|piece| Self::parse_with(piece, deeper))
                .collect();
            return ArgValue::List {
                raw: value.to_string(),
                items,
            };
        }
        ArgValue::Leaf(value.to_string())
    }

    /// Full text of this value
    pub fn raw(&self) -> &str {
        match self {
            ArgValue::Leaf(value) => value,
            ArgValue::List { raw, .. } => raw,
        }
    }

    /// Text of item `index`; a leaf answers with itself for any index
    pub fn get(&self, index: usize) -> Option<&str> {
        match self {
            ArgValue::Leaf(value) => Some(value),
            ArgValue::List { items, .. } => items.get(index).map(ArgValue::raw),
        }
    }

    pub fn items(&self) -> &[ArgValue] {
        match self {
            ArgValue::Leaf(_) => &[],
            ArgValue::List { items, .. } => items,
        }
    }
}

/// Settings keyed by lowercase name
#[derive(Debug, Clone, Default)]
pub struct ArgTable {
    args: HashMap<String, ArgValue>,
}

impl ArgTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and insert a single `key=value` entry, returning its key
    ///
    /// Text after `#` is ignored and an entry without a value reads as `0`.
    pub fn add(&mut self, entry: &str) -> Option<String> {
        let entry = entry.split('#').next().unwrap_or_default();
        let mut parts = entry.split('=');
        let key = parts.next().unwrap_or_default().trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        let value = parts.next().map(str::trim).unwrap_or("0");
        self.args.insert(key.clone(), ArgValue::parse(value));
        Some(key)
    }

    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        table.extend(args);
        table
    }

    pub fn extend<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.add(arg.as_ref());
        }
    }

    /// Load entries from an ini file, skipping comments; returns the entry count
    pub async fn load_file<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<usize> {
        let path = path.as_ref();
        let lines = read_lines(path, skip_comments).await?;
        let count = lines.len();
        self.extend(lines);
        info!(path = %path.display(), count, "Loaded settings file");
        Ok(count)
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.args.get(&key.to_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn str_val(&self, key: &str, index: usize, default: &str) -> String {
        self.get(key)
            .and_then(|value| value.get(index))
            .unwrap_or(default)
            .to_string()
    }

    pub fn int_val(&self, key: &str, index: usize, default: i64) -> i64 {
        self.parsed(key, index).unwrap_or(default)
    }

    pub fn float_val(&self, key: &str, index: usize, default: f32) -> f32 {
        self.parsed(key, index).unwrap_or(default)
    }

    pub fn bool_val(&self, key: &str, index: usize, default: bool) -> bool {
        self.int_val(key, index, i64::from(default)) != 0
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, index: usize) -> Option<T> {
        let text = self.get(key)?.get(index)?;
        match text.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                debug!(key, text, "Ignoring unparsable setting");
                None
            }
        }
    }
}
