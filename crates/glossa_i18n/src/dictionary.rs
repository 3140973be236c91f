use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DictionaryParseError;
use crate::message::{ArgValue, Message};

const MAX_ENTRIES: usize = 10_000;
const MAX_KEY_BYTES: usize = 128;
const MAX_VALUE_BYTES: usize = 16 * 1024;
const MAX_EXPANDED_BYTES: usize = 64 * 1024;

/// On-disk dictionary formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CatalogFormat {
    /// A JSON object; nested objects flatten into dotted keys
    Json,
    /// A flat YAML mapping of string keys to string values
    Yaml,
    /// One `key = value` entry per line
    KeyValue,
}

impl CatalogFormat {
    /// Every format, in lookup order
    pub const ALL: [CatalogFormat; 3] = [Self::Json, Self::Yaml, Self::KeyValue];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Json => &["json"],
            Self::Yaml => &["yaml", "yml"],
            Self::KeyValue => &["txt"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut it = key.chars();
    match it.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    it.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

/// Limits shared by every format. JSON and YAML keys are otherwise free-form.
fn check_limits(key: &str, value: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(format!("key `{key}` is too long (max {MAX_KEY_BYTES} bytes)"));
    }
    if value.len() > MAX_VALUE_BYTES {
        return Err(format!(
            "value for key `{key}` is too long (max {MAX_VALUE_BYTES} bytes)"
        ));
    }
    Ok(())
}

/// The line format also restricts the key grammar, since `=` and `#` are syntax there.
fn check_line_entry(key: &str, value: &str) -> Result<(), String> {
    if !is_valid_key(key) {
        return Err(format!(
            "invalid key `{key}` (allowed: [A-Za-z0-9][A-Za-z0-9_.-]*)"
        ));
    }
    check_limits(key, value)
}

/// Translations for one language: key -> translated string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary {
    entries: HashMap<String, String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Format a message with `{name}` placeholders.
    ///
    /// Returns `None` if the key is missing.
    pub fn format_message(&self, msg: &Message) -> Option<String> {
        let template = self.get(msg.id.as_ref())?;
        let args: Vec<(&str, &ArgValue)> = msg.args.iter().map(|(k, v)| (k.as_ref(), v)).collect();
        Some(apply_placeholders(template, &args))
    }

    /// Translate a message, falling back to its key id when missing.
    pub fn translate(&self, msg: impl Into<Message>) -> String {
        let msg = msg.into();
        self.format_message(&msg)
            .unwrap_or_else(|| msg.id.into_owned())
    }

    /// Parse with format detection: JSON objects, then YAML mappings, then
    /// the `key = value` line format.
    pub fn parse(src: &str) -> Result<Self, DictionaryParseError> {
        if src.trim_start().starts_with('{') {
            return Self::parse_as(src, CatalogFormat::Json);
        }
        if let Some(dict) = try_parse_yaml(src)? {
            return Ok(dict);
        }
        Self::parse_as(src, CatalogFormat::KeyValue)
    }

    /// Parse in an explicit format
    pub fn parse_as(src: &str, format: CatalogFormat) -> Result<Self, DictionaryParseError> {
        match format {
            CatalogFormat::Json => parse_json(src),
            CatalogFormat::Yaml => try_parse_yaml(src)?.ok_or_else(|| {
                DictionaryParseError::Yaml("expected a mapping of keys to strings".to_string())
            }),
            CatalogFormat::KeyValue => parse_key_value(src),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn parse_json(src: &str) -> Result<Dictionary, DictionaryParseError> {
    let value: serde_json::Value =
        serde_json::from_str(src).map_err(|e| DictionaryParseError::Json(e.to_string()))?;
    let serde_json::Value::Object(root) = value else {
        return Err(DictionaryParseError::Json(
            "top level must be an object".to_string(),
        ));
    };

    let mut dict = Dictionary::new();
    let mut stack: Vec<(String, serde_json::Map<String, serde_json::Value>)> =
        vec![(String::new(), root)];

    while let Some((prefix, object)) = stack.pop() {
        for (k, v) in object {
            let key = if prefix.is_empty() {
                k
            } else {
                format!("{prefix}.{k}")
            };
            match v {
                serde_json::Value::String(s) => {
                    check_limits(&key, &s).map_err(DictionaryParseError::Json)?;
                    if dict.len() >= MAX_ENTRIES {
                        return Err(DictionaryParseError::Json(format!(
                            "too many entries (max {MAX_ENTRIES})"
                        )));
                    }
                    dict.insert(key, s);
                }
                serde_json::Value::Object(nested) => stack.push((key, nested)),
                _ => {
                    return Err(DictionaryParseError::Json(format!(
                        "value for key `{key}` must be a string or an object"
                    )))
                }
            }
        }
    }
    Ok(dict)
}

fn looks_like_yaml_mapping(src: &str) -> bool {
    for raw in src.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        // `=` before `:` means the line format.
        if let Some(colon) = line.find(':') {
            match line.find('=') {
                Some(eq) if eq < colon => {}
                _ => return true,
            }
        }
        if line.contains('=') {
            return false;
        }
    }
    false
}

fn try_parse_yaml(src: &str) -> Result<Option<Dictionary>, DictionaryParseError> {
    let raw = match serde_yaml::from_str::<serde_yaml::Value>(src) {
        Ok(serde_yaml::Value::Mapping(raw)) => raw,
        Ok(_) => return Ok(None),
        Err(e) => {
            if looks_like_yaml_mapping(src) {
                return Err(DictionaryParseError::Yaml(format!("yaml parse error: {e}")));
            }
            return Ok(None);
        }
    };

    if raw.len() > MAX_ENTRIES {
        return Err(DictionaryParseError::Yaml(format!(
            "too many entries (max {MAX_ENTRIES})"
        )));
    }

    let mut dict = Dictionary::new();
    for (k, v) in raw {
        let Some(key) = k.as_str() else {
            return Err(DictionaryParseError::Yaml(
                "yaml keys must be strings".to_string(),
            ));
        };
        let Some(value) = v.as_str() else {
            return Err(DictionaryParseError::Yaml(format!(
                "yaml value for key `{key}` must be a string"
            )));
        };
        check_limits(key, value).map_err(DictionaryParseError::Yaml)?;
        dict.insert(key, value);
    }
    Ok(Some(dict))
}

fn parse_key_value(src: &str) -> Result<Dictionary, DictionaryParseError> {
    let mut dict = Dictionary::new();
    for (idx, raw_line) in src.lines().enumerate() {
        let line_no = idx + 1;
        let syntax = |msg: String| DictionaryParseError::Syntax { line: line_no, msg };

        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(syntax("expected `key = value`".to_string()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(syntax("empty key".to_string()));
        }

        let value = strip_inline_comment(value.trim());
        let value = unquote(value).map_err(syntax)?;
        check_line_entry(key, &value).map_err(syntax)?;

        if dict.len() >= MAX_ENTRIES && !dict.contains_key(key) {
            return Err(syntax(format!("too many entries (max {MAX_ENTRIES})")));
        }
        dict.insert(key, value);
    }
    Ok(dict)
}

/// Inline comments only count when preceded by whitespace.
fn strip_inline_comment(value: &str) -> &str {
    let cut = [" #", " //"]
        .iter()
        .filter_map(|marker| value.find(marker))
        .min();
    match cut {
        Some(pos) => value[..pos].trim_end(),
        None => value,
    }
}

fn unquote(s: &str) -> Result<String, String> {
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if !quoted {
        return Ok(s.to_string());
    }

    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut it = inner.chars();
    while let Some(c) = it.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match it.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => return Err("dangling escape".to_string()),
        }
    }
    Ok(out)
}

/// Output buffer that stops growing at `MAX_EXPANDED_BYTES`.
struct Expansion {
    out: String,
}

impl Expansion {
    fn full(&self) -> bool {
        self.out.len() >= MAX_EXPANDED_BYTES
    }

    fn push(&mut self, c: char) {
        if self.out.len() + c.len_utf8() <= MAX_EXPANDED_BYTES {
            self.out.push(c);
        }
    }

    fn push_str(&mut self, s: &str) {
        let remaining = MAX_EXPANDED_BYTES.saturating_sub(self.out.len());
        let mut end = remaining.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        self.out.push_str(&s[..end]);
    }
}

/// Replace `{name}` tokens. `{{` and `}}` escape braces, unknown
/// placeholders stay visible, and an unclosed `{` is literal text.
fn apply_placeholders(template: &str, args: &[(&str, &ArgValue)]) -> String {
    if !template.contains(['{', '}']) {
        return template.to_string();
    }

    let mut buf = Expansion {
        out: String::with_capacity((template.len() + 8).min(MAX_EXPANDED_BYTES)),
    };
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if buf.full() {
            break;
        }
        match c {
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                buf.push('}');
            }
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                buf.push('{');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }

                if !closed {
                    buf.push('{');
                    buf.push_str(&name);
                    break;
                }

                let name = name.trim();
                if name.is_empty() {
                    buf.push_str("{}");
                    continue;
                }
                match args.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => buf.push_str(&value.render()),
                    None => {
                        buf.push('{');
                        buf.push_str(name);
                        buf.push('}');
                    }
                }
            }
            other => buf.push(other),
        }
    }

    buf.out
}
