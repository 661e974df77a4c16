/// Word dictionary — category pools and the JSON/RON loaders.

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::category::Category;

const WORD_KEY: &str = "word";
const TYPE_KEY: &str = "type";

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("InputNotFound: dictionary '{}' could not be opened: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("MalformedInput: dictionary '{}' is not well-formed near line {line}: {detail}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        detail: String,
    },
    #[error("MissingField: dictionary '{}' has an entry without '{field}'; see line {line}", .path.display())]
    MissingField {
        path: PathBuf,
        line: usize,
        field: &'static str,
    },
    #[error("UnknownCategory: dictionary '{}' contains unknown type '{name}'; see line {line}", .path.display())]
    UnknownCategory {
        path: PathBuf,
        line: usize,
        name: String,
    },
    #[error("IOFailure: dictionary '{}' could not be read: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DictionaryError {
    /// Approximate source line of the failure, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Malformed { line, .. }
            | Self::MissingField { line, .. }
            | Self::UnknownCategory { line, .. } => Some(*line),
            Self::NotFound { .. } | Self::Io { .. } => None,
        }
    }
}

/// The candidate words for one category, in declaration order.
///
/// Never empty. Duplicates are kept, so a word listed twice is drawn twice
/// as often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPool {
    words: Vec<String>,
}

impl CategoryPool {
    fn new(first: String) -> Self {
        Self { words: vec![first] }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Draw one word uniformly at random.
    pub fn choose(&self, rng: &mut StdRng) -> &str {
        &self.words[rng.gen_range(0..self.words.len())]
    }
}

/// Category-indexed word pools. Built once by a loader, then read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    pools: FxHashMap<Category, CategoryPool>,
}

impl Dictionary {
    /// Load a dictionary, picking the format from the file extension:
    /// `.ron` files are read as RON, everything else as JSON.
    pub fn load(path: &Path) -> Result<Dictionary, DictionaryError> {
        let is_ron = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ron"));
        if is_ron {
            Self::load_from_ron(path)
        } else {
            Self::load_from_json(path)
        }
    }

    /// Load a dictionary from a JSON array of `{"word": .., "type": ..}` objects.
    pub fn load_from_json(path: &Path) -> Result<Dictionary, DictionaryError> {
        let file = File::open(path).map_err(|source| DictionaryError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let dictionary = Self::read_json(BufReader::new(file), path)?;
        dictionary.log_summary(path);
        Ok(dictionary)
    }

    /// Stream a JSON dictionary from `reader`. `path` only labels errors.
    ///
    /// Entries are validated as they are read, so a bad entry is reported
    /// at (roughly) the line where its object ends.
    pub fn read_json<R: Read>(reader: R, path: &Path) -> Result<Dictionary, DictionaryError> {
        let mut fault = None;
        let mut de = serde_json::Deserializer::from_reader(reader);
        let parsed = (&mut de).deserialize_seq(DictionaryVisitor { fault: &mut fault });
        parsed
            .and_then(|dictionary| de.end().map(|()| dictionary))
            .map_err(|err| classify_json_error(err, fault, path))
    }

    /// Parse a JSON dictionary held in memory.
    pub fn parse_json(input: &str, path: &Path) -> Result<Dictionary, DictionaryError> {
        Self::read_json(input.as_bytes(), path)
    }

    /// Load a dictionary from a RON map of category name to word list.
    pub fn load_from_ron(path: &Path) -> Result<Dictionary, DictionaryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::InvalidData {
                DictionaryError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            } else {
                DictionaryError::NotFound {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let dictionary = Self::parse_ron(&contents, path)?;
        dictionary.log_summary(path);
        Ok(dictionary)
    }

    /// Parse a RON dictionary such as `{ "noun": ["cat", "hat"] }`.
    pub fn parse_ron(input: &str, path: &Path) -> Result<Dictionary, DictionaryError> {
        // BTreeMap keeps pool order stable when two keys fold to one category.
        let raw: BTreeMap<String, Vec<String>> =
            ron::from_str(input).map_err(|err| DictionaryError::Malformed {
                path: path.to_path_buf(),
                line: err.position.line,
                detail: err.code.to_string(),
            })?;

        let mut dictionary = Dictionary::default();
        for (name, words) in raw {
            let category =
                Category::resolve(&name).ok_or_else(|| DictionaryError::UnknownCategory {
                    path: path.to_path_buf(),
                    line: key_line(input, &name),
                    name: name.clone(),
                })?;
            for word in words {
                dictionary.push(category, word);
            }
        }
        Ok(dictionary)
    }

    fn push(&mut self, category: Category, word: String) {
        match self.pools.get_mut(&category) {
            Some(pool) => pool.words.push(word),
            None => {
                self.pools.insert(category, CategoryPool::new(word));
            }
        }
    }

    /// The pool for `category`, if the dictionary declared any such word.
    pub fn pool(&self, category: Category) -> Option<&CategoryPool> {
        self.pools.get(&category)
    }

    /// Categories that have a pool, in `Category` order.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.pools.keys().copied().collect();
        categories.sort();
        categories
    }

    /// Total number of words across all pools.
    pub fn len(&self) -> usize {
        self.pools.values().map(CategoryPool::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    fn log_summary(&self, path: &Path) {
        debug!(
            "Loaded {} words in {} categories from '{}'",
            self.len(),
            self.pools.len(),
            path.display()
        );
        for category in self.categories() {
            if let Some(pool) = self.pool(category) {
                debug!("  {}: {} words", category, pool.len());
            }
        }
    }
}

impl FromIterator<(Category, String)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Category, String)>>(iter: I) -> Self {
        let mut dictionary = Dictionary::default();
        for (category, word) in iter {
            dictionary.push(category, word);
        }
        dictionary
    }
}

/// 1-based line of the first occurrence of `needle`, or 1 if absent.
/// 1-based line holding `"name"` used as a map key (the quoted name
/// followed by `:`); quoted occurrences inside word lists are skipped.
fn key_line(input: &str, name: &str) -> usize {
    let quoted = format!("\"{}\"", name);
    input
        .lines()
        .position(|line| {
            line.match_indices(&quoted)
                .any(|(at, _)| line[at + quoted.len()..].trim_start().starts_with(':'))
        })
        .map_or(1, |idx| idx + 1)
}

/// Schema violation recorded by the visitors. serde_json only carries a
/// message and position, so the typed fault travels alongside it.
#[derive(Debug)]
enum EntryFault {
    MissingField(&'static str),
    UnknownCategory(String),
}

impl fmt::Display for EntryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "entry is missing '{}'", field),
            Self::UnknownCategory(name) => write!(f, "unknown type '{}'", name),
        }
    }
}

fn classify_json_error(
    err: serde_json::Error,
    fault: Option<EntryFault>,
    path: &Path,
) -> DictionaryError {
    let path = path.to_path_buf();
    let line = err.line();
    match fault {
        Some(EntryFault::MissingField(field)) => DictionaryError::MissingField { path, line, field },
        Some(EntryFault::UnknownCategory(name)) => {
            DictionaryError::UnknownCategory { path, line, name }
        }
        None if err.is_io() => DictionaryError::Io {
            path,
            source: err.into(),
        },
        None => {
            let message = err.to_string();
            // Drop serde_json's " at line N column M" suffix; the line is reported separately.
            let detail = match message.rsplit_once(" at line ") {
                Some((head, _)) => head.to_string(),
                None => message,
            };
            DictionaryError::Malformed { path, line, detail }
        }
    }
}

/// Longest digit run a number literal may expand to; beyond it the
/// literal is kept as written.
const MAX_PLAIN_DIGITS: u64 = 1024;

/// Plain decimal text for a JSON number literal: the exponent is folded
/// into the position of the decimal point, and every digit given is kept
/// (`2.50` stays `2.50`, `1.0e-7` becomes `0.00000010`, `1e3` becomes `1000`).
fn plain_number(number: &serde_json::Number) -> String {
    let literal = number.to_string();
    plain_decimal(&literal).unwrap_or(literal)
}

fn plain_decimal(literal: &str) -> Option<String> {
    let (negative, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => (&unsigned[..idx], unsigned[idx + 1..].parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let joined = format!("{}{}", int_part, frac_part);
    let digits = match joined.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    // Digits right of the decimal point once the exponent is applied.
    let scale = (frac_part.len() as i64).checked_sub(exponent)?;
    if scale.unsigned_abs() > MAX_PLAIN_DIGITS {
        return None;
    }

    let body = if digits == "0" && scale <= 0 {
        "0".to_string()
    } else if scale <= 0 {
        format!("{}{}", digits, "0".repeat(scale.unsigned_abs() as usize))
    } else {
        let scale = scale as usize;
        if digits.len() > scale {
            let (whole, fraction) = digits.split_at(digits.len() - scale);
            format!("{}.{}", whole, fraction)
        } else {
            format!("0.{}{}", "0".repeat(scale - digits.len()), digits)
        }
    };

    let is_zero = body.bytes().all(|b| b == b'0' || b == b'.');
    Some(if negative && !is_zero {
        format!("-{}", body)
    } else {
        body
    })
}

/// `word` value as text. Anything but a non-empty string or a number
/// counts as absent.
fn word_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(plain_number(&n)),
        _ => None,
    }
}

/// Validates one `{"word": .., "type": ..}` object while the parser is still
/// inside it, so serde_json pins the error to the object's closing brace.
struct EntrySeed<'a> {
    fault: &'a mut Option<EntryFault>,
}

impl EntrySeed<'_> {
    fn fail<E: de::Error>(self, fault: EntryFault) -> E {
        let err = E::custom(&fault);
        *self.fault = Some(fault);
        err
    }
}

impl<'de> DeserializeSeed<'de> for EntrySeed<'_> {
    type Value = (Category, String);

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for EntrySeed<'_> {
    type Value = (Category, String);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with 'word' and 'type' keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut word = None;
        let mut kind = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                WORD_KEY => word = word_text(map.next_value()?),
                TYPE_KEY => {
                    kind = match map.next_value()? {
                        Value::String(s) => Some(s),
                        _ => None,
                    }
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        let (word, kind) = match (word, kind) {
            (Some(word), Some(kind)) => (word, kind),
            (None, _) => return Err(self.fail(EntryFault::MissingField(WORD_KEY))),
            (Some(_), None) => return Err(self.fail(EntryFault::MissingField(TYPE_KEY))),
        };
        match Category::resolve(&kind) {
            Some(category) => Ok((category, word)),
            None => Err(self.fail(EntryFault::UnknownCategory(kind))),
        }
    }
}

struct DictionaryVisitor<'a> {
    fault: &'a mut Option<EntryFault>,
}

impl<'de> Visitor<'de> for DictionaryVisitor<'_> {
    type Value = Dictionary;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of word entries")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Dictionary, A::Error> {
        let mut dictionary = Dictionary::default();
        while let Some((category, word)) = seq.next_element_seed(EntrySeed {
            fault: &mut *self.fault,
        })? {
            dictionary.push(category, word);
        }
        Ok(dictionary)
    }
}
