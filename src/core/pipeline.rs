/// The madlib pipeline: dictionary + template file → output file.
///
/// Wires the dictionary loader, template scanner, and substitution writer
/// together, owns the random source, and maps every failure onto one
/// error kind and exit code.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::dictionary::{Dictionary, DictionaryError};
use crate::core::substitution::{self, StoryStats, SubstitutionError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error("InputNotFound: template '{}' could not be opened: {source}", .path.display())]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("InputNotFound: output '{}' could not be created: {source}", .path.display())]
    OutputNotCreated {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{source} (template '{}')", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: SubstitutionError,
    },
    #[error("IOFailure: '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The failure taxonomy a run can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputNotFound,
    MalformedInput,
    MissingField,
    UnknownCategory,
    EmptyPool,
    IoFailure,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InputNotFound => "InputNotFound",
            Self::MalformedInput => "MalformedInput",
            Self::MissingField => "MissingField",
            Self::UnknownCategory => "UnknownCategory",
            Self::EmptyPool => "EmptyPool",
            Self::IoFailure => "IOFailure",
        }
    }

    /// Process exit status for this kind (sysexits.h values).
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InputNotFound => 66,
            Self::MalformedInput | Self::MissingField | Self::UnknownCategory | Self::EmptyPool => {
                65
            }
            Self::IoFailure => 74,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Dictionary(err) => match err {
                DictionaryError::NotFound { .. } => ErrorKind::InputNotFound,
                DictionaryError::Malformed { .. } => ErrorKind::MalformedInput,
                DictionaryError::MissingField { .. } => ErrorKind::MissingField,
                DictionaryError::UnknownCategory { .. } => ErrorKind::UnknownCategory,
                DictionaryError::Io { .. } => ErrorKind::IoFailure,
            },
            Self::TemplateNotFound { .. } | Self::OutputNotCreated { .. } => {
                ErrorKind::InputNotFound
            }
            Self::Template { source, .. } => match source {
                SubstitutionError::UnknownCategory { .. } => ErrorKind::UnknownCategory,
                SubstitutionError::EmptyPool { .. } => ErrorKind::EmptyPool,
                SubstitutionError::Read(_) | SubstitutionError::Write(_) => ErrorKind::IoFailure,
            },
            Self::Io { .. } => ErrorKind::IoFailure,
        }
    }

    /// Approximate input line of the failure, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Dictionary(err) => err.line(),
            Self::Template { source, .. } => source.line(),
            _ => None,
        }
    }
}

/// The top-level madlib engine. Built via `MadlibEngine::builder()`.
pub struct MadlibEngine {
    dictionary: Dictionary,
    rng: StdRng,
}

/// Builder for constructing a `MadlibEngine`.
#[derive(Default)]
pub struct MadlibEngineBuilder {
    dictionary_path: Option<PathBuf>,
    seed: Option<u64>,
    /// Directly provided dictionary (for testing without files).
    dictionary: Option<Dictionary>,
}

impl MadlibEngine {
    pub fn builder() -> MadlibEngineBuilder {
        MadlibEngineBuilder::default()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Fill the placeholders of a single line.
    pub fn fill_line(&mut self, line: &str) -> Result<String, SubstitutionError> {
        substitution::substitute_line(line, 1, &self.dictionary, &mut self.rng)
    }

    /// Stream a whole story from `reader` into `writer`.
    pub fn write_story<R: BufRead, W: Write>(
        &mut self,
        reader: R,
        writer: &mut W,
    ) -> Result<StoryStats, SubstitutionError> {
        substitution::write_story(reader, writer, &self.dictionary, &mut self.rng)
    }

    /// Read the template at `template_path` and write the filled story to
    /// `output_path`.
    ///
    /// The story is staged in a temporary file next to the destination and
    /// only moved into place once every line has been written, so a failed
    /// run never leaves a partial output behind.
    pub fn generate(
        &mut self,
        template_path: &Path,
        output_path: &Path,
    ) -> Result<StoryStats, PipelineError> {
        let template = File::open(template_path).map_err(|source| {
            PipelineError::TemplateNotFound {
                path: template_path.to_path_buf(),
                source,
            }
        })?;

        let output_dir = match output_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let staged =
            staging_file(output_dir).map_err(|source| PipelineError::OutputNotCreated {
                path: output_path.to_path_buf(),
                source,
            })?;
        debug!("Staging output in '{}'", staged.path().display());

        let mut writer = BufWriter::new(staged);
        let stats = self
            .write_story(BufReader::new(template), &mut writer)
            .map_err(|err| match err {
                SubstitutionError::Read(source) => PipelineError::Io {
                    path: template_path.to_path_buf(),
                    source,
                },
                SubstitutionError::Write(source) => PipelineError::Io {
                    path: output_path.to_path_buf(),
                    source,
                },
                other => PipelineError::Template {
                    path: template_path.to_path_buf(),
                    source: other,
                },
            })?;

        let staged = writer.into_inner().map_err(|err| PipelineError::Io {
            path: output_path.to_path_buf(),
            source: err.into_error(),
        })?;
        // Replacing a file keeps its mode; a new file gets the umask default.
        if let Ok(existing) = fs::metadata(output_path) {
            staged
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|source| PipelineError::Io {
                    path: output_path.to_path_buf(),
                    source,
                })?;
        }
        staged
            .persist(output_path)
            .map_err(|err| PipelineError::Io {
                path: output_path.to_path_buf(),
                source: err.error,
            })?;

        info!(
            "Filled {} placeholders across {} lines into '{}'",
            stats.placeholders,
            stats.lines_written,
            output_path.display()
        );
        Ok(stats)
    }
}

impl MadlibEngineBuilder {
    pub fn dictionary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dictionary_path = Some(path.into());
        self
    }

    /// Seed the random source. Without a seed the engine draws from OS entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide a dictionary directly (for testing without files).
    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn build(self) -> Result<MadlibEngine, PipelineError> {
        let dictionary = match (self.dictionary, self.dictionary_path) {
            (Some(dictionary), _) => dictionary,
            (None, Some(path)) => Dictionary::load(&path)?,
            (None, None) => Dictionary::default(),
        };

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(MadlibEngine { dictionary, rng })
    }
}

/// Temp file next to the output, created with the mode a plain
/// `File::create` would get (0o666 less the umask) rather than tempfile's
/// owner-only 0o600.
fn staging_file(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".madlib-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::category::Category;

    fn engine(seed: u64) -> MadlibEngine {
        let dictionary: Dictionary = [(Category::Noun, "cat"), (Category::Noun, "hat")]
            .into_iter()
            .map(|(c, w)| (c, w.to_string()))
            .collect();
        MadlibEngine::builder()
            .seed(seed)
            .with_dictionary(dictionary)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_default_is_empty_dictionary() {
        let engine = MadlibEngine::builder().build().unwrap();
        assert!(engine.dictionary().is_empty());
    }

    #[test]
    fn builder_reports_missing_dictionary_file() {
        let err = MadlibEngine::builder()
            .dictionary_path("does/not/exist.json")
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
        assert_eq!(err.kind().exit_code(), 66);
    }

    #[test]
    fn fill_line_uses_the_dictionary() {
        let mut engine = engine(5);
        let out = engine.fill_line("the [noun] sat").unwrap();
        assert!(out == "the cat sat" || out == "the hat sat", "{}", out);
    }

    #[test]
    fn seeded_engines_agree() {
        let template = "[noun] [noun] [noun] [noun]\n[noun]";
        let mut a = Vec::new();
        let mut b = Vec::new();
        engine(77).write_story(template.as_bytes(), &mut a).unwrap();
        engine(77).write_story(template.as_bytes(), &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn template_errors_are_classified() {
        let err = PipelineError::Template {
            path: PathBuf::from("story.txt"),
            source: SubstitutionError::EmptyPool {
                name: "verb".to_string(),
                category: Category::Verb,
                line: 4,
            },
        };
        assert_eq!(err.kind(), ErrorKind::EmptyPool);
        assert_eq!(err.line(), Some(4));
        let msg = err.to_string();
        assert!(msg.starts_with("EmptyPool:"), "{}", msg);
        assert!(msg.contains("story.txt"), "{}", msg);
    }

    #[test]
    fn exit_codes_distinguish_kinds() {
        assert_eq!(ErrorKind::MalformedInput.exit_code(), 65);
        assert_eq!(ErrorKind::MissingField.exit_code(), 65);
        assert_eq!(ErrorKind::UnknownCategory.exit_code(), 65);
        assert_eq!(ErrorKind::EmptyPool.exit_code(), 65);
        assert_eq!(ErrorKind::IoFailure.exit_code(), 74);
        assert_eq!(ErrorKind::IoFailure.to_string(), "IOFailure");
    }
}
