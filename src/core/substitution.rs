/// Substitution — splices random dictionary words into scanned template
/// lines and streams the story to a sink.

use log::debug;
use rand::rngs::StdRng;
use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::core::dictionary::Dictionary;
use crate::core::template::{Segment, TemplateLine};
use crate::schema::category::Category;

/// Line terminator written after every output line.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

#[derive(Debug, Error)]
pub enum SubstitutionError {
    #[error("UnknownCategory: placeholder '[{name}]' names no known category; see line {line}")]
    UnknownCategory { name: String, line: usize },
    #[error("EmptyPool: placeholder '[{name}]' asks for a {category} but the dictionary has none; see line {line}")]
    EmptyPool {
        name: String,
        category: Category,
        line: usize,
    },
    #[error("IOFailure: could not read template: {0}")]
    Read(#[source] io::Error),
    #[error("IOFailure: could not write output: {0}")]
    Write(#[source] io::Error),
}

impl SubstitutionError {
    /// Template line the failure refers to, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::UnknownCategory { line, .. } | Self::EmptyPool { line, .. } => Some(*line),
            Self::Read(_) | Self::Write(_) => None,
        }
    }
}

/// Counters for one run over a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoryStats {
    /// Lines read from the template, empty ones included.
    pub lines_read: usize,
    /// Lines written to the output.
    pub lines_written: usize,
    /// Placeholders substituted.
    pub placeholders: usize,
}

/// Fill every placeholder of `line` with an independent random draw.
///
/// `line_number` is 1-based and only used in errors.
pub fn substitute_line(
    line: &str,
    line_number: usize,
    dictionary: &Dictionary,
    rng: &mut StdRng,
) -> Result<String, SubstitutionError> {
    let scanned = TemplateLine::scan(line);
    splice(&scanned, line_number, dictionary, rng)
}

fn splice(
    scanned: &TemplateLine<'_>,
    line_number: usize,
    dictionary: &Dictionary,
    rng: &mut StdRng,
) -> Result<String, SubstitutionError> {
    let mut output = String::new();
    for segment in &scanned.segments {
        match *segment {
            Segment::Literal(text) => output.push_str(text),
            Segment::Placeholder(name) => {
                let category =
                    Category::resolve(name).ok_or_else(|| SubstitutionError::UnknownCategory {
                        name: name.to_string(),
                        line: line_number,
                    })?;
                let pool = dictionary
                    .pool(category)
                    .filter(|pool| !pool.is_empty())
                    .ok_or_else(|| SubstitutionError::EmptyPool {
                        name: name.to_string(),
                        category,
                        line: line_number,
                    })?;
                output.push_str(pool.choose(rng));
            }
        }
    }
    Ok(output)
}

/// Stream a template from `reader` to `writer`, one line at a time.
///
/// Empty template lines are dropped: they produce no output line at all.
/// Every other line is written with its placeholders filled, followed by
/// [`LINE_ENDING`]. The writer is flushed before returning.
pub fn write_story<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    dictionary: &Dictionary,
    rng: &mut StdRng,
) -> Result<StoryStats, SubstitutionError> {
    let mut stats = StoryStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(SubstitutionError::Read)?;
        stats.lines_read += 1;
        if line.is_empty() {
            continue;
        }

        let scanned = TemplateLine::scan(&line);
        let filled = splice(&scanned, idx + 1, dictionary, rng)?;
        stats.placeholders += scanned.placeholders().count();

        writer
            .write_all(filled.as_bytes())
            .and_then(|()| writer.write_all(LINE_ENDING.as_bytes()))
            .map_err(SubstitutionError::Write)?;
        stats.lines_written += 1;
    }

    writer.flush().map_err(SubstitutionError::Write)?;
    debug!(
        "Wrote {} of {} template lines, {} placeholders filled",
        stats.lines_written, stats.lines_read, stats.placeholders
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn dictionary() -> Dictionary {
        [
            (Category::Person, "Alice"),
            (Category::Adverb, "quickly"),
            (Category::Verb, "run"),
            (Category::Place, "park"),
            (Category::Noun, "cat"),
            (Category::Noun, "hat"),
            (Category::Noun, "bat"),
        ]
        .into_iter()
        .map(|(c, w)| (c, w.to_string()))
        .collect()
    }

    fn run(template: &str, seed: u64) -> Result<(String, StoryStats), SubstitutionError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = Vec::new();
        let stats = write_story(template.as_bytes(), &mut out, &dictionary(), &mut rng)?;
        Ok((String::from_utf8(out).unwrap(), stats))
    }

    #[test]
    fn substitute_single_word_pools() {
        let mut rng = StdRng::seed_from_u64(42);
        let out = substitute_line(
            "My friend [person] was [adverb] [verb]ing until arriving at [place].",
            1,
            &dictionary(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(out, "My friend Alice was quickly running until arriving at park.");
    }

    #[test]
    fn placeholder_case_is_folded() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = substitute_line("[PERSON] and [Person]", 1, &dictionary(), &mut rng).unwrap();
        assert_eq!(out, "Alice and Alice");
    }

    #[test]
    fn literal_lines_pass_through() {
        let mut rng = StdRng::seed_from_u64(1);
        for line in ["Just text.", "  padded\twith tabs  ", "Bad [bracket", "odd ] one"] {
            assert_eq!(substitute_line(line, 1, &dictionary(), &mut rng).unwrap(), line);
        }
    }

    #[test]
    fn substituted_words_come_from_the_pool() {
        let d = dictionary();
        let pool = d.pool(Category::Noun).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let out = substitute_line("<[noun]>", 1, &d, &mut rng).unwrap();
            let word = out.trim_start_matches('<').trim_end_matches('>');
            assert!(pool.contains(word), "unexpected word {}", word);
        }
    }

    #[test]
    fn draws_are_independent_per_placeholder() {
        // With three nouns, some seed must give two different words on one line.
        let d = dictionary();
        let differing = (0..50u64).any(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = substitute_line("[noun] [noun]", 1, &d, &mut rng).unwrap();
            let (a, b) = out.split_once(' ').unwrap();
            a != b
        });
        assert!(differing);
    }

    #[test]
    fn unknown_placeholder_reports_name_and_line() {
        let err = run("fine\n\nA [wizard] appears.", 0).unwrap_err();
        match err {
            SubstitutionError::UnknownCategory { ref name, line } => {
                assert_eq!(name, "wizard");
                assert_eq!(line, 3);
            }
            ref other => panic!("expected UnknownCategory, got {:?}", other),
        }
        assert!(err.to_string().starts_with("UnknownCategory:"));
    }

    #[test]
    fn empty_brackets_fail_resolution() {
        let err = run("a [] b", 0).unwrap_err();
        assert!(matches!(err, SubstitutionError::UnknownCategory { ref name, line: 1 } if name.is_empty()));
    }

    #[test]
    fn absent_category_is_empty_pool() {
        let err = run("I have [number] apples.", 0).unwrap_err();
        assert!(matches!(
            err,
            SubstitutionError::EmptyPool { category: Category::Number, line: 1, .. }
        ));
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn empty_lines_are_skipped() {
        let (out, stats) = run("A [noun].\n\nB [noun].", 3).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("A "));
        assert!(lines[1].starts_with("B "));
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.lines_written, 2);
        assert_eq!(stats.placeholders, 2);
    }

    #[test]
    fn every_output_line_is_terminated() {
        let (out, _) = run("one\ntwo", 0).unwrap();
        assert_eq!(out, format!("one{}two{}", LINE_ENDING, LINE_ENDING));
    }

    #[test]
    fn crlf_input_lines_are_split_cleanly() {
        let (out, stats) = run("one [person]\r\n\r\ntwo\r\n", 0).unwrap();
        assert_eq!(out, format!("one Alice{}two{}", LINE_ENDING, LINE_ENDING));
        assert_eq!(stats.lines_written, 2);
    }

    #[test]
    fn same_seed_same_story() {
        let template = "[noun] [noun] [noun]\n[noun], [noun]!";
        let (a, _) = run(template, 1234).unwrap();
        let (b, _) = run(template, 1234).unwrap();
        assert_eq!(a, b);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = write_story("text".as_bytes(), &mut FailingWriter, &dictionary(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, SubstitutionError::Write(_)));
    }

    #[test]
    fn invalid_utf8_is_a_read_failure() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut out = Vec::new();
        let err = write_story(&[0xff, 0xfe, b'\n'][..], &mut out, &dictionary(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, SubstitutionError::Read(_)));
    }
}
