/// Template scanning — splits a story line into literal text and
/// `[category]` placeholders.

/// A segment of a scanned template line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, emitted as-is.
    Literal(&'a str),
    /// Placeholder `[name]`; holds `name` exactly as written, brackets removed.
    Placeholder(&'a str),
}

/// A scanned template line — a sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLine<'a> {
    pub segments: Vec<Segment<'a>>,
}

impl<'a> TemplateLine<'a> {
    /// Scan a line left to right.
    ///
    /// Syntax:
    /// - `[` opens a placeholder; the name runs to the next `]`
    /// - `[]` is a placeholder with an empty name
    /// - a `[` with no `]` after it on the line is literal text
    /// - everything else is literal
    ///
    /// Text on either side of a placeholder is kept byte for byte, so
    /// `[verb]ing` scans as a placeholder followed by the literal `ing`.
    pub fn scan(input: &'a str) -> TemplateLine<'a> {
        let mut segments = Vec::new();
        let mut rest = input;

        while let Some(open) = rest.find('[') {
            let after_open = &rest[open + 1..];
            let Some(close) = after_open.find(']') else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Literal(&rest[..open]));
            }
            segments.push(Segment::Placeholder(&after_open[..close]));
            rest = &after_open[close + 1..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }

        TemplateLine { segments }
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(*name),
            Segment::Literal(_) => None,
        })
    }

    /// True when the line has no placeholders.
    pub fn is_literal(&self) -> bool {
        self.placeholders().next().is_none()
    }
}
