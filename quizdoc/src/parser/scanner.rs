//! Splits raw text into a title and labeled chunks on the `---` delimiter.

use std::ops::Range;

/// A slice of the source that remembers where it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Piece<'a> {
    pub text: &'a str,
    pub offset: usize,
}

impl<'a> Piece<'a> {
    pub(crate) fn new(text: &'a str, offset: usize) -> Self {
        Piece { text, offset }
    }

    pub(crate) fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub(crate) fn trim(self) -> Piece<'a> {
        let start = self.text.len() - self.text.trim_start().len();
        Piece {
            text: self.text.trim(),
            offset: self.offset + start,
        }
    }

    pub(crate) fn slice(self, range: Range<usize>) -> Piece<'a> {
        Piece {
            text: &self.text[range.clone()],
            offset: self.offset + range.start,
        }
    }

    /// Lines without their terminators (`\n` or `\r\n`).
    pub(crate) fn lines(self) -> impl Iterator<Item = Piece<'a>> {
        self.split('\n').map(|line| {
            let text = line.text.strip_suffix('\r').unwrap_or(line.text);
            Piece::new(text, line.offset)
        })
    }

    pub(crate) fn split(self, separator: char) -> impl Iterator<Item = Piece<'a>> {
        let Piece { text, offset } = self;
        let mut start = 0;
        text.split(separator).map(move |part| {
            let piece = Piece::new(part, offset + start);
            start += part.len() + separator.len_utf8();
            piece
        })
    }

    /// Split at the first occurrence of `separator`.
    pub(crate) fn split_once(self, separator: char) -> Option<(Piece<'a>, Piece<'a>)> {
        let at = self.text.find(separator)?;
        Some((
            self.slice(0..at),
            self.slice(at + separator.len_utf8()..self.text.len()),
        ))
    }
}

/// The recognized section headers. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Header {
    Vocabulary(Suffix),
    Cloze(Suffix),
    Instructions,
    Questions(Suffix),
    Text { listening: bool },
    Audio,
}

/// The optional `-N` capacity suffix of a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Suffix {
    pub capacity: Option<usize>,
    /// A suffix was written but is not a decimal integer.
    pub malformed: bool,
}

impl Header {
    pub(crate) fn classify(header: &str) -> Option<Header> {
        let header = header.trim().to_lowercase();
        if header.starts_with("vocab") {
            Some(Header::Vocabulary(Suffix::parse(&header)))
        } else if header.starts_with("cloze") {
            Some(Header::Cloze(Suffix::parse(&header)))
        } else if header.starts_with("instructions") {
            Some(Header::Instructions)
        } else if header.starts_with("questions") {
            Some(Header::Questions(Suffix::parse(&header)))
        } else {
            match header.as_str() {
                "text" => Some(Header::Text { listening: false }),
                "text-listening" => Some(Header::Text { listening: true }),
                "audio" => Some(Header::Audio),
                _ => None,
            }
        }
    }
}

impl Suffix {
    fn parse(header: &str) -> Suffix {
        let Some((_, suffix)) = header.split_once('-') else {
            return Suffix::default();
        };
        let suffix = suffix.trim();
        if suffix.is_empty() {
            return Suffix::default();
        }
        match suffix.parse::<usize>() {
            Ok(capacity) => Suffix {
                capacity: Some(capacity),
                malformed: false,
            },
            Err(_) => Suffix {
                capacity: None,
                malformed: true,
            },
        }
    }
}

/// One delimited chunk after the title chunk.
#[derive(Debug, Clone)]
pub(crate) struct Chunk<'a> {
    /// The whole chunk between delimiters.
    pub span: Range<usize>,
    pub header: Piece<'a>,
    pub kind: Option<Header>,
    /// Everything after the header line, trimmed at both ends. Inner line
    /// breaks (and blank lines) are preserved.
    pub body: Piece<'a>,
}

#[derive(Debug, Clone)]
pub(crate) struct Scan<'a> {
    pub title: Piece<'a>,
    pub chunks: Vec<Chunk<'a>>,
}

pub(crate) const DELIMITER: &str = "---";

pub(crate) fn scan(source: &str) -> Scan<'_> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (at, _) in source.match_indices(DELIMITER) {
        pieces.push(Piece::new(&source[start..at], start));
        start = at + DELIMITER.len();
    }
    pieces.push(Piece::new(&source[start..], start));

    let mut pieces = pieces.into_iter();
    let title = pieces
        .next()
        .and_then(|first| first.lines().find(|line| !line.is_blank()))
        .map(Piece::trim)
        .unwrap_or(Piece::new("", 0));

    let chunks = pieces.map(read_chunk).collect();
    Scan { title, chunks }
}

fn read_chunk(piece: Piece<'_>) -> Chunk<'_> {
    let span = piece.span();
    let trimmed = piece.trim();
    let (header, body) = match trimmed.text.find('\n') {
        Some(at) => (
            trimmed.slice(0..at),
            trimmed.slice(at + 1..trimmed.text.len()),
        ),
        None => (trimmed, trimmed.slice(trimmed.text.len()..trimmed.text.len())),
    };
    let header = header.trim();
    Chunk {
        span,
        header,
        kind: Header::classify(header.text),
        body: body.trim(),
    }
}
