use std::ops::Range;

/// A fill-in-the-blank passage. `body` still carries the `*word*` markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloze {
    pub body: String,
    /// Every marked word, in the order it appears in `body`.
    pub markers: Vec<Marker>,
    /// The words chosen as blanks when the document was parsed, in authored
    /// order. A blank's index is its position in this list.
    pub blank_words: Vec<String>,
    pub capacity: Option<usize>,
}

/// One `*word*` occurrence inside a cloze body.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Byte range in `body`, asterisks included.
    pub range: Range<usize>,
    pub word: String,
    /// Index into `blank_words`, or `None` if this marker was not selected.
    pub blank: Option<usize>,
}

/// A piece of a cloze body, in reading order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClozeSegment<'a> {
    Text(&'a str),
    Blank { index: usize, word: &'a str },
    /// A marked word that was not selected as a blank; shown as plain text.
    Plain(&'a str),
}

impl Cloze {
    pub fn blank_count(&self) -> usize {
        self.blank_words.len()
    }

    pub fn segments(&self) -> Vec<ClozeSegment<'_>> {
        let mut segments = Vec::with_capacity(self.markers.len() * 2 + 1);
        let mut cursor = 0;
        for marker in &self.markers {
            if marker.range.start > cursor {
                segments.push(ClozeSegment::Text(&self.body[cursor..marker.range.start]));
            }
            segments.push(match marker.blank {
                Some(index) => ClozeSegment::Blank {
                    index,
                    word: &marker.word,
                },
                None => ClozeSegment::Plain(&marker.word),
            });
            cursor = marker.range.end;
        }
        if cursor < self.body.len() {
            segments.push(ClozeSegment::Text(&self.body[cursor..]));
        }
        segments
    }

    /// The body with every marker replaced: blanks by `fill(index)`, the
    /// rest by their bare word.
    pub fn render_with(&self, mut fill: impl FnMut(usize) -> String) -> String {
        let mut out = String::with_capacity(self.body.len());
        for segment in self.segments() {
            match segment {
                ClozeSegment::Text(text) | ClozeSegment::Plain(text) => out.push_str(text),
                ClozeSegment::Blank { index, .. } => out.push_str(&fill(index)),
            }
        }
        out
    }
}
