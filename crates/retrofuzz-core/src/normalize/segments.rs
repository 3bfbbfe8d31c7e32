//! Splitting raw text into plain text and bracket groups.

/// Bracket style of a metadata group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    Round,
    Square,
}

impl Bracket {
    pub fn open(self) -> char {
        match self {
            Bracket::Round => '(',
            Bracket::Square => '[',
        }
    }

    pub fn close(self) -> char {
        match self {
            Bracket::Round => ')',
            Bracket::Square => ']',
        }
    }

    fn from_open(c: char) -> Option<Self> {
        match c {
            '(' => Some(Bracket::Round),
            '[' => Some(Bracket::Square),
            _ => None,
        }
    }
}

/// A piece of a label: plain text or a complete bracket group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Group { bracket: Bracket, inner: String },
}

impl Segment {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(text) => Some(text),
            Segment::Group { .. } => None,
        }
    }

    fn push_to(&self, out: &mut String) {
        match self {
            Segment::Text(text) => out.push_str(text),
            Segment::Group { bracket, inner } => {
                out.push(bracket.open());
                out.push_str(inner);
                out.push(bracket.close());
            }
        }
    }
}

/// Parse text into segments.
///
/// A group runs from an opening bracket to its balanced closing bracket of the
/// same style; brackets of the other style inside are group content. An
/// opening bracket that is never closed is plain text.
pub fn parse(text: &str) -> Vec<Segment> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let Some(bracket) = Bracket::from_open(c) {
            if let Some(end) = find_close(&chars, i, bracket) {
                if !plain.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut plain)));
                }
                segments.push(Segment::Group {
                    bracket,
                    inner: chars[i + 1..end].iter().collect(),
                });
                i = end + 1;
                continue;
            }
        }
        plain.push(c);
        i += 1;
    }

    if !plain.is_empty() {
        segments.push(Segment::Text(plain));
    }
    segments
}

fn find_close(chars: &[char], start: usize, bracket: Bracket) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &c) in chars[start..].iter().enumerate() {
        if c == bracket.open() {
            depth += 1;
        } else if c == bracket.close() {
            depth -= 1;
            if depth == 0 {
                return Some(start + offset);
            }
        }
    }
    None
}

/// Merge adjacent text segments so text searches see contiguous text.
pub fn coalesce(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                if let Some(Segment::Text(previous)) = out.last_mut() {
                    previous.push_str(&text);
                } else {
                    out.push(Segment::Text(text));
                }
            }
            group => out.push(group),
        }
    }
    out
}

/// Render segments back into a single string.
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        segment.push_to(&mut out);
    }
    out
}
