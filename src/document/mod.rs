//! Raw line model
//!
//! A document is kept as a list of lines that remember how they were
//! terminated, so a pass can rewrite content without touching newlines.

/// Line terminator observed on input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eol {
    CrLf,
    Lf,
    /// Final line without a terminator, or a line ended by a lone CR.
    /// Written back as LF.
    None,
}

impl Eol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eol::CrLf => "\r\n",
            Eol::Lf | Eol::None => "\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub content: String,
    pub eol: Eol,
}

impl RawLine {
    pub fn new(content: impl Into<String>, eol: Eol) -> Self {
        Self {
            content: content.into(),
            eol,
        }
    }
}

/// Split text into raw lines. A line ends at `\n`, `\r\n` or a lone `\r`.
pub fn split_lines(text: &str) -> Vec<RawLine> {
    let mut lines = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        match rest.find(|c| c == '\n' || c == '\r') {
            Some(pos) => {
                let content = &rest[..pos];
                let tail = &rest[pos..];
                let (eol, width) = if tail.starts_with("\r\n") {
                    (Eol::CrLf, 2)
                } else if tail.starts_with('\n') {
                    (Eol::Lf, 1)
                } else {
                    (Eol::None, 1)
                };
                lines.push(RawLine::new(content, eol));
                rest = &rest[pos + width..];
            }
            None => {
                lines.push(RawLine::new(rest, Eol::None));
                break;
            }
        }
    }

    lines
}

/// Byte offset where each line of `text` starts, split the same way as
/// [`split_lines`]
pub fn line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = vec![0];

    for (i, &b) in bytes.iter().enumerate() {
        let ends_line = match b {
            b'\n' => true,
            b'\r' => bytes.get(i + 1) != Some(&b'\n'),
            _ => false,
        };
        if ends_line {
            starts.push(i + 1);
        }
    }

    starts
}

pub fn join_lines(lines: &[RawLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.content);
        out.push_str(line.eol.as_str());
    }
    out
}
