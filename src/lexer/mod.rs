use logos::Logos;

/// Word-level tokens of a single G-code line
/// Only the pieces the fan pass cares about get their own kind

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    #[regex(r"[ \t\x0B\x0C\r]+")]
    Space,

    // S-50, s12.5
    #[regex(r"[sS]-?[0-9]+(\.[0-9]+)?", priority = 10)]
    Speed,

    // T0, t12
    #[regex(r"[tT][0-9]+", priority = 10)]
    Tool,

    // Everything from the first semicolon on
    #[regex(r";.*")]
    Comment,

    // Any other run: M106, G1, X10.5, S50X
    #[regex(r"[^ \t\x0B\x0C\r;]+")]
    Word,
}

pub const TOOL_SELECT: &str = "M108";
pub const FAN_SPEED: &str = "M106";

/// Lex one line of content (without its terminator)
pub fn lex(input: &str) -> Vec<(Token, logos::Span)> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| match result {
            Ok(token) => Some((token, span)),
            Err(_) => None, // the token set covers every input
        })
        .collect()
}

/// Match a tool-select line (`M108 T<n>`) and return the tool digits.
///
/// This is a prefix match: leading blanks are allowed and whatever follows
/// the digits is ignored, as long as the digits are not glued to a letter,
/// digit or underscore (`M108 T1(next)` selects tool 1, `M108 T1A` nothing).
pub fn parse_tool_select(content: &str) -> Option<&str> {
    let rest = content.trim_start();
    let keyword = rest.get(..TOOL_SELECT.len())?;
    if !keyword.eq_ignore_ascii_case(TOOL_SELECT) {
        return None;
    }

    let after_keyword = &rest[TOOL_SELECT.len()..];
    let rest = after_keyword.trim_start();
    if rest.len() == after_keyword.len() {
        return None;
    }

    let rest = rest.strip_prefix(|c: char| c == 'T' || c == 't')?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    match rest[end..].chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(&rest[..end]),
    }
}

/// Case-insensitive `M106` prefix check on the trimmed content
pub fn is_fan_command(content: &str) -> bool {
    content
        .trim_start()
        .get(..FAN_SPEED.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(FAN_SPEED))
}

/// A fan-speed line split into the parts the rewriter edits
#[derive(Debug, Clone, PartialEq)]
pub struct FanCommand<'a> {
    /// Content before the first `;`
    pub code: &'a str,
    /// The `;` and everything after it
    pub comment: Option<&'a str>,
    /// Numeric text of the first speed parameter, without the `S`
    pub speed: Option<&'a str>,
    /// Byte range of the speed parameter within `code`
    pub speed_span: Option<logos::Span>,
    tokens: Vec<(Token, logos::Span)>,
}

impl<'a> FanCommand<'a> {
    pub fn parse(content: &'a str) -> Self {
        let (code, comment) = match content.find(';') {
            Some(pos) => (&content[..pos], Some(&content[pos..])),
            None => (content, None),
        };

        let tokens = lex(code);
        let speed_span = tokens
            .iter()
            .find(|(token, _)| *token == Token::Speed)
            .map(|(_, span)| span.clone());
        let speed = speed_span
            .as_ref()
            .map(|span| &code[span.start + 1..span.end]);

        Self {
            code,
            comment,
            speed,
            speed_span,
            tokens,
        }
    }

    /// Tool parameters currently on the line, as digit text
    pub fn tools(&self) -> Vec<&'a str> {
        self.tokens
            .iter()
            .filter(|(token, _)| *token == Token::Tool)
            .map(|(_, span)| &self.code[span.start + 1..span.end])
            .collect()
    }

    /// Code with every tool parameter removed, along with the blanks
    /// directly in front of it
    pub fn code_without_tools(&self) -> String {
        let mut pieces: Vec<(Token, &str)> = Vec::with_capacity(self.tokens.len());

        for (token, span) in &self.tokens {
            if *token == Token::Tool {
                if matches!(pieces.last(), Some((Token::Space, _))) {
                    pieces.pop();
                }
                continue;
            }
            pieces.push((*token, &self.code[span.clone()]));
        }

        pieces.into_iter().map(|(_, text)| text).collect()
    }

    /// Rebuild the line tagged with `tool`. Any old tool parameter is dropped,
    /// the comment is kept byte for byte.
    pub fn with_tool(&self, tool: &str) -> String {
        let code = self.code_without_tools();
        let mut line = format!("{} T{}", code.trim_end(), tool);

        if let Some(comment) = self.comment {
            if !line.ends_with(char::is_whitespace) {
                line.push(' ');
            }
            line.push_str(comment);
        }

        line
    }
}
