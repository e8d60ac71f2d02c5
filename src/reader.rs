use std::ops::Range;
use log::trace;
use crate::error::{Error, Result};

pub const DEFAULT_OPEN_DELIMITER: &str = "{{";
pub const DEFAULT_CLOSE_DELIMITER: &str = "}}";


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Literal,
    Variable,
    VariableUnescaped,
    Section,
    InvertedSection,
    EndSection,
    Partial,
    Comment,
    SetDelimiter,
}

impl TokenKind {
    fn from_sigil(sigil: char) -> Option<TokenKind> {
        match sigil {
            '!' => Some(TokenKind::Comment),
            '#' => Some(TokenKind::Section),
            '^' => Some(TokenKind::InvertedSection),
            '/' => Some(TokenKind::EndSection),
            '>' => Some(TokenKind::Partial),
            '=' => Some(TokenKind::SetDelimiter),
            '{' | '&' => Some(TokenKind::VariableUnescaped),
            _ => None
        }
    }

    /// Whether a tag of this kind alone on its line takes the line with it.
    pub fn can_stand_alone(self) -> bool {
        matches!(
            self,
            TokenKind::Section
                | TokenKind::InvertedSection
                | TokenKind::EndSection
                | TokenKind::Partial
                | TokenKind::Comment
                | TokenKind::SetDelimiter
        )
    }
}


/// One element of the token stream.
///
/// `text` is the literal text, the trimmed tag name, or for
/// [`TokenKind::SetDelimiter`] the two new delimiters separated by
/// whitespace. `indent` is the whitespace preceding a standalone partial.
/// `span` is the source range consumed by the token; for a standalone tag
/// it covers the whole elided line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub indent: &'a str,
    pub span: Range<usize>,
}


/// Splits `input` into tokens, starting with the `{{ }}` delimiters.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    tokenize_with(input, DEFAULT_OPEN_DELIMITER, DEFAULT_CLOSE_DELIMITER)
}

/// Splits `input` into tokens, starting with the given delimiters.
pub fn tokenize_with<'a>(
    input: &'a str, open_delimiter: &'a str, close_delimiter: &'a str
) -> Result<Vec<Token<'a>>> {
    if !is_delimiter(open_delimiter) || !is_delimiter(close_delimiter) {
        return Err(Error::Delimiter(format!("{} {}", open_delimiter, close_delimiter)));
    }
    let mut reader = Reader::new(input, open_delimiter, close_delimiter);
    let pieces = reader.scan()?;
    let tokens = trim_standalone(input, pieces);
    trace!("{} tokens read from {} bytes", tokens.len(), input.len());
    Ok(tokens)
}


// Text pieces never span more than one line.
#[derive(Debug)]
enum Piece<'a> {
    Text(Range<usize>),
    Tag(TokenKind, &'a str, Range<usize>),
}

impl<'a> Piece<'a> {
    fn span(&self) -> &Range<usize> {
        match self {
            Piece::Text(span) => span,
            Piece::Tag(_, _, span) => span
        }
    }

    fn into_token(self, input: &'a str) -> Token<'a> {
        match self {
            Piece::Text(span) => Token {
                kind: TokenKind::Literal,
                text: &input[span.clone()],
                indent: "",
                span
            },
            Piece::Tag(kind, text, span) => Token { kind, text, indent: "", span }
        }
    }
}


pub(crate) struct Reader<'a> {
    input: &'a str,
    open_delimiter: &'a str,
    close_delimiter: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(input: &'a str, open_delimiter: &'a str, close_delimiter: &'a str) -> Self {
        Reader {
            input,
            open_delimiter,
            close_delimiter,
            pos: 0,
        }
    }

    fn scan(&mut self) -> Result<Vec<Piece<'a>>> {
        let mut pieces = Vec::new();
        while self.pos < self.input.len() {
            match self.input[self.pos..].find(self.open_delimiter) {
                Some(0) => pieces.push(self.read_tag()?),
                Some(p) => self.read_text(self.pos + p, &mut pieces),
                None => self.read_text(self.input.len(), &mut pieces)
            }
        }
        Ok(pieces)
    }

    fn read_text(&mut self, end: usize, pieces: &mut Vec<Piece<'a>>) {
        while self.pos < end {
            let after_line = match self.input[self.pos..end].find('\n') {
                Some(p) => self.pos + p + 1,
                None => end
            };
            pieces.push(Piece::Text(self.pos..after_line));
            self.pos = after_line;
        }
    }

    fn read_tag(&mut self) -> Result<Piece<'a>> {
        let input = self.input;
        let start = self.pos;
        let after_open = start + self.open_delimiter.len();
        let inner = &input[after_open..];
        let leading = inner.len() - inner.trim_start().len();
        let sigil = match inner.trim_start().chars().next() {
            Some(c) => c,
            None => return Err(Error::UnclosedTag(start))
        };
        let (kind, after_sigil) = match TokenKind::from_sigil(sigil) {
            Some(kind) => (kind, after_open + leading + sigil.len_utf8()),
            None => (TokenKind::Variable, after_open)
        };
        let close = match sigil {
            '{' => format!("}}{}", self.close_delimiter),
            '=' => format!("={}", self.close_delimiter),
            _ => self.close_delimiter.to_owned()
        };
        let before_close = match input[after_sigil..].find(&close) {
            Some(p) => after_sigil + p,
            None => return Err(Error::UnclosedTag(start))
        };
        let content = input[after_sigil..before_close].trim();
        self.pos = before_close + close.len();

        let text = match kind {
            TokenKind::Comment => "",
            TokenKind::SetDelimiter => {
                let (open_delimiter, close_delimiter) = parse_delimiters(content)?;
                self.open_delimiter = open_delimiter;
                self.close_delimiter = close_delimiter;
                content
            },
            _ => content
        };
        Ok(Piece::Tag(kind, text, start..self.pos))
    }
}


/// Applies the standalone rule line by line: a line holding exactly one
/// tag that can stand alone, and otherwise only whitespace, is dropped
/// except for the tag itself.
fn trim_standalone<'a>(input: &'a str, pieces: Vec<Piece<'a>>) -> Vec<Token<'a>> {
    let mut tokens = Vec::with_capacity(pieces.len());
    let mut line = Vec::new();
    for piece in pieces {
        let ends_line = matches!(&piece, Piece::Text(span) if input[span.clone()].ends_with('\n'));
        line.push(piece);
        if ends_line {
            flush_line(input, &mut line, &mut tokens);
        }
    }
    flush_line(input, &mut line, &mut tokens);
    tokens
}

fn flush_line<'a>(input: &'a str, line: &mut Vec<Piece<'a>>, tokens: &mut Vec<Token<'a>>) {
    let (line_start, line_end) = match (line.first(), line.last()) {
        (Some(first), Some(last)) => (first.span().start, last.span().end),
        _ => return
    };
    if is_standalone(input, line) {
        for piece in line.drain(..) {
            if let Piece::Tag(kind, text, span) = piece {
                let indent = match kind {
                    TokenKind::Partial => &input[line_start..span.start],
                    _ => ""
                };
                tokens.push(Token { kind, text, indent, span: line_start..line_end });
            }
        }
    } else {
        tokens.extend(line.drain(..).map(|piece| piece.into_token(input)));
    }
}

fn is_standalone(input: &str, line: &[Piece<'_>]) -> bool {
    let mut tags = line.iter().filter_map(|piece| match piece {
        Piece::Tag(kind, _, _) => Some(*kind),
        Piece::Text(_) => None
    });
    match (tags.next(), tags.next()) {
        (Some(kind), None) if kind.can_stand_alone() => line.iter().all(|piece| match piece {
            Piece::Text(span) => input[span.clone()].trim().is_empty(),
            Piece::Tag(..) => true
        }),
        _ => false
    }
}


/// Reads the content of a set-delimiter tag.
pub(crate) fn parse_delimiters(content: &str) -> Result<(&str, &str)> {
    let words = content.split_whitespace().collect::<Vec<_>>();
    match words.as_slice() {
        [open, close] if is_delimiter(open) && is_delimiter(close) => Ok((*open, *close)),
        _ => Err(Error::Delimiter(content.to_owned()))
    }
}

// A delimiter made only of name characters could not be told apart from
// the tag names it encloses.
fn is_delimiter(word: &str) -> bool {
    !word.is_empty()
        && !word.contains('=')
        && !word.chars().any(char::is_whitespace)
        && !word.chars().all(char::is_alphanumeric)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only() {
        expect_sequence(
            " 123456 ",
            vec![
                (TokenKind::Literal, " 123456 ")
            ]
        );
    }

    #[test]
    fn text_is_split_at_newlines() {
        expect_sequence(
            "a\nb\n\nc",
            vec![
                (TokenKind::Literal, "a\n"),
                (TokenKind::Literal, "b\n"),
                (TokenKind::Literal, "\n"),
                (TokenKind::Literal, "c")
            ]
        );
    }

    #[test]
    fn standalone_single_is_trimmed() {
        let tokens = tokenize("x\n   {{/a}}  \ny").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token { kind: TokenKind::Literal, text: "x\n", indent: "", span: 0..2 },
                Token { kind: TokenKind::EndSection, text: "a", indent: "", span: 2..14 },
                Token { kind: TokenKind::Literal, text: "y", indent: "", span: 14..15 }
            ]
        );
    }

    #[test]
    fn two_tags_on_a_line_are_not_standalone() {
        expect_sequence(
            "x\n {{#a}}{{/a}} \ny",
            vec![
                (TokenKind::Literal, "x\n"),
                (TokenKind::Literal, " "),
                (TokenKind::Section, "a"),
                (TokenKind::EndSection, "a"),
                (TokenKind::Literal, " \n"),
                (TokenKind::Literal, "y")
            ]
        );
    }

    #[test]
    fn variable_is_never_standalone() {
        expect_sequence(
            "  {{v}}\n",
            vec![
                (TokenKind::Literal, "  "),
                (TokenKind::Variable, "v"),
                (TokenKind::Literal, "\n")
            ]
        );
    }

    #[test]
    fn standalone_without_newline() {
        expect_sequence(
            "#{{#b}}\n/\n  {{/b}}",
            vec![
                (TokenKind::Literal, "#"),
                (TokenKind::Section, "b"),
                (TokenKind::Literal, "\n"),
                (TokenKind::Literal, "/\n"),
                (TokenKind::EndSection, "b")
            ]
        );
    }

    #[test]
    fn standalone_with_crlf() {
        expect_sequence(
            "|\r\n{{#b}}\r\n{{/b}}\r\n|",
            vec![
                (TokenKind::Literal, "|\r\n"),
                (TokenKind::Section, "b"),
                (TokenKind::EndSection, "b"),
                (TokenKind::Literal, "|")
            ]
        );
    }

    #[test]
    fn multiline_comment_is_standalone() {
        expect_sequence(
            "a\n{{!\nb\n}}\nc",
            vec![
                (TokenKind::Literal, "a\n"),
                (TokenKind::Comment, ""),
                (TokenKind::Literal, "c")
            ]
        );
    }

    #[test]
    fn update_delimiters() {
        expect_sequence(
            "{{=| |=}}|x|{{y}}",
            vec![
                (TokenKind::SetDelimiter, "| |"),
                (TokenKind::Variable, "x"),
                (TokenKind::Literal, "{{y}}")
            ]
        );
    }

    #[test]
    fn delimiters_are_trimmed() {
        expect_sequence(
            "{{= +++   --- =}}",
            vec![
                (TokenKind::SetDelimiter, "+++   ---")
            ]
        );
    }

    #[test]
    fn missing_delimiters_close() {
        assert_eq!(tokenize("{{= +++   --- }}"), Err(Error::UnclosedTag(0)));
    }

    #[test]
    fn invalid_delimiters() {
        assert!(matches!(tokenize("{{= a a =}}"), Err(Error::Delimiter(_))));
        assert!(matches!(tokenize("{{= <% %> %> =}}"), Err(Error::Delimiter(_))));
        assert!(matches!(tokenize("{{= |=   | =}}"), Err(Error::Delimiter(_))));
        assert!(matches!(tokenize("{{= =}}"), Err(Error::Delimiter(_))));
    }

    #[test]
    fn invalid_initial_delimiters() {
        assert!(matches!(tokenize_with("x", "", "}}"), Err(Error::Delimiter(_))));
    }

    #[test]
    fn unclosed_tag() {
        assert_eq!(tokenize("abc {{ name"), Err(Error::UnclosedTag(4)));
        assert_eq!(tokenize("{{"), Err(Error::UnclosedTag(0)));
        assert_eq!(tokenize("{{{x}}"), Err(Error::UnclosedTag(0)));
    }

    #[test]
    fn value_with_escape() {
        expect_sequence(
            "{{ v }}",
            vec![
                (TokenKind::Variable, "v")
            ]
        );
    }

    #[test]
    fn value_without_escape() {
        expect_sequence(
            "{{{ v }}}{{& w }}",
            vec![
                (TokenKind::VariableUnescaped, "v"),
                (TokenKind::VariableUnescaped, "w")
            ]
        );
    }

    #[test]
    fn sigil_after_whitespace() {
        expect_sequence(
            "{{ # a }}{{ / a }}",
            vec![
                (TokenKind::Section, "a"),
                (TokenKind::EndSection, "a")
            ]
        );
    }

    #[test]
    fn standalone_partial_keeps_indent() {
        let tokens = tokenize("\t{{>count}}").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Partial);
        assert_eq!(tokens[0].text, "count");
        assert_eq!(tokens[0].indent, "\t");
    }

    #[test]
    fn inline_partial_has_no_indent() {
        let tokens = tokenize("x {{>p}}\n").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Partial);
        assert_eq!(tokens[1].indent, "");
        assert_eq!(tokens[2].text, "\n");
    }

    #[test]
    fn inner_section() {
        expect_sequence(
            "{{#a}}\n{{#b}}\n{{#c}}\n\n",
            vec![
                (TokenKind::Section, "a"),
                (TokenKind::Section, "b"),
                (TokenKind::Section, "c"),
                (TokenKind::Literal, "\n")
            ]
        );
    }

    #[test]
    fn repeated_newline() {
        expect_sequence(
            "{{#a}} \n \n {{#b}}",
            vec![
                (TokenKind::Section, "a"),
                (TokenKind::Literal, " \n"),
                (TokenKind::Section, "b")
            ]
        );
    }


    fn expect_sequence(input: &str, expected: Vec<(TokenKind, &str)>) {
        let tokens = tokenize(input).unwrap();
        let received = tokens.iter()
            .map(|token| (token.kind, token.text))
            .collect::<Vec<_>>();
        assert_eq!(received, expected);
    }
}
