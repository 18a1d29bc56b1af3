use crate::frontend::{Frontend, SourceFile, TokenizeOutcome};
use crate::token::{FileId, Symbol, Token, TokenKind, TokenSequence};

const KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "break", "continue", "return", "try",
    "catch", "finally", "throw", "fn", "function", "class", "struct", "enum", "impl", "trait",
    "const", "let", "var", "static", "public", "private", "protected", "async", "await", "new",
    "default", "goto", "union", "typedef", "namespace", "template", "interface",
];

/// Token kinds of the built-in brace-language frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CStyleKind {
    Identifier,
    Number,
    StringLiteral,
    Keyword(u8),
    Punct(u8),
}

impl TokenKind for CStyleKind {
    fn symbol(self) -> Symbol {
        const TOK_PUNCT_BASE: u32 = 10_000;
        match self {
            Self::Identifier => Symbol::new(1),
            Self::Number => Symbol::new(2),
            Self::StringLiteral => Symbol::new(3),
            Self::Keyword(idx) => Symbol::new(100 + u32::from(idx)),
            Self::Punct(b) => Symbol::new(TOK_PUNCT_BASE + u32::from(b)),
        }
    }
}

fn keyword_kind(ident: &str) -> Option<CStyleKind> {
    KEYWORDS
        .iter()
        .position(|&kw| kw == ident)
        .and_then(|idx| u8::try_from(idx).ok())
        .map(CStyleKind::Keyword)
}

/// Lexical frontend for brace-structured languages (C, Java, JavaScript, Rust and friends).
///
/// Identifiers collapse to one kind, so renaming variables does not hide structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct CStyleFrontend;

impl Frontend for CStyleFrontend {
    fn name(&self) -> &str {
        "C-style lexical frontend"
    }

    fn short_name(&self) -> &str {
        "c-style"
    }

    fn suffixes(&self) -> &[&str] {
        &[
            ".c", ".h", ".cc", ".cpp", ".hpp", ".java", ".js", ".ts", ".cs", ".go", ".rs",
            ".kt", ".swift",
        ]
    }

    fn minimum_token_match(&self) -> usize {
        12
    }

    fn tokenize(&self, files: &[SourceFile]) -> TokenizeOutcome {
        let mut tokens = TokenSequence::new();
        let mut has_errors = false;
        for source in files {
            let file = tokens.add_file(source.path.clone());
            let last_line = tokenize_file(&source.text, file, &mut tokens, &mut has_errors);
            tokens.push_file_end(file, last_line);
        }
        TokenizeOutcome { tokens, has_errors }
    }

    fn supports_columns(&self) -> bool {
        true
    }

    fn is_preformatted(&self) -> bool {
        true
    }
}

/// Appends the tokens of one file and returns its last line number.
fn tokenize_file(
    text: &str,
    file: FileId,
    out: &mut TokenSequence,
    has_errors: &mut bool,
) -> u32 {
    let bytes = text.as_bytes();
    let mut i = 0usize;
    let mut line: u32 = 1;
    let mut line_start = 0usize;
    let mut at_line_start = true;

    let column_of = |pos: usize, line_start: usize| -> u32 {
        u32::try_from(pos - line_start + 1).unwrap_or(u32::MAX)
    };
    let length_of = |start: usize, end: usize| -> u32 { u32::try_from(end - start).unwrap_or(0) };

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\n' {
            line = line.saturating_add(1);
            i += 1;
            line_start = i;
            at_line_start = true;
            continue;
        }
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let was_at_line_start = at_line_start;
        at_line_start = false;

        if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            i += 2;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            let mut closed = false;
            while i < bytes.len() {
                if bytes[i] == b'\n' {
                    line = line.saturating_add(1);
                    line_start = i + 1;
                    at_line_start = true;
                }
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    i += 2;
                    closed = true;
                    break;
                }
                i += 1;
            }
            if !closed {
                *has_errors = true;
            }
            continue;
        }
        if b == b'#' && was_at_line_start {
            i += 1;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if b == b'\'' {
            let start = i;
            let column = column_of(i, line_start);
            // Lifetimes and loop labels have no closing quote on the same line.
            match char_literal_end(bytes, i) {
                Some(end) => {
                    out.push(Token::new(
                        CStyleKind::StringLiteral,
                        file,
                        line,
                        column,
                        length_of(start, end),
                    ));
                    i = end;
                }
                None => {
                    out.push(Token::new(CStyleKind::Punct(b), file, line, column, 1));
                    i += 1;
                }
            }
            continue;
        }

        if b == b'"' {
            let start = i;
            let start_line = line;
            let start_column = column_of(i, line_start);
            let mut closed = false;
            i += 1;
            while i < bytes.len() {
                let c = bytes[i];
                if c == b'\\' && i + 1 < bytes.len() {
                    if bytes[i + 1] == b'\n' {
                        line = line.saturating_add(1);
                        line_start = i + 2;
                    }
                    i += 2;
                    continue;
                }
                if c == b'\n' {
                    line = line.saturating_add(1);
                    line_start = i + 1;
                }
                if c == b'"' {
                    i += 1;
                    closed = true;
                    break;
                }
                i += 1;
            }
            if !closed {
                *has_errors = true;
            }
            out.push(Token::new(
                CStyleKind::StringLiteral,
                file,
                start_line,
                start_column,
                length_of(start, i),
            ));
            continue;
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            i += 1;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let kind = keyword_kind(&text[start..i]).unwrap_or(CStyleKind::Identifier);
            out.push(Token::new(
                kind,
                file,
                line,
                column_of(start, line_start),
                length_of(start, i),
            ));
            continue;
        }

        if b.is_ascii_digit() {
            let start = i;
            i += 1;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                i += 1;
            }
            out.push(Token::new(
                CStyleKind::Number,
                file,
                line,
                column_of(start, line_start),
                length_of(start, i),
            ));
            continue;
        }

        if b.is_ascii() {
            out.push(Token::new(
                CStyleKind::Punct(b),
                file,
                line,
                column_of(i, line_start),
                1,
            ));
        }
        // Skip the remaining bytes of a non-ASCII character as one unit.
        i += 1;
        while i < bytes.len() && (bytes[i] & 0b1100_0000) == 0b1000_0000 {
            i += 1;
        }
    }

    line
}

/// End of a character literal opening at `start`, such as `'x'`, `'\n'` or `'\u{1F600}'`.
fn char_literal_end(bytes: &[u8], start: usize) -> Option<usize> {
    const MAX_LITERAL: usize = 12;
    let mut j = start + 1;
    match *bytes.get(j)? {
        b'\'' | b'\n' => return None,
        b'\\' => {
            j += 2;
            while j < bytes.len() && j - start < MAX_LITERAL {
                match bytes[j] {
                    b'\'' => return Some(j + 1),
                    b'\n' => return None,
                    _ => j += 1,
                }
            }
            None
        }
        _ => {
            j += 1;
            while j < bytes.len() && (bytes[j] & 0b1100_0000) == 0b1000_0000 {
                j += 1;
            }
            (bytes.get(j) == Some(&b'\'')).then_some(j + 1)
        }
    }
}
