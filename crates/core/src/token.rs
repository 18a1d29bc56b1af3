use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque token kind. The matcher only ever compares symbols for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Closes one file of a submission. Never part of a tile.
    pub const FILE_END: Symbol = Symbol(u32::MAX);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn is_file_end(self) -> bool {
        self == Self::FILE_END
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_file_end() {
            f.write_str("<eof>")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// A frontend's own enumeration of token kinds.
///
/// Each frontend keeps its tagged enum private to its grammar and lowers it into the shared
/// [`Symbol`] space at the matcher boundary.
pub trait TokenKind: Copy {
    fn symbol(self) -> Symbol;
}

impl TokenKind for Symbol {
    fn symbol(self) -> Symbol {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: Symbol,
    pub file: FileId,
    pub line: u32,
    pub column: u32,
    /// Source length in characters, 0 when the frontend does not know it.
    pub length: u32,
}

impl Token {
    pub fn new(kind: impl TokenKind, file: FileId, line: u32, column: u32, length: u32) -> Self {
        Self {
            kind: kind.symbol(),
            file,
            line,
            column,
            length,
        }
    }

    pub fn is_file_end(&self) -> bool {
        self.kind.is_file_end()
    }
}

/// Ordered tokens of exactly one submission, plus the files they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
    tokens: Vec<Token>,
    files: Vec<PathBuf>,
}

impl TokenSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single anonymous file, no file-end marker. Handy for frontends that produce kinds only.
    pub fn from_kinds<K: TokenKind>(kinds: impl IntoIterator<Item = K>) -> Self {
        let mut seq = Self::new();
        let file = seq.add_file(PathBuf::new());
        for (idx, kind) in kinds.into_iter().enumerate() {
            let column = u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1);
            seq.push(Token::new(kind, file, 1, column, 0));
        }
        seq
    }

    pub fn add_file(&mut self, path: PathBuf) -> FileId {
        let id = FileId(u32::try_from(self.files.len()).unwrap_or(u32::MAX));
        self.files.push(path);
        id
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn push_file_end(&mut self, file: FileId, line: u32) {
        self.tokens.push(Token {
            kind: Symbol::FILE_END,
            file,
            line,
            column: 0,
            length: 0,
        });
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn file_path(&self, file: FileId) -> Option<&Path> {
        self.files.get(file.0 as usize).map(PathBuf::as_path)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens that are not file-end markers.
    pub fn significant_len(&self) -> usize {
        self.tokens.iter().filter(|t| !t.is_file_end()).count()
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.tokens.iter().map(|t| t.kind)
    }
}
