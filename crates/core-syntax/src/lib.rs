//! Language definitions and the per-line tokeniser.
//!
//! A [`SyntaxRegistry`] owns every [`Syntax`] definition for the lifetime of
//! the editor; buffers refer to definitions only through a stable
//! [`SyntaxId`]. Tokenisation is line-at-a-time: the single piece of state
//! carried between lines is whether the previous line ended inside an
//! unterminated multi-line comment, and the caller (the highlight cache in
//! `core-text`) is responsible for threading that flag forward.

use tracing::debug;

/// Identifier words longer than this are still consumed by the scanner but
/// never matched against keyword rules.
const MAX_KEYWORD_LEN: usize = 256;

/// Highlight classification attached to a segment. The renderer maps each
/// kind to a colour; `Normal` text carries no segment at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Normal,
    Keyword,
    Type,
    String,
    Number,
    Comment,
    Operator,
    Function,
    Variable,
    Constant,
    Preprocessor,
}

/// Discriminates how a rule's `pattern` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Exact match against a scanned identifier word.
    Keyword,
    /// Reserved for script-registered pattern rules; the tokeniser does not
    /// consult these yet but the script API accepts and stores them.
    Pattern,
    MultilineStart,
    MultilineEnd,
}

/// A single syntax rule. Only `RuleKind::Keyword` participates in
/// tokenisation; comment markers live on the [`Syntax`] itself.
#[derive(Debug, Clone)]
pub struct SyntaxRule {
    pub kind: RuleKind,
    pub pattern: String,
    pub highlight: HighlightKind,
}

/// A language definition: name, file suffixes, rules, comment markers.
#[derive(Debug, Default, Clone)]
pub struct Syntax {
    pub name: String,
    extensions: Vec<String>,
    rules: Vec<SyntaxRule>,
    pub singleline_comment: Option<String>,
    pub multiline_start: Option<String>,
    pub multiline_end: Option<String>,
}

impl Syntax {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a file-name suffix such as `".c"`. Suffixes are compared
    /// against everything from the final `.` of a file name, inclusive.
    pub fn add_extension(&mut self, ext: impl Into<String>) {
        self.extensions.push(ext.into());
    }

    pub fn add_rule(&mut self, kind: RuleKind, pattern: impl Into<String>, highlight: HighlightKind) {
        self.rules.push(SyntaxRule {
            kind,
            pattern: pattern.into(),
            highlight,
        });
    }

    pub fn add_keyword(&mut self, word: impl Into<String>, highlight: HighlightKind) {
        self.add_rule(RuleKind::Keyword, word, highlight);
    }

    pub fn set_comments(
        &mut self,
        single: Option<&str>,
        multi_start: Option<&str>,
        multi_end: Option<&str>,
    ) {
        if let Some(s) = single {
            self.singleline_comment = Some(s.to_string());
        }
        if let Some(s) = multi_start {
            self.multiline_start = Some(s.to_string());
        }
        if let Some(s) = multi_end {
            self.multiline_end = Some(s.to_string());
        }
    }

    pub fn matches_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    fn keyword_highlight(&self, word: &[u8]) -> Option<HighlightKind> {
        self.rules
            .iter()
            .find(|r| r.kind == RuleKind::Keyword && r.pattern.as_bytes() == word)
            .map(|r| r.highlight)
    }
}

/// Stable handle to a registered syntax definition. Ids are never reused
/// within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxId(usize);

impl SyntaxId {
    /// Raw index for interop surfaces (the script bridge hands ids to Lua
    /// as integers).
    pub fn to_raw(self) -> usize {
        self.0
    }

    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }
}

/// Owns every syntax definition. Buffers hold a `SyntaxId`; the registry
/// must therefore outlive all buffers, which the editor guarantees by
/// keeping it alongside the buffer list.
#[derive(Debug, Default)]
pub struct SyntaxRegistry {
    defs: Vec<Syntax>,
}

impl SyntaxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-seeded with the built-in C-like definition so the editor
    /// highlights something useful before any init script runs.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        let id = reg.register("c");
        let syn = reg.get_mut(id).expect("freshly registered id");
        for ext in [".c", ".h"] {
            syn.add_extension(ext);
        }
        for kw in [
            "if", "else", "for", "while", "do", "switch", "case", "default", "break", "continue",
            "return", "goto", "sizeof", "typedef", "struct", "union", "enum", "static", "extern",
            "const",
        ] {
            syn.add_keyword(kw, HighlightKind::Keyword);
        }
        for ty in [
            "int", "char", "void", "long", "short", "float", "double", "unsigned", "signed",
            "bool", "size_t",
        ] {
            syn.add_keyword(ty, HighlightKind::Type);
        }
        for c in ["NULL", "true", "false"] {
            syn.add_keyword(c, HighlightKind::Constant);
        }
        syn.set_comments(Some("//"), Some("/*"), Some("*/"));
        reg
    }

    pub fn register(&mut self, name: impl Into<String>) -> SyntaxId {
        let name = name.into();
        debug!(target: "syntax.registry", name = %name, "register");
        self.defs.push(Syntax::new(name));
        SyntaxId(self.defs.len() - 1)
    }

    pub fn get(&self, id: SyntaxId) -> Option<&Syntax> {
        self.defs.get(id.0)
    }

    pub fn get_mut(&mut self, id: SyntaxId) -> Option<&mut Syntax> {
        self.defs.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// First definition whose suffix set contains the file's extension
    /// (everything from the final `.`, inclusive). Files without a dot never
    /// match.
    pub fn find_by_filename(&self, filename: &str) -> Option<SyntaxId> {
        let dot = filename.rfind('.')?;
        let ext = &filename[dot..];
        self.defs
            .iter()
            .position(|s| s.matches_extension(ext))
            .map(SyntaxId)
    }
}

/// One highlighted span of a line, `[start, end)` in byte columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub kind: HighlightKind,
}

/// Tokenisation result for one line. Segments are sorted by start column and
/// never overlap; uncovered columns render in the default colour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightedLine {
    pub segments: Vec<Segment>,
    pub ends_in_multiline: bool,
}

impl HighlightedLine {
    fn push(&mut self, start: usize, end: usize, kind: HighlightKind) {
        if end > start {
            self.segments.push(Segment { start, end, kind });
        }
    }

    /// Segment covering the given byte column, if any.
    pub fn kind_at(&self, col: usize) -> Option<HighlightKind> {
        self.segments
            .iter()
            .find(|s| s.start <= col && col < s.end)
            .map(|s| s.kind)
    }
}

fn find_sub(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Tokenise one line. `prev_multiline` is the multi-line state of the
/// previous row; the returned `ends_in_multiline` feeds the next row.
///
/// Priority at each scan position: carried multi-line comment, single-line
/// comment, multi-line open, string literal, numeric literal, identifier
/// word (highlighted only when it matches a keyword rule exactly). Anything
/// else is skipped and renders in the default colour.
pub fn highlight_line(syn: &Syntax, line: &[u8], prev_multiline: bool) -> HighlightedLine {
    let mut hl = HighlightedLine {
        segments: Vec::new(),
        ends_in_multiline: prev_multiline,
    };
    let len = line.len();
    let mut i = 0usize;

    // Resume a multi-line comment carried over from the previous row.
    if prev_multiline {
        if let Some(end_marker) = syn.multiline_end.as_deref() {
            match find_sub(line, end_marker.as_bytes(), 0) {
                Some(pos) => {
                    let end_pos = pos + end_marker.len();
                    hl.push(0, end_pos, HighlightKind::Comment);
                    i = end_pos;
                    hl.ends_in_multiline = false;
                }
                None => {
                    hl.push(0, len, HighlightKind::Comment);
                    return hl;
                }
            }
        }
    }

    while i < len {
        let b = line[i];

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if let Some(marker) = syn.singleline_comment.as_deref() {
            if line[i..].starts_with(marker.as_bytes()) {
                hl.push(i, len, HighlightKind::Comment);
                break;
            }
        }

        if let (Some(start_marker), Some(end_marker)) =
            (syn.multiline_start.as_deref(), syn.multiline_end.as_deref())
        {
            if line[i..].starts_with(start_marker.as_bytes()) {
                match find_sub(line, end_marker.as_bytes(), i + start_marker.len()) {
                    Some(pos) => {
                        let end_pos = pos + end_marker.len();
                        hl.push(i, end_pos, HighlightKind::Comment);
                        i = end_pos;
                    }
                    None => {
                        hl.push(i, len, HighlightKind::Comment);
                        hl.ends_in_multiline = true;
                        break;
                    }
                }
                continue;
            }
        }

        if b == b'"' || b == b'\'' {
            let quote = b;
            let start = i;
            i += 1;
            while i < len && line[i] != quote {
                if line[i] == b'\\' && i + 1 < len {
                    i += 1;
                }
                i += 1;
            }
            if i < len {
                i += 1; // closing quote
            }
            hl.push(start, i, HighlightKind::String);
            continue;
        }

        if b.is_ascii_digit() {
            let start = i;
            while i < len
                && (line[i].is_ascii_digit()
                    || line[i] == b'.'
                    || line[i] == b'x'
                    || line[i] == b'X'
                    || line[i].is_ascii_hexdigit())
            {
                i += 1;
            }
            hl.push(start, i, HighlightKind::Number);
            continue;
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < len && (line[i].is_ascii_alphanumeric() || line[i] == b'_') {
                i += 1;
            }
            let word = &line[start..i];
            if word.len() < MAX_KEYWORD_LEN {
                if let Some(kind) = syn.keyword_highlight(word) {
                    hl.push(start, i, kind);
                }
            }
            continue;
        }

        i += 1;
    }

    hl
}
