//! Lightweight PHP source scanner.
//!
//! Just enough lexing to find class declarations and the docblock attached to
//! each one: comments, string literals, heredocs and attributes are skipped so
//! their contents cannot be mistaken for code. `Foo::class`, `$x->class` and
//! `new class` are not declarations.
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    /// Without leading backslash; empty for the global namespace.
    pub namespace: String,
    pub name: String,
    pub is_abstract: bool,
    /// Offset of the first attribute or modifier, else of the `class` keyword.
    pub start: usize,
    /// Byte span of the attached `/** */` block.
    pub doc: Option<Range<usize>>,
}

impl ClassDecl {
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.namespace, &self.name)
    }

    pub fn doc_text<'a>(&self, src: &'a str) -> Option<&'a str> {
        self.doc.clone().map(|range| &src[range])
    }
}

pub fn qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}\\{name}")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCAN
// ————————————————————————————————————————————————————————————————————————————

#[derive(Default)]
struct Modifiers {
    start: Option<usize>,
    is_abstract: bool,
    after_new: bool,
}

pub fn scan(src: &str) -> Vec<ClassDecl> {
    let tokens = Lexer::new(src).collect::<Vec<_>>();
    let text = |token: &Token| &src[token.span.clone()];
    let is_word = |token: Option<&Token>, word: &str| {
        token.is_some_and(|t| t.kind == TokenKind::Word && text(t).eq_ignore_ascii_case(word))
    };

    let mut classes = Vec::new();
    let mut namespace = String::new();
    let mut doc: Option<Range<usize>> = None;
    let mut modifiers = Modifiers::default();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let prev = i.checked_sub(1).map(|p| &tokens[p]);
        let next = tokens.get(i + 1);

        match token.kind {
            TokenKind::DocComment => {
                doc = Some(token.span.clone());
                modifiers = Modifiers::default();
            }
            TokenKind::Attribute => {
                if modifiers.start.is_none() {
                    modifiers.after_new = is_word(prev, "new");
                }
                modifiers.start.get_or_insert(token.span.start);
            }
            TokenKind::Word if prev.is_some_and(|p| matches!(p.kind, TokenKind::DoubleColon | TokenKind::Arrow)) => {
                doc = None;
                modifiers = Modifiers::default();
            }
            TokenKind::Word => {
                let word = text(token).to_ascii_lowercase();
                match word.as_str() {
                    "namespace" if next.is_some_and(|t| t.kind == TokenKind::Word) => {
                        namespace = next.map(|t| text(t).trim_start_matches('\\').to_string()).unwrap_or_default();
                        i += 1;
                        doc = None;
                        modifiers = Modifiers::default();
                    }
                    "namespace" if next.is_some_and(|t| t.kind == TokenKind::Symbol(b'{')) => {
                        namespace.clear();
                        doc = None;
                        modifiers = Modifiers::default();
                    }
                    "abstract" | "final" | "readonly" => {
                        if modifiers.start.is_none() {
                            modifiers.after_new = is_word(prev, "new");
                        }
                        modifiers.start.get_or_insert(token.span.start);
                        modifiers.is_abstract |= word == "abstract";
                    }
                    "class" => {
                        let anonymous = modifiers.after_new || is_word(prev, "new");
                        let name = next.filter(|t| t.kind == TokenKind::Word);
                        if let (false, Some(name)) = (anonymous, name) {
                            classes.push(ClassDecl {
                                namespace: namespace.clone(),
                                name: text(name).to_string(),
                                is_abstract: modifiers.is_abstract,
                                start: modifiers.start.unwrap_or(token.span.start),
                                doc: doc.take(),
                            });
                            i += 1;
                        }
                        doc = None;
                        modifiers = Modifiers::default();
                    }
                    _ => {
                        doc = None;
                        modifiers = Modifiers::default();
                    }
                }
            }
            _ => {
                doc = None;
                modifiers = Modifiers::default();
            }
        }
        i += 1;
    }
    classes
}

// ————————————————————————————————————————————————————————————————————————————
// SPLICE
// ————————————————————————————————————————————————————————————————————————————

/// Put `block` on `decl`: replace its docblock, or insert one above it.
///
/// Continuation lines are re-indented to the declaration's indentation.
pub fn with_doc_block(src: &str, decl: &ClassDecl, block: &str) -> String {
    let anchor = decl.doc.as_ref().map_or(decl.start, |range| range.start);
    let indent = line_indent(src, anchor);
    let block = block.replace('\n', &format!("\n{indent}"));

    let mut out = String::with_capacity(src.len() + block.len() + indent.len() + 1);
    match &decl.doc {
        Some(range) => {
            out.push_str(&src[..range.start]);
            out.push_str(&block);
            out.push_str(&src[range.end..]);
        }
        None => {
            out.push_str(&src[..decl.start]);
            out.push_str(&block);
            out.push('\n');
            out.push_str(indent);
            out.push_str(&src[decl.start..]);
        }
    }
    out
}

/// Whitespace between the start of the line and `offset`, if only whitespace.
fn line_indent(src: &str, offset: usize) -> &str {
    let line_start = src[..offset].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &src[line_start..offset];
    if prefix.bytes().all(|b| b == b' ' || b == b'\t') { prefix } else { "" }
}

// ————————————————————————————————————————————————————————————————————————————
// LEXER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Variable,
    Literal,
    DocComment,
    Attribute,
    DoubleColon,
    Arrow,
    Symbol(u8),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    span: Range<usize>,
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    in_php: bool,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { bytes: src.as_bytes(), pos: 0, in_php: false }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn starts_with(&self, needle: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(needle)
    }

    fn find_bytes(&self, needle: &[u8]) -> Option<usize> {
        self.bytes[self.pos..].windows(needle.len()).position(|w| w == needle)
    }

    /// Move just past the next `needle`, or to the end of input.
    fn skip_past(&mut self, needle: &[u8]) {
        self.pos = match self.find_bytes(needle) {
            Some(i) => self.pos + i + needle.len(),
            None => self.bytes.len(),
        };
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek_at(0) {
            if b == b'\n' || self.starts_with(b"?>") {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_quoted(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek_at(0) {
            match b {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b if b == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn skip_attribute(&mut self) {
        self.pos += 2;
        let mut depth = 1usize;
        while let Some(b) = self.peek_at(0) {
            match b {
                b'[' => {
                    depth += 1;
                    self.pos += 1;
                }
                b']' => {
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                b'\'' | b'"' => self.skip_quoted(b),
                _ => self.pos += 1,
            }
        }
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek_at(0).is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// `<<<LABEL` / `<<<'LABEL'` up to the closing label line.
    fn skip_heredoc(&mut self) {
        self.pos += 3;
        self.skip_while(|b| b == b' ' || b == b'\t');
        if matches!(self.peek_at(0), Some(b'\'' | b'"')) {
            self.pos += 1;
        }
        let label_start = self.pos;
        self.skip_while(is_ident_byte);
        let label = &self.bytes[label_start..self.pos];
        if label.is_empty() {
            return;
        }
        loop {
            match self.find_bytes(b"\n") {
                Some(i) => self.pos += i + 1,
                None => {
                    self.pos = self.bytes.len();
                    return;
                }
            }
            let mut p = self.pos;
            while matches!(self.bytes.get(p), Some(b' ' | b'\t')) {
                p += 1;
            }
            let closes = self.bytes[p..].starts_with(label)
                && !self.bytes.get(p + label.len()).copied().is_some_and(is_ident_byte);
            if closes {
                self.pos = p + label.len();
                return;
            }
        }
    }

    fn enter_php(&mut self) -> bool {
        match self.find_bytes(b"<?") {
            Some(i) => {
                self.pos += i + 2;
                if self.bytes[self.pos..].len() >= 3 && self.bytes[self.pos..self.pos + 3].eq_ignore_ascii_case(b"php") {
                    self.pos += 3;
                } else if self.peek_at(0) == Some(b'=') {
                    self.pos += 1;
                }
                self.in_php = true;
                true
            }
            None => {
                self.pos = self.bytes.len();
                false
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if !self.in_php && !self.enter_php() {
                return None;
            }
            let b = self.peek_at(0)?;
            let start = self.pos;
            let kind = match b {
                b if b.is_ascii_whitespace() => {
                    self.pos += 1;
                    continue;
                }
                b'?' if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    self.in_php = false;
                    continue;
                }
                b'#' if self.peek_at(1) == Some(b'[') => {
                    self.skip_attribute();
                    TokenKind::Attribute
                }
                b'#' => {
                    self.skip_line_comment();
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_line_comment();
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    let is_doc = self.peek_at(2) == Some(b'*') && self.peek_at(3) != Some(b'/');
                    self.pos += 2;
                    self.skip_past(b"*/");
                    if !is_doc {
                        continue;
                    }
                    TokenKind::DocComment
                }
                b'\'' | b'"' | b'`' => {
                    self.skip_quoted(b);
                    TokenKind::Literal
                }
                b'<' if self.starts_with(b"<<<") => {
                    self.skip_heredoc();
                    TokenKind::Literal
                }
                b'$' if self.peek_at(1).is_some_and(is_ident_byte) => {
                    self.pos += 1;
                    self.skip_while(is_ident_byte);
                    TokenKind::Variable
                }
                b':' if self.peek_at(1) == Some(b':') => {
                    self.pos += 2;
                    TokenKind::DoubleColon
                }
                b'-' if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    TokenKind::Arrow
                }
                b'?' if self.starts_with(b"?->") => {
                    self.pos += 3;
                    TokenKind::Arrow
                }
                b if is_ident_byte(b) || b == b'\\' => {
                    self.skip_while(|b| is_ident_byte(b) || b == b'\\');
                    TokenKind::Word
                }
                _ => {
                    self.pos += 1;
                    TokenKind::Symbol(b)
                }
            };
            return Some(Token { kind, span: start..self.pos });
        }
    }
}
