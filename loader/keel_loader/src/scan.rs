//! Dependency scanning of factory source text.
//!
//! Best-effort and purely lexical: finds `require("id")` / `require('id')`
//! calls whose argument is a single string literal. Comments and other
//! string literals are skipped so their contents never count. Member calls
//! (`obj.require(...)`, `$require(...)`) and `require.async(...)` are not
//! static dependencies and are ignored.

/// Dependency identifiers named by `require` calls in `source`, deduplicated,
/// in first-appearance order.
pub fn scan_dependencies(source: &str) -> Vec<String> {
    let mut scanner = Scanner {
        src: source.as_bytes(),
        pos: 0,
    };
    let mut deps: Vec<String> = Vec::new();

    while let Some(byte) = scanner.peek() {
        match byte {
            b'/' if scanner.peek_at(1) == Some(b'/') => scanner.skip_line_comment(),
            b'/' if scanner.peek_at(1) == Some(b'*') => scanner.skip_block_comment(),
            b'"' | b'\'' | b'`' => scanner.skip_string(byte),
            b if is_ident_start(b) => {
                let start = scanner.pos;
                let word = scanner.ident();
                let preceded_by_member = start > 0 && matches!(source.as_bytes()[start - 1], b'.' | b'$');
                if word == "require" && !preceded_by_member {
                    if let Some(dep) = scanner.call_argument() {
                        if !deps.iter().any(|seen| seen == dep) {
                            deps.push(dep.to_owned());
                        }
                    }
                }
            }
            _ => scanner.pos += 1,
        }
    }

    deps
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.src.len() {
            if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b if b == quote => return,
                _ => {}
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        // Identifier bytes are ASCII, so this slice is valid UTF-8.
        std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("")
    }

    /// Parse `( "literal" )` right after `require`.
    ///
    /// On success the scanner moves past the closing parenthesis. On failure
    /// it stays just after `require`.
    fn call_argument(&mut self) -> Option<&'a str> {
        let resume = self.pos;
        let parsed = self.try_call_argument();
        if parsed.is_none() {
            self.pos = resume;
        }
        parsed
    }

    fn try_call_argument(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        if self.peek()? != b'(' {
            return None;
        }
        self.pos += 1;
        self.skip_whitespace();

        let quote = self.peek()?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == quote || b == b')' || b.is_ascii_whitespace() || b == b'\\' {
                break;
            }
            self.pos += 1;
        }
        let end = self.pos;
        if end == start || self.peek()? != quote {
            return None;
        }
        self.pos += 1;
        self.skip_whitespace();
        if self.peek()? != b')' {
            return None;
        }
        self.pos += 1;

        std::str::from_utf8(&self.src[start..end]).ok()
    }
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
