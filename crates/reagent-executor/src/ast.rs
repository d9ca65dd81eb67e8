//! Tokenizer and statement parser for the restricted snippet language.
//!
//! The surface is the linear subset the system prompt instructs the model to
//! write: imports, assignments, tool/builtin calls, literals, arithmetic,
//! f-strings, list indexing, and `print`. Everything else is rejected with an
//! error the model can read in its next observation.

use crate::ExecError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Name(String),
    Num(f64),
    Str(String),
    /// f-string body with escapes applied but `{...}` segments kept raw.
    FStr(String),
    Newline,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
}

/// Statement-level keywords the interpreter refuses to run.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "def", "class", "return", "lambda", "with", "try",
    "except", "finally", "raise", "global", "nonlocal", "del", "assert", "yield", "pass", "break",
    "continue", "match",
];

const FORBIDDEN_OPERATORS: &[&str] = &["and", "or", "not", "in", "is"];

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    FStr(String),
    Num(f64),
    Bool(bool),
    NoneLit,
    Name(String),
    List(Vec<Expr>),
    Neg(Box<Expr>),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    Index(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `import x.y` / `from x import a, b` — only the base module name matters.
    Import { module: String, base: String },
    Assign(String, Expr),
    Expr(Expr),
}

pub fn parse_program(src: &str) -> Result<Vec<Stmt>, ExecError> {
    let toks = tokenize(src)?;
    Parser { toks, pos: 0 }.parse()
}

/// Parse a single expression, e.g. the inside of an f-string `{...}` segment.
pub fn parse_expression(src: &str) -> Result<Expr, ExecError> {
    let toks = tokenize(src)?;
    let mut parser = Parser { toks, pos: 0 };
    while matches!(parser.peek(), Some(Tok::Newline)) {
        parser.pos += 1;
    }
    let expr = parser.parse_expr()?;
    while matches!(parser.peek(), Some(Tok::Newline)) {
        parser.pos += 1;
    }
    if parser.pos < parser.toks.len() {
        return Err(ExecError::Syntax(format!(
            "unexpected trailing tokens in expression '{src}'"
        )));
    }
    Ok(expr)
}

// --- Tokenizer ---

fn tokenize(src: &str) -> Result<Vec<Tok>, ExecError> {
    let chars: Vec<char> = src.chars().collect();
    let mut toks = Vec::new();
    let mut i = 0;
    let mut depth: i32 = 0;
    let mut line = 1usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                if depth == 0 {
                    toks.push(Tok::Newline);
                }
                i += 1;
            }
            ' ' | '\t' | '\r' => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '(' => {
                depth += 1;
                toks.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                depth -= 1;
                toks.push(Tok::RParen);
                i += 1;
            }
            '[' => {
                depth += 1;
                toks.push(Tok::LBracket);
                i += 1;
            }
            ']' => {
                depth -= 1;
                toks.push(Tok::RBracket);
                i += 1;
            }
            ',' => {
                toks.push(Tok::Comma);
                i += 1;
            }
            ':' => {
                toks.push(Tok::Colon);
                i += 1;
            }
            '+' => {
                toks.push(Tok::Plus);
                i += 1;
            }
            '-' => {
                toks.push(Tok::Minus);
                i += 1;
            }
            '*' => {
                toks.push(Tok::Star);
                i += 1;
            }
            '%' => {
                toks.push(Tok::Percent);
                i += 1;
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    toks.push(Tok::SlashSlash);
                    i += 2;
                } else {
                    toks.push(Tok::Slash);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    return Err(ExecError::Containment(format!(
                        "line {line}: comparison operators are not available in this restricted interpreter"
                    )));
                }
                toks.push(Tok::Assign);
                i += 1;
            }
            '\'' | '"' => {
                let (s, consumed) = scan_string(&chars[i..], line)?;
                toks.push(Tok::Str(s));
                line += chars[i..i + consumed].iter().filter(|c| **c == '\n').count();
                i += consumed;
            }
            '.' => {
                return Err(ExecError::Containment(format!(
                    "line {line}: attribute access is not available in this restricted interpreter; call tools directly by name"
                )));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                let n: f64 = text.parse().map_err(|_| {
                    ExecError::Syntax(format!("line {line}: invalid number literal '{text}'"))
                })?;
                toks.push(Tok::Num(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                // f-string prefix?
                if (c == 'f' || c == 'F')
                    && matches!(chars.get(i + 1), Some('\'') | Some('"'))
                {
                    let (s, consumed) = scan_string(&chars[i + 1..], line)?;
                    toks.push(Tok::FStr(s));
                    line += chars[i + 1..i + 1 + consumed]
                        .iter()
                        .filter(|c| **c == '\n')
                        .count();
                    i += 1 + consumed;
                    continue;
                }
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                toks.push(Tok::Name(name));
            }
            other => {
                return Err(ExecError::Syntax(format!(
                    "line {line}: unsupported character '{other}'"
                )));
            }
        }
    }
    toks.push(Tok::Newline);
    Ok(toks)
}

/// Scan a string literal starting at the opening quote. Returns the unescaped
/// body and the number of chars consumed including quotes. Handles both
/// single- and triple-quoted forms.
fn scan_string(chars: &[char], line: usize) -> Result<(String, usize), ExecError> {
    let quote = chars[0];
    let triple = chars.len() >= 3 && chars[1] == quote && chars[2] == quote;
    let (open_len, closer_len) = if triple { (3, 3) } else { (1, 1) };

    let mut out = String::new();
    let mut i = open_len;
    loop {
        if i >= chars.len() {
            return Err(ExecError::Syntax(format!(
                "line {line}: unterminated string literal"
            )));
        }
        if chars[i] == quote {
            if !triple {
                return Ok((out, i + 1));
            }
            if chars.len() >= i + 3 && chars[i + 1] == quote && chars[i + 2] == quote {
                return Ok((out, i + closer_len));
            }
            out.push(quote);
            i += 1;
            continue;
        }
        if chars[i] == '\n' && !triple {
            return Err(ExecError::Syntax(format!(
                "line {line}: unterminated string literal"
            )));
        }
        if chars[i] == '\\' && i + 1 < chars.len() {
            let esc = chars[i + 1];
            match esc {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
}

// --- Parser ---

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek2(&self) -> Option<&Tok> {
        self.toks.get(self.pos + 1)
    }

    fn next(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: &Tok, what: &str) -> Result<(), ExecError> {
        match self.next() {
            Some(ref t) if t == expected => Ok(()),
            other => Err(ExecError::Syntax(format!(
                "expected {what}, found {other:?}"
            ))),
        }
    }

    fn parse(&mut self) -> Result<Vec<Stmt>, ExecError> {
        let mut stmts = Vec::new();
        while self.pos < self.toks.len() {
            if matches!(self.peek(), Some(Tok::Newline)) {
                self.pos += 1;
                continue;
            }
            stmts.push(self.parse_stmt()?);
            match self.next() {
                None | Some(Tok::Newline) => {}
                Some(other) => {
                    return Err(ExecError::Syntax(format!(
                        "unexpected token after statement: {other:?}"
                    )));
                }
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ExecError> {
        if let Some(Tok::Name(name)) = self.peek() {
            let name = name.clone();

            if FORBIDDEN_KEYWORDS.contains(&name.as_str()) {
                return Err(ExecError::Containment(format!(
                    "'{name}' statements are not available in this restricted interpreter; write linear code using the provided tools"
                )));
            }

            if name == "import" {
                self.pos += 1;
                return self.parse_import();
            }
            if name == "from" {
                self.pos += 1;
                return self.parse_from_import();
            }

            // Assignment lookahead: NAME '=' expr
            if matches!(self.peek2(), Some(Tok::Assign)) {
                self.pos += 2;
                let expr = self.parse_expr()?;
                return Ok(Stmt::Assign(name, expr));
            }
        }

        Ok(Stmt::Expr(self.parse_expr()?))
    }

    fn parse_dotted_name(&mut self) -> Result<(String, String), ExecError> {
        // Attribute access is rejected at the tokenizer, so a dotted module
        // path never reaches here in practice; a bare name is the whole path.
        match self.next() {
            Some(Tok::Name(base)) => Ok((base.clone(), base)),
            other => Err(ExecError::Syntax(format!(
                "expected module name, found {other:?}"
            ))),
        }
    }

    fn parse_import(&mut self) -> Result<Stmt, ExecError> {
        let (module, base) = self.parse_dotted_name()?;
        // `import x as y` — the alias is accepted and discarded.
        if let Some(Tok::Name(kw)) = self.peek() {
            if kw == "as" {
                self.pos += 1;
                self.next();
            }
        }
        if matches!(self.peek(), Some(Tok::Comma)) {
            return Err(ExecError::Syntax(
                "import one module per statement".to_string(),
            ));
        }
        Ok(Stmt::Import { module, base })
    }

    fn parse_from_import(&mut self) -> Result<Stmt, ExecError> {
        let (module, base) = self.parse_dotted_name()?;
        match self.next() {
            Some(Tok::Name(kw)) if kw == "import" => {}
            other => {
                return Err(ExecError::Syntax(format!(
                    "expected 'import' in from-import, found {other:?}"
                )));
            }
        }
        // Consume the imported-name list; the interpreter binds nothing.
        loop {
            match self.peek() {
                Some(Tok::Name(_)) => {
                    self.pos += 1;
                }
                other => {
                    return Err(ExecError::Syntax(format!(
                        "expected name in from-import, found {other:?}"
                    )));
                }
            }
            if matches!(self.peek(), Some(Tok::Comma)) {
                self.pos += 1;
                continue;
            }
            break;
        }
        Ok(Stmt::Import { module, base })
    }

    fn parse_expr(&mut self) -> Result<Expr, ExecError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::BinOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ExecError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::SlashSlash) => BinOp::FloorDiv,
                Some(Tok::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::BinOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExecError> {
        match self.peek() {
            Some(Tok::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Tok::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExecError> {
        let mut expr = self.parse_atom()?;

        loop {
            match self.peek() {
                Some(Tok::LParen) => {
                    let Expr::Name(name) = expr else {
                        return Err(ExecError::Containment(
                            "only named tools and builtins can be called".to_string(),
                        ));
                    };
                    self.pos += 1;
                    let (args, kwargs) = self.parse_call_args()?;
                    expr = Expr::Call { name, args, kwargs };
                }
                Some(Tok::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_expr()?;
                    self.expect(&Tok::RBracket, "']'")?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ExecError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();

        if matches!(self.peek(), Some(Tok::RParen)) {
            self.pos += 1;
            return Ok((args, kwargs));
        }

        loop {
            // Trailing comma before ')'
            if matches!(self.peek(), Some(Tok::RParen)) {
                self.pos += 1;
                break;
            }

            // Keyword argument lookahead: NAME '=' expr
            if let (Some(Tok::Name(name)), Some(Tok::Assign)) = (self.peek(), self.peek2()) {
                let name = name.clone();
                self.pos += 2;
                let expr = self.parse_expr()?;
                kwargs.push((name, expr));
            } else {
                if !kwargs.is_empty() {
                    return Err(ExecError::Syntax(
                        "positional argument follows keyword argument".to_string(),
                    ));
                }
                args.push(self.parse_expr()?);
            }

            match self.next() {
                Some(Tok::Comma) => continue,
                Some(Tok::RParen) => break,
                other => {
                    return Err(ExecError::Syntax(format!(
                        "expected ',' or ')' in call arguments, found {other:?}"
                    )));
                }
            }
        }
        Ok((args, kwargs))
    }

    fn parse_atom(&mut self) -> Result<Expr, ExecError> {
        match self.next() {
            Some(Tok::Str(s)) => Ok(Expr::Str(s)),
            Some(Tok::FStr(s)) => Ok(Expr::FStr(s)),
            Some(Tok::Num(n)) => Ok(Expr::Num(n)),
            Some(Tok::Name(name)) => match name.as_str() {
                "True" => Ok(Expr::Bool(true)),
                "False" => Ok(Expr::Bool(false)),
                "None" => Ok(Expr::NoneLit),
                kw if FORBIDDEN_OPERATORS.contains(&kw) => Err(ExecError::Containment(format!(
                    "the '{kw}' operator is not available in this restricted interpreter"
                ))),
                kw if FORBIDDEN_KEYWORDS.contains(&kw) => Err(ExecError::Containment(format!(
                    "'{kw}' is not available in this restricted interpreter"
                ))),
                _ => Ok(Expr::Name(name)),
            },
            Some(Tok::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(&Tok::RParen, "')'")?;
                Ok(expr)
            }
            Some(Tok::LBracket) => {
                let mut items = Vec::new();
                if matches!(self.peek(), Some(Tok::RBracket)) {
                    self.pos += 1;
                    return Ok(Expr::List(items));
                }
                loop {
                    items.push(self.parse_expr()?);
                    match self.next() {
                        Some(Tok::Comma) => {
                            // Trailing comma before ']'
                            if matches!(self.peek(), Some(Tok::RBracket)) {
                                self.pos += 1;
                                break;
                            }
                        }
                        Some(Tok::RBracket) => break,
                        other => {
                            return Err(ExecError::Syntax(format!(
                                "expected ',' or ']' in list, found {other:?}"
                            )));
                        }
                    }
                }
                Ok(Expr::List(items))
            }
            other => Err(ExecError::Syntax(format!(
                "unexpected token: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment_and_call() {
        let stmts = parse_program("x = web_search(query=\"rust\")\nprint(x)").unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Assign(name, Expr::Call { .. }) if name == "x"));
        assert!(matches!(&stmts[1], Stmt::Expr(Expr::Call { name, .. }) if name == "print"));
    }

    #[test]
    fn test_parse_arithmetic_precedence() {
        let stmts = parse_program("1 + 2 * 3").unwrap();
        let Stmt::Expr(Expr::BinOp(BinOp::Add, _, rhs)) = &stmts[0] else {
            panic!("expected top-level add, got {:?}", stmts[0]);
        };
        assert!(matches!(**rhs, Expr::BinOp(BinOp::Mul, _, _)));
    }

    #[test]
    fn test_multiline_call_spans_statements() {
        let stmts = parse_program("web_search(\n    query=\"a\",\n)").unwrap();
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let stmts = parse_program("# setup\n\nx = 1  # trailing\n").unwrap();
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_control_flow_rejected() {
        let err = parse_program("for i in [1, 2]:\n    print(i)").unwrap_err();
        assert!(matches!(err, ExecError::Containment(_)));
        assert!(err.to_string().contains("'for'"));
    }

    #[test]
    fn test_attribute_access_rejected() {
        let err = parse_program("math.sqrt(2)").unwrap_err();
        assert!(matches!(err, ExecError::Containment(_)));
    }

    #[test]
    fn test_comparison_rejected() {
        let err = parse_program("x == 1").unwrap_err();
        assert!(matches!(err, ExecError::Containment(_)));
    }

    #[test]
    fn test_triple_quoted_string() {
        let stmts = parse_program("s = \"\"\"two\nlines\"\"\"").unwrap();
        assert!(matches!(&stmts[0], Stmt::Assign(_, Expr::Str(s)) if s == "two\nlines"));
    }

    #[test]
    fn test_fstring_token() {
        let stmts = parse_program("s = f\"value: {x}\"").unwrap();
        assert!(matches!(&stmts[0], Stmt::Assign(_, Expr::FStr(s)) if s == "value: {x}"));
    }

    #[test]
    fn test_import_forms() {
        let stmts = parse_program("import math\nfrom datetime import date, timedelta").unwrap();
        assert_eq!(
            stmts[0],
            Stmt::Import {
                module: "math".into(),
                base: "math".into()
            }
        );
        assert!(matches!(&stmts[1], Stmt::Import { base, .. } if base == "datetime"));
    }

    #[test]
    fn test_unterminated_string_is_syntax_error() {
        let err = parse_program("x = \"oops").unwrap_err();
        assert!(matches!(err, ExecError::Syntax(_)));
    }

    #[test]
    fn test_negative_number_and_index() {
        let stmts = parse_program("x = items[-1]").unwrap();
        assert!(matches!(&stmts[0], Stmt::Assign(_, Expr::Index(_, _))));
    }
}
