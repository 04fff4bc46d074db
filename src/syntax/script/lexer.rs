//! Lexical analysis for script blocks.
//!
//! Tokenization is done with logos. Comments and whitespace are
//! stripped during lexing (not tokens). String and identifier payloads
//! use `CompactString` so tokens stay `Send` for the rayon parse
//! workers and cheap to clone inside the parser.

use compact_str::CompactString;
use logos::Logos;

/// Script token.
///
/// Covers the keywords, operators, literals and delimiters of the
/// script grammar. Angle brackets are plain tokens; the parser decides
/// from position whether `<` opens a markup element or compares.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
#[logos(skip r"/\*([^*]|\*[^/])*\*/")] // Skip block comments
pub enum Token {
    // === Keywords ===
    /// Keyword `let`
    #[token("let")]
    Let,
    /// Keyword `const`
    #[token("const")]
    Const,
    /// Keyword `var`
    #[token("var")]
    Var,
    /// Keyword `fn`
    #[token("fn")]
    Fn,
    /// Keyword `import`
    #[token("import")]
    Import,
    /// Keyword `from`
    #[token("from")]
    From,
    /// Keyword `export`
    #[token("export")]
    Export,
    /// Keyword `return`
    #[token("return")]
    Return,
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `else`
    #[token("else")]
    Else,

    // Literals with fixed spelling
    /// Boolean literal `true`
    #[token("true")]
    True,
    /// Boolean literal `false`
    #[token("false")]
    False,
    /// Null literal
    #[token("null")]
    Null,

    // === Operators ===
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `/`
    #[token("/")]
    Slash,
    /// Operator `%`
    #[token("%")]
    Percent,
    /// Operator `==`
    #[token("==")]
    EqEq,
    /// Operator `!=`
    #[token("!=")]
    BangEq,
    /// Operator `<`
    #[token("<")]
    Lt,
    /// Operator `<=`
    #[token("<=")]
    LtEq,
    /// Operator `>`
    #[token(">")]
    Gt,
    /// Operator `>=`
    #[token(">=")]
    GtEq,
    /// Operator `&&`
    #[token("&&")]
    AndAnd,
    /// Operator `||`
    #[token("||")]
    OrOr,
    /// Operator `!`
    #[token("!")]
    Bang,
    /// Operator `=`
    #[token("=")]
    Eq,
    /// Operator `->`
    #[token("->")]
    Arrow,
    /// Operator `=>`
    #[token("=>")]
    FatArrow,
    /// Operator `:`
    #[token(":")]
    Colon,
    /// Operator `.`
    #[token(".")]
    Dot,
    /// Operator `,`
    #[token(",")]
    Comma,
    /// Operator `;`
    #[token(";")]
    Semicolon,

    // === Delimiters ===
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Delimiter `{`
    #[token("{")]
    LBrace,
    /// Delimiter `}`
    #[token("}")]
    RBrace,
    /// Delimiter `[`
    #[token("[")]
    LBracket,
    /// Delimiter `]`
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Numeric literal (integer or float, stored as f64)
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// String literal, double or single quoted, with escapes resolved.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1]).map(CompactString::from)
    })]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1]).map(CompactString::from)
    })]
    String(CompactString),

    /// Identifier (variable, function, type or element name)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| CompactString::from(lex.slice()))]
    Ident(CompactString),
}

/// Resolve escape sequences in a string literal body.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('0') => result.push('\0'),
                // Unsupported escape or trailing backslash
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Token::Number(n) => return write!(f, "{n}"),
            Token::String(s) => return write!(f, "\"{s}\""),
            Token::Ident(id) => return write!(f, "{id}"),
            Token::Let => "let",
            Token::Const => "const",
            Token::Var => "var",
            Token::Fn => "fn",
            Token::Import => "import",
            Token::From => "from",
            Token::Export => "export",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Bang => "!",
            Token::Eq => "=",
            Token::Arrow => "->",
            Token::FatArrow => "=>",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
        };
        write!(f, "{s}")
    }
}

/// Statement-head keywords, used for misspelling suggestions.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "let", "const", "var", "fn", "import", "export", "return", "if", "else",
];

#[cfg(test)]
mod tests {
    use super::*;

    /// Test helper: lex source and filter out errors.
    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source)
            .filter_map(|result| result.ok())
            .collect()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(CompactString::from(s))
    }

    fn string(s: &str) -> Token {
        Token::String(CompactString::from(s))
    }

    #[test]
    fn test_keywords() {
        let tokens = lex("let const var fn import from export return if else");
        assert_eq!(
            tokens,
            vec![
                Token::Let,
                Token::Const,
                Token::Var,
                Token::Fn,
                Token::Import,
                Token::From,
                Token::Export,
                Token::Return,
                Token::If,
                Token::Else,
            ]
        );
    }

    #[test]
    fn test_fat_arrow_is_not_eq_gt() {
        assert_eq!(lex("=>"), vec![Token::FatArrow]);
        assert_eq!(lex("= >"), vec![Token::Eq, Token::Gt]);
        assert_eq!(lex(">="), vec![Token::GtEq]);
    }

    #[test]
    fn test_let_binding() {
        let tokens = lex("let count: Num = 42;");
        assert_eq!(
            tokens,
            vec![
                Token::Let,
                ident("count"),
                Token::Colon,
                ident("Num"),
                Token::Eq,
                Token::Number(42.0),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 3.25 5e3 1.5e-2");
        assert_eq!(
            tokens,
            vec![
                Token::Number(42.0),
                Token::Number(3.25),
                Token::Number(5e3),
                Token::Number(1.5e-2),
            ]
        );
    }

    #[test]
    fn test_strings_both_quote_styles() {
        let tokens = lex(r#""hello" 'world'"#);
        assert_eq!(tokens, vec![string("hello"), string("world")]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#""line\nbreak" "quo\"te""#);
        assert_eq!(tokens, vec![string("line\nbreak"), string("quo\"te")]);
    }

    #[test]
    fn test_invalid_escape_is_error() {
        let results: Vec<_> = Token::lexer(r#""bad\q""#).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_operators() {
        let tokens = lex("+ - * / % == != < <= > >= && || !");
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::EqEq,
                Token::BangEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::AndAnd,
                Token::OrOr,
                Token::Bang,
            ]
        );
    }

    #[test]
    fn test_markup_fragment() {
        // Markup is lexed as plain angle-bracket tokens; grouping into
        // elements happens in the parser.
        let tokens = lex("<div class=\"row\">");
        assert_eq!(
            tokens,
            vec![
                Token::Lt,
                ident("div"),
                ident("class"),
                Token::Eq,
                string("row"),
                Token::Gt,
            ]
        );
    }

    #[test]
    fn test_closing_tag_tokens() {
        let tokens = lex("</div>");
        assert_eq!(
            tokens,
            vec![Token::Lt, Token::Slash, ident("div"), Token::Gt]
        );
    }

    #[test]
    fn test_comments_stripped() {
        let tokens = lex("let x // trailing\n/* block\ncomment */ = 1");
        assert_eq!(
            tokens,
            vec![Token::Let, ident("x"), Token::Eq, Token::Number(1.0)]
        );
    }

    #[test]
    fn test_lexer_error_detection() {
        let results: Vec<_> = Token::lexer("let @ x").collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_directive_attribute_tokens() {
        let tokens = lex("client:load");
        assert_eq!(tokens, vec![ident("client"), Token::Colon, ident("load")]);
    }
}
