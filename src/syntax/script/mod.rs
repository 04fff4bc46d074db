//! Script block sub-parser: lexer, AST, and recursive descent parser
//! for the typed script grammar with embedded markup elements.

pub mod ast;
pub mod lexer;
mod parser;

pub use parser::{PARSER_FUEL, parse};
