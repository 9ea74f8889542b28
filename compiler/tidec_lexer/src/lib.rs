//! Turns source text into a flat token stream for `tidec_parser`. No
//! preprocessor: `#include`/`#define`/conditional compilation are not
//! recognized, matching this subset's Non-goals.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
