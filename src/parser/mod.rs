pub mod lexer;
pub mod span;
pub mod stream;

pub use span::Span;
pub use stream::TokenStream;
