mod scanner;
mod token;

pub use scanner::*;
pub use token::*;
