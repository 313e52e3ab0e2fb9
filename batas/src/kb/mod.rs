mod client;
mod retry;
mod token;

pub use client::*;
pub use retry::*;
pub use token::*;
