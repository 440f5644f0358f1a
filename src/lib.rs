pub mod board;
pub mod config;
pub mod content;
pub mod errors;
pub mod publish;
pub mod sync;
pub mod util;

#[cfg(test)]
mod testing;
