//! CLI command implementations.

mod describe;
mod discover;
mod helpers;
mod identity;
mod query;

pub use describe::{info, schema};
pub use discover::discover;
pub use identity::whoami;
pub use query::query;

#[cfg(test)]
mod tests;
