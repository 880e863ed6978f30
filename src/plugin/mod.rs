pub mod artifact;
pub mod error;
pub mod http;
pub mod installer;
pub mod job;
pub mod manifest;
pub mod marketplace;
pub mod reconciler;
pub mod upm;

#[cfg(test)]
pub mod testing;

pub use reconciler::Reconciler;
