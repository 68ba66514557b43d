//! Operations on remote paths, split into focused modules.

mod download;
mod resolve;
mod share;
mod upload;

pub use resolve::PathResolver;
