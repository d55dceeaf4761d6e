//! Source loading: byte retrieval plus the memoized dataset/model loaders.

pub mod cache;
pub mod source;

pub use cache::{Dataset, Loaders, MemoCache};
pub use source::{ByteSource, HttpSource};
