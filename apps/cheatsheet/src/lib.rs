//! Russian cheatsheet assembler.
//!
//! Fetches the cheatsheet's page fragments over HTTP in parallel, writes them
//! in manifest order into a container element of a shell document, and wires
//! click-to-reveal spoilers on the result.

pub mod assembler;
pub mod cheatsheet;
pub mod config;
pub mod dom;
pub mod errors;
pub mod fetch;
pub mod fragment;
pub mod manifest;
pub mod shell;
pub mod spoiler;

pub use assembler::{AssemblerConfig, AssemblyReport, PageAssembler};
pub use cheatsheet::Cheatsheet;
pub use config::Config;
pub use dom::Document;
pub use errors::AppError;
pub use fetch::{FetchError, FragmentSource, HttpFragmentSource};
pub use fragment::Fragment;
pub use manifest::Manifest;
