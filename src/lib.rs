//! Core engine for suggesting the right set of `#include` lines in a C/C++
//! translation unit.
//!
//! The pipeline mirrors a compiler front-end run: preprocessor events feed
//! the [`preprocessor::PreprocessorObserver`], which builds the include graph
//! and the include-picker mappings; an AST walker (external to this crate)
//! reports symbol uses into the per-file [`file_info::FileInfo`] records;
//! after preprocessing is finalized, [`analysis`] classifies every use and
//! [`report`] renders the add/remove/full-list diff.

pub mod analysis;
pub mod driver;
pub mod file_info;
pub mod paths;
pub mod picker;
pub mod preprocessor;
pub mod report;
pub mod source;
