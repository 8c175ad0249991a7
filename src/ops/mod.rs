//! Manifest operations: finding manifests, rewriting them, writing them back.

pub mod directive;
pub mod locate;
pub mod rewrite;
pub mod transaction;

pub use directive::{Directive, Preset};
pub use locate::locate_manifests;
pub use rewrite::{Rewrite, RewriteReport, Rewriter};
pub use transaction::{Operation, Transaction};
