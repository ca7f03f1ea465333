//! Target reconciliation.
//!
//! Brings the live target registry in line with the targets declared by the
//! configuration source each time that source changes.
mod reconciler;
pub use reconciler::*;
