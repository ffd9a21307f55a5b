//! Conflict reconciliation between the local and remote change sets.

pub mod reconciler;

pub use reconciler::reconcile;
