pub mod encounter;
pub mod reconciler;
