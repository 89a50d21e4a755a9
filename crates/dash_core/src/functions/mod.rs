pub mod plan;
pub mod reconcile;
pub mod validate;
