pub mod error;
pub mod functions;

pub use crate::error::ProvisionError;
pub use crate::functions::plan::{plan, ProvisionPlans};
pub use crate::functions::reconcile::{apply, apply_project, destroy, destroy_project};
pub use crate::functions::validate::validate;
