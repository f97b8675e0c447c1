mod registry;
mod validate;

pub use registry::PolicyRegistry;
pub use validate::validate_policy;
