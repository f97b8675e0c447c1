pub mod batch_ops;
pub mod case_ops;
pub mod event_ops;
pub mod policy_ops;
pub mod takedown_ops;
