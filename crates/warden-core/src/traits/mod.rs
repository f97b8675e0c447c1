mod batch_store;
mod case_store;
mod dispatcher;
mod event_log;
mod policy_store;

pub use batch_store::IBatchJobStore;
pub use case_store::{CasOutcome, CaseTransition, ICaseStore};
pub use dispatcher::{DispatchReceipt, INoticeDispatcher};
pub use event_log::IEventLog;
pub use policy_store::IPolicyStore;
