pub mod batch;
pub mod case;
pub mod decision;
pub mod event;
pub mod lifecycle;
pub mod policy;
pub mod takedown;

pub use batch::{BatchAction, BatchJob, BatchProgress, BatchStatus, ItemOutcome};
pub use case::{
    Case, CaseFilter, CaseIntake, CaseSignals, CaseStatus, ContentType, EstimatedImpact,
    PriorityClass,
};
pub use decision::{Action, Decision, ThresholdSource};
pub use event::{CaseEvent, EventType};
pub use lifecycle::{Actor, ComplianceSignal, SignalKind, Trigger};
pub use policy::{
    normalize_platform, AutomationPolicy, BatchingPreferences, ComplexityLevel, PlatformOverride,
    PolicyPatch, PolicyVersion,
};
pub use takedown::{TakedownRequest, TakedownStatus};
