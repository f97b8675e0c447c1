//! Routes batch items to the triage pipeline.

use std::sync::Arc;

use warden_batch::IItemExecutor;
use warden_core::errors::WardenResult;
use warden_core::models::{Actor, BatchAction};
use warden_core::traits::INoticeDispatcher;

use crate::pipeline::TriagePipeline;

/// Each batch action calls the same entry point a reviewer or the
/// automation would, so batch items get the same locking and events.
pub struct PipelineExecutor<D: INoticeDispatcher> {
    pipeline: Arc<TriagePipeline<D>>,
}

impl<D: INoticeDispatcher> PipelineExecutor<D> {
    pub fn new(pipeline: Arc<TriagePipeline<D>>) -> Self {
        Self { pipeline }
    }
}

impl<D: INoticeDispatcher + 'static> IItemExecutor for PipelineExecutor<D> {
    async fn execute(&self, action: BatchAction, case_id: &str, actor: &Actor) -> WardenResult<()> {
        match action {
            BatchAction::Approve => self.pipeline.approve(case_id, actor).await.map(|_| ()),
            BatchAction::RejectFalsePositive => self
                .pipeline
                .reject_false_positive(case_id, actor)
                .await
                .map(|_| ()),
            BatchAction::Dispatch => self.pipeline.dispatch(case_id, actor).await.map(|_| ()),
            BatchAction::Triage => self.pipeline.triage(case_id).await.map(|_| ()),
        }
    }
}
