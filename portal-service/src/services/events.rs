use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{Event, EventPatch, NewEvent};
use crate::services::metrics;
use crate::services::repository::{modify, DeleteAck, InsertAck, Repository, UpdateAck};

/// Reads and writes events, keeping `profit = revenue - expenses` on every write.
#[derive(Clone)]
pub struct EventService {
    repo: Arc<dyn Repository<Event>>,
}

impl EventService {
    pub fn new(repo: Arc<dyn Repository<Event>>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Event>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: &ObjectId) -> Result<Option<Event>, AppError> {
        self.repo.get(id).await
    }

    pub async fn create(&self, draft: NewEvent) -> Result<InsertAck<Event>, AppError> {
        let event = Event::new(draft);
        self.repo.insert(&event).await?;

        metrics::record_mutation("event", "create");
        tracing::info!(
            event_id = %event.id,
            expenses = %event.expenses,
            "Event created"
        );

        Ok(InsertAck::new(event.id, event))
    }

    /// Merge `patch` into the stored event. An unknown id is acknowledged
    /// with zero matches rather than treated as an error.
    pub async fn update(&self, id: &ObjectId, patch: EventPatch) -> Result<UpdateAck, AppError> {
        if patch.is_empty() {
            let matched = u64::from(self.repo.get(id).await?.is_some());
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: matched,
                modified_count: 0,
            });
        }

        let apply = |event: &mut Event| event.apply_patch(&patch).map_err(AppError::from);
        match modify(self.repo.as_ref(), id, apply).await? {
            Some((_, after)) => {
                metrics::record_mutation("event", "update");
                tracing::info!(event_id = %id, profit = %after.profit, "Event updated");
                Ok(UpdateAck::modified())
            }
            None => {
                tracing::debug!(event_id = %id, "Update for unknown event ignored");
                Ok(UpdateAck::not_found())
            }
        }
    }

    /// Post an invoice amount (negative to reverse) to the event's revenue.
    /// Returns `None` when the event no longer exists.
    pub async fn adjust_revenue(
        &self,
        id: &ObjectId,
        delta: Decimal,
    ) -> Result<Option<Event>, AppError> {
        let updated = modify(self.repo.as_ref(), id, |event: &mut Event| {
            event.post_revenue(delta).map_err(AppError::from)
        })
        .await?
        .map(|(_, after)| after);

        if let Some(event) = &updated {
            metrics::record_revenue_posting(delta);
            tracing::info!(
                event_id = %id,
                delta = %delta,
                revenue = %event.revenue,
                profit = %event.profit,
                "Revenue posted"
            );
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<DeleteAck, AppError> {
        let deleted = self.repo.delete(id).await?;
        if deleted > 0 {
            metrics::record_mutation("event", "delete");
            tracing::info!(event_id = %id, "Event deleted");
        }
        Ok(DeleteAck::new(deleted))
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.repo.health_check().await
    }
}
