use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{Invoice, InvoicePatch, NewInvoice};
use crate::services::calculator;
use crate::services::events::EventService;
use crate::services::metrics;
use crate::services::repository::{modify, DeleteAck, InsertAck, Record, Repository, UpdateAck};

/// Invoice store that keeps each event's revenue equal to the sum of its
/// live invoices' totals.
#[derive(Clone)]
pub struct InvoiceService {
    repo: Arc<dyn Repository<Invoice>>,
    events: EventService,
}

impl InvoiceService {
    pub fn new(repo: Arc<dyn Repository<Invoice>>, events: EventService) -> Self {
        Self { repo, events }
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, AppError> {
        self.repo.list().await
    }

    pub async fn list_for_event(&self, event_id: &ObjectId) -> Result<Vec<Invoice>, AppError> {
        self.repo.list_where("event_id", event_id).await
    }

    pub async fn get(&self, id: &ObjectId) -> Result<Option<Invoice>, AppError> {
        self.repo.get(id).await
    }

    /// Issue an invoice against an existing event and post its total as revenue.
    ///
    /// If the revenue posting does not land, the inserted invoice is removed
    /// again so neither write is visible.
    pub async fn create_for_event(
        &self,
        event_id: &ObjectId,
        draft: NewInvoice,
    ) -> Result<InsertAck<Invoice>, AppError> {
        let event = self.events.get(event_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Event {} not found", event_id))
        })?;

        let invoice = Invoice::for_event(&event, draft)?;
        self.repo.insert(&invoice).await?;

        match self.events.adjust_revenue(event_id, invoice.total).await {
            Ok(Some(_)) => {
                metrics::record_mutation("invoice", "create");
                tracing::info!(
                    invoice_id = %invoice.id,
                    event_id = %event_id,
                    total = %invoice.total,
                    "Invoice created"
                );
                Ok(InsertAck::new(invoice.id, invoice))
            }
            Ok(None) => {
                self.compensate(&invoice, "event_missing").await;
                Err(AppError::NotFound(anyhow::anyhow!(
                    "Event {} was deleted while the invoice was being created",
                    event_id
                )))
            }
            Err(e) => {
                self.compensate(&invoice, "posting_failed").await;
                Err(e)
            }
        }
    }

    /// Merge `patch` into the stored invoice and post any change of total to
    /// the originating event.
    ///
    /// If the posting fails the invoice is put back as it was, so the event's
    /// revenue never disagrees with its invoices.
    pub async fn update(
        &self,
        id: &ObjectId,
        patch: InvoicePatch,
    ) -> Result<UpdateAck, AppError> {
        let Some((before, after)) = modify(self.repo.as_ref(), id, |invoice: &mut Invoice| {
            invoice.apply_patch(&patch).map_err(AppError::from)
        })
        .await?
        else {
            tracing::debug!(invoice_id = %id, "Update for unknown invoice ignored");
            return Ok(UpdateAck::not_found());
        };

        let delta = match self.post_change(&before, &after).await {
            Ok(delta) => delta,
            Err(e) => {
                self.restore(&before, &after).await;
                return Err(e);
            }
        };

        metrics::record_mutation("invoice", "update");
        tracing::info!(invoice_id = %id, total = %after.total, delta = %delta, "Invoice updated");
        Ok(UpdateAck::modified())
    }

    /// Withdraw an invoice's total from the originating event, then remove the
    /// invoice. If the removal fails the total is posted back.
    pub async fn delete(&self, id: &ObjectId) -> Result<DeleteAck, AppError> {
        let Some(invoice) = self.repo.get(id).await? else {
            return Ok(DeleteAck::new(0));
        };

        self.post_to_event(&invoice.event_id, -invoice.total).await?;

        match self.repo.delete(id).await {
            Ok(0) => {
                // Removed concurrently; that caller made its own withdrawal.
                self.repost(&invoice, "delete_lost_race").await;
                Ok(DeleteAck::new(0))
            }
            Ok(deleted) => {
                metrics::record_mutation("invoice", "delete");
                tracing::info!(invoice_id = %id, event_id = %invoice.event_id, "Invoice deleted");
                Ok(DeleteAck::new(deleted))
            }
            Err(e) => {
                self.repost(&invoice, "delete_failed").await;
                Err(e)
            }
        }
    }

    async fn post_change(&self, before: &Invoice, after: &Invoice) -> Result<Decimal, AppError> {
        let delta = calculator::difference(after.total, before.total)?;
        if !delta.is_zero() {
            self.post_to_event(&after.event_id, delta).await?;
        }
        Ok(delta)
    }

    async fn post_to_event(&self, event_id: &ObjectId, delta: Decimal) -> Result<(), AppError> {
        if self.events.adjust_revenue(event_id, delta).await?.is_none() {
            tracing::debug!(event_id = %event_id, delta = %delta, "Event gone, revenue posting skipped");
        }
        Ok(())
    }

    /// Write `before` back over our own update. A newer write is left alone.
    async fn restore(&self, before: &Invoice, after: &Invoice) {
        metrics::record_compensation("update_posting_failed");
        let mut restored = before.clone();
        restored.version = after.version();
        restored.mark_written();

        match self.repo.replace(&restored, after.version()).await {
            Ok(true) => tracing::warn!(invoice_id = %before.id, "Invoice update rolled back"),
            Ok(false) => tracing::error!(
                invoice_id = %before.id,
                "Invoice changed again before its update could be rolled back"
            ),
            Err(e) => tracing::error!(
                invoice_id = %before.id,
                "Failed to roll back invoice update: {}",
                e
            ),
        }
    }

    async fn repost(&self, invoice: &Invoice, reason: &'static str) {
        metrics::record_compensation(reason);
        match self.post_to_event(&invoice.event_id, invoice.total).await {
            Ok(()) => tracing::warn!(
                invoice_id = %invoice.id,
                reason,
                "Revenue withdrawal reversed"
            ),
            Err(e) => tracing::error!(
                invoice_id = %invoice.id,
                reason,
                "Failed to reverse revenue withdrawal: {}",
                e
            ),
        }
    }

    async fn compensate(&self, invoice: &Invoice, reason: &'static str) {
        metrics::record_compensation(reason);
        match self.repo.delete(&invoice.id).await {
            Ok(_) => tracing::warn!(
                invoice_id = %invoice.id,
                reason,
                "Invoice insert rolled back"
            ),
            Err(e) => tracing::error!(
                invoice_id = %invoice.id,
                reason,
                "Failed to roll back invoice insert: {}",
                e
            ),
        }
    }
}
