use metrics::{counter, histogram};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub fn init_metrics() {
    service_core::observability::init_metrics();
}

pub fn get_metrics() -> String {
    service_core::observability::render_metrics()
}

/// Count a create/update/delete on an event or invoice.
pub fn record_mutation(kind: &'static str, operation: &'static str) {
    counter!("portal_mutations_total", "kind" => kind, "operation" => operation).increment(1);
}

/// Count an applied revenue posting and its size.
pub fn record_revenue_posting(delta: Decimal) {
    let direction = if delta.is_sign_negative() { "reversal" } else { "posting" };
    counter!("portal_revenue_postings_total", "direction" => direction).increment(1);
    histogram!("portal_revenue_posting_amount").record(delta.abs().to_f64().unwrap_or_default());
}

pub fn record_compensation(reason: &'static str) {
    counter!("portal_invoice_compensations_total", "reason" => reason).increment(1);
}

pub fn record_login(outcome: &'static str) {
    counter!("portal_logins_total", "outcome" => outcome).increment(1);
}
