pub mod event;
pub mod invoice;

pub use event::{Event, EventPatch, EventType, ExpenseLine, NewEvent, UnknownEventType};
pub use invoice::{Invoice, InvoiceItem, InvoicePatch, InvoiceStatus, NewInvoice};
