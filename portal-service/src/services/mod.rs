pub mod auth;
pub mod calculator;
pub mod events;
pub mod invoices;
pub mod jwt;
pub mod memory;
pub mod metrics;
pub mod mongo;
pub mod repository;

pub use auth::Authenticator;
pub use events::EventService;
pub use invoices::InvoiceService;
pub use jwt::{AccessTokenClaims, TokenResponse, TokenService};
pub use memory::MemoryRepository;
pub use metrics::{get_metrics, init_metrics};
pub use mongo::{MongoRepository, PortalDb};
pub use repository::{DeleteAck, InsertAck, Record, Repository, UpdateAck};
