pub mod expense_service;
pub mod ingest_service;
pub mod price_poller;

pub use expense_service::ExpenseService;
pub use ingest_service::IngestService;
pub use price_poller::{Clock, PollerHandle, PricePoller, SystemClock};
