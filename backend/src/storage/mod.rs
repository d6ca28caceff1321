//! # Storage Module
//!
//! Handles all data persistence for the tutoring backend.
//!
//! The domain layer only ever talks to the traits in [`traits`]; the concrete
//! store is injected as an `Arc<dyn DataStore>`. Today the only
//! implementation is the in-memory [`MemoryStore`], which emulates the hosted
//! document store's collections (students, attendance, marks, invoices,
//! parentLogs, documents) with the same method surface.
//!
//! ## Guarantees
//!
//! - Reads hand out copies; callers never hold references into the store
//! - `update_*` / `delete_*` on an unknown ID fail with [`StoreError::NotFound`]
//! - No referential integrity, uniqueness or cross-collection transactions

pub mod errors;
pub mod memory;
pub mod traits;

pub use errors::StoreError;
pub use memory::MemoryStore;
pub use traits::{
    AttendanceStorage, AuthProvider, DataStore, DocumentStorage, InvoiceStorage, MarksStorage,
    MessageLogStorage, ParentLogStorage, StudentStorage,
};
