//! Record persistence
//!
//! - **repository**: `RecordStore` contract and its JSON-file implementation
//! - **layout**: Directory layout below the data directory
//! - **error**: Error types
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!   sessions/<id>.json
//!   inventory/profiles/<id>.json
//!   inventory/projectiles/<id>.json
//!   inventory/sights/<id>.json
//! ```

pub mod error;
pub mod layout;
pub mod repository;

pub use error::{StorageError, StorageResult};
pub use layout::DataLayout;
pub use repository::{JsonRepository, Record, RecordStore};
