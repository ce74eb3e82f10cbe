//! Application services
//!
//! - **session_service**: Session creation, shot recording, statistics
//! - **catalog_service**: Profiles, projectiles and sights
//! - **chrono_bridge**: Poll-and-record integration of a chronograph
//! - **dto**: Views returned to callers
//! - **error**: Error types

pub mod catalog_service;
pub mod chrono_bridge;
pub mod dto;
pub mod error;
pub mod session_service;

pub use catalog_service::{CatalogService, NewOptic, NewProfile, NewProjectile};
pub use chrono_bridge::ChronoBridge;
pub use dto::{PollOutcome, SessionSummary, SessionView, ShotView};
pub use error::{ServiceError, ServiceResult};
pub use session_service::SessionService;

use crate::storage::{Record, RecordStore};

/// Load every record in `store`, skipping ones that cannot be read
pub(crate) fn load_all<T: Record>(store: &dyn RecordStore<T>) -> ServiceResult<Vec<T>> {
    let ids = store.list_ids()?;
    let mut records = Vec::with_capacity(ids.len());

    for id in ids {
        match store.load(&id) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(kind = T::KIND, id = %id, "Skipping unreadable record: {}", e);
            }
        }
    }

    Ok(records)
}
