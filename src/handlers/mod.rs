// handlers/mod.rs - Handler tiers
//
// Public (no auth) and protected (JWT, tenant-scoped) endpoints.

pub mod protected;
pub mod public;

use crate::error::ApiError;
use crate::validation::ObjectId;

/// Parse a path id; malformed ids are a 400, not a 404
pub(crate) fn path_id(raw: &str) -> Result<ObjectId, ApiError> {
    Ok(ObjectId::parse(raw)?)
}
