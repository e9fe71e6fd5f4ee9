pub mod error;
pub mod fields;
pub mod object_id;
pub mod sanitize;

pub use error::ValidationErrors;
pub use fields::{check_required, validate_fields, validate_value, FieldDef, FieldKind};
pub use object_id::{is_valid_object_id, InvalidObjectId, ObjectId};
pub use sanitize::{pick_allowed, sanitize_string, sanitize_value};
