// Resource registry and the generic controllers built on it

pub mod def;
pub mod list;
pub mod ops;
pub mod refs;
pub mod registry;

pub use def::{ResourceDef, ResourceSummary};
pub use list::{parse_list_params, ListParams};
pub use ops::ResourceOps;
pub use registry::{find, is_stored_collection, RESOURCES};
