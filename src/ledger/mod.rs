mod record;
mod store;

pub use record::{DeploymentRecord, DeploymentType, is_valid_address, now_timestamp};
pub use store::Ledger;
