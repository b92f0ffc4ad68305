pub mod abi;
pub mod args;
mod caller;
pub mod events;
pub mod normalize;

pub use args::CallArguments;
pub use caller::ContractCaller;
pub use events::{LogEntry, decode_log};
pub use normalize::normalize_outputs;
