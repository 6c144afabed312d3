pub mod deliver;
pub mod dispatch;
pub mod export;
pub mod fetch;
pub mod markdown;

pub use dispatch::{Dispatcher, FlowState};
