pub mod dispatcher;
pub mod types;

pub use dispatcher::{RetryCallback, RetryDecision, RetryingDispatcher};
pub use types::RetryConfig;
