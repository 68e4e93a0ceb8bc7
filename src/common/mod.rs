pub mod exec;
pub mod platform;

pub use exec::{Executor, SystemExecutor};
pub use platform::Platform;
