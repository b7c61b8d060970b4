pub mod grep;
pub mod serve;

pub use grep::{run_grep, GrepArgs};
pub use serve::{run_serve, ServeArgs};
