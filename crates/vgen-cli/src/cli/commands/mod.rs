//! CLI command handlers. Each command is in its own file.

mod completions;
mod follow;
mod generate;
mod health;
mod status;
mod submit;
mod video;
mod watch;

pub use completions::{run_completions, run_manpage};
pub use generate::run_generate;
pub use health::run_health;
pub use status::run_status;
pub use submit::run_submit;
pub use video::run_video;
pub use watch::run_watch;
