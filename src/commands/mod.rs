//! CLI 命令实现

pub mod ask;
pub mod check;
pub mod serve;

pub use ask::ask_command;
pub use check::check_command;
pub use serve::serve_command;
