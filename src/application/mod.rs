pub mod handlers;
pub mod interrupt;
pub mod prompt;
pub mod render;
pub mod shell;
