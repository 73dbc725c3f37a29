pub mod command;
pub mod directory;
