pub mod character_deletion;
pub mod command;

pub use character_deletion::run_character_deletion_consumer;
pub use command::run_command_consumer;
