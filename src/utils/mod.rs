pub mod artifact;
pub mod command;
