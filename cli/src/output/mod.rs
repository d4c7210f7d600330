//! CLI-specific output implementations
//!
//! Concrete implementation of the core output abstraction for the terminal.

pub mod terminal;

pub use terminal::ConsoleOutput;
