//! Presentation collaborators.

pub mod console;

pub use console::ConsoleView;
