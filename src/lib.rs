#![deny(clippy::print_stdout)]

pub mod command_line;
pub mod geometry;
pub mod matching;
pub mod molecule;
pub mod scoring;
