//! This module contains all custom errors used in this library.

use std::fmt;
use std::error::Error;

/// Errors while reading a graph in edge-list format. Line numbers start at 1.
#[derive(Debug)]
pub enum ImportError {
    IoError(std::io::Error),
    /// A line holds only one vertex name.
    SyntaxError(usize),
    /// A line connects a vertex to itself.
    SelfLoop(usize),
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> ImportError {
        ImportError::IoError(e)
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "Import: IoError ({})", e),
            Self::SyntaxError(line) => write!(f, "Import: Syntax error on line {}", line),
            Self::SelfLoop(line) => write!(f, "Import: Self-loop on line {}", line),
        }
    }
}

impl Error for ImportError {}

#[derive(Debug)]
pub enum ProcessingError {
    InvalidSolution(String),
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSolution(msg) => write!(f, "InvalidSolution: {}", msg),
        }
    }
}

impl Error for ProcessingError {}
