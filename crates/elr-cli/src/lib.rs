//! Library half of the `elr` command-line tool.

pub mod io;
pub mod logging;
