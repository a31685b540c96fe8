//! Timestamped "Entered"/"Exiting" lines.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use lazy_static::lazy_static;

/// The classic `ctime` layout, e.g. `Thu Oct 16 09:05:42 2026`.
pub const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

lazy_static! {
    static ref TIMESTAMP_LOCK: Mutex<()> = Mutex::new(());
}

pub fn timestamp() -> String {
    let _lck = TIMESTAMP_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    Local::now().format(CTIME_FORMAT).to_string()
}

pub fn entered_line(function: &str) -> String {
    format!("Entered {} at {}", function, timestamp())
}

pub fn exiting_line(function: &str) -> String {
    format!("Exiting {} at {}", function, timestamp())
}

/// A sink that receives whole lines only.
pub struct Timeline<W> {
    sink: Mutex<W>,
}

impl<W: Write> Timeline<W> {
    pub fn new(sink: W) -> Self {
        Timeline {
            sink: Mutex::new(sink),
        }
    }

    pub fn entered(&self, function: &str) -> io::Result<()> {
        self.write_line(&entered_line(function))
    }

    pub fn exiting(&self, function: &str) -> io::Result<()> {
        self.write_line(&exiting_line(function))
    }

    pub fn write_line(&self, line: &str) -> io::Result<()> {
        // A panic mid-write can at worst leave a truncated line behind.
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(sink, "{}", line)?;
        sink.flush()
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
