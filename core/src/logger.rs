// Boot-stage diagnostic log
//
// There is no console this early; messages are collected in a fixed
// buffer and drained by whatever console the wider stage brings up.

use core::sync::atomic::{AtomicUsize, Ordering};

const MAX_LOG_ENTRIES: usize = 64;

/// Message severity. Discovery misses are informational; storage
/// failures are errors the operator will want on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Notice,
    Error,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Error => "ERROR",
        }
    }
}

static mut LOG_BUFFER: [Option<(LogLevel, &'static str)>; MAX_LOG_ENTRIES] =
    [None; MAX_LOG_ENTRIES];
static LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

pub fn log(level: LogLevel, message: &'static str) {
    let idx = LOG_COUNT.fetch_add(1, Ordering::SeqCst);
    if idx < MAX_LOG_ENTRIES {
        unsafe {
            LOG_BUFFER[idx] = Some((level, message));
        }
    }
}

pub fn get_logs() -> &'static [Option<(LogLevel, &'static str)>] {
    let count = LOG_COUNT.load(Ordering::SeqCst).min(MAX_LOG_ENTRIES);
    unsafe { &LOG_BUFFER[..count] }
}

pub fn log_count() -> usize {
    LOG_COUNT.load(Ordering::SeqCst).min(MAX_LOG_ENTRIES)
}

// Macros for easier logging

#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Info, $msg)
    };
}

#[macro_export]
macro_rules! log_notice {
    ($msg:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Notice, $msg)
    };
}

#[macro_export]
macro_rules! log_error {
    ($msg:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Error, $msg)
    };
}
