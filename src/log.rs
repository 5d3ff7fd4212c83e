//! Timestamped progress output, silent unless `GROEBNER_LOG` is set or
//! [`set_verbose`] turned it on.

use chrono::Local;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: Lazy<AtomicBool> =
    Lazy::new(|| AtomicBool::new(std::env::var_os("GROEBNER_LOG").is_some()));

pub fn set_verbose(on: bool) {
    VERBOSE.store(on, Ordering::Relaxed);
}

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::log::verbose() {
            println!("{} {}", $crate::log::timestamp(), format_args!($($arg)*));
        }
    };
}
