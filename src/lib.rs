//! Client core for the Bilo car-wash marketplace: session tracking, identity flows,
//! role-aware route authorization, transactional email and vendor JSON-LD.

pub mod config;
pub mod error;
pub mod models;
pub mod identity;
pub mod routing;
pub mod notify;
pub mod structured_data;
pub mod app;

pub use app::{BiloApp, Notice, NoticeKind};
pub use config::{AppConfig, HostEnvironment};
pub use error::{AppError, AppResult};

// Test-only printing helper: expands to tprintln! during tests and is absent otherwise.
// Usage in tests: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
