//! Logger initialisation for the command-line front end.
//!
//! The library only emits through the `log` facade; the binary installs
//! `env_logger`. The level comes from `RUST_LOG` and defaults to `info`:
//!
//! ```text
//! RUST_LOG=debug timetable repair --data term.json --version 3
//! ```

use env_logger::{Builder, Env};

/// Installs the global logger. Calling it twice is harmless.
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}
