// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Log output formatting
//!
//! Every line is prefixed with a bracketed local timestamp followed by a tab:
//!
//! ```text
//! [ 2025-06-01 14:03:22 ]	slot1: 36.4
//! ```

use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// Timestamp prefix `[ YYYY-MM-DD HH:MM:SS ]` in local time
pub fn timestamp() -> String {
    Local::now().format("[ %Y-%m-%d %H:%M:%S ]").to_string()
}

/// Install the global logger
///
/// `RUST_LOG` is honored first, then `level` is applied on top of it.
pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}\t{}", timestamp(), record.args()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_layout() {
        let ts = timestamp();
        // "[ " + 19 chars + " ]"
        assert_eq!(ts.len(), 23);
        assert!(ts.starts_with("[ "));
        assert!(ts.ends_with(" ]"));
        assert_eq!(&ts[6..7], "-");
        assert_eq!(&ts[12..13], " ");
        assert_eq!(&ts[15..16], ":");
    }
}
