//! パース関連のユーティリティ関数

use anyhow::Result;
use regex::Regex;
use std::fmt;

/// GDBのバージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GdbVersion {
    pub major: u32,
    pub minor: u32,
}

impl GdbVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for GdbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// `gdb --version` の出力からバージョンを取り出す
///
/// 1行目の最後のトークンから `7.2` のような数値を探す。
///
/// # Examples
/// ```
/// use drdebug_core::parse::{parse_gdb_version, GdbVersion};
///
/// let v = parse_gdb_version("GNU gdb (GDB) Red Hat Enterprise Linux (7.2-60.el6)").unwrap();
/// assert_eq!(v, GdbVersion::new(7, 2));
/// ```
pub fn parse_gdb_version(output: &str) -> Result<GdbVersion> {
    let line = output.lines().next().unwrap_or("");
    let last = line
        .split_whitespace()
        .last()
        .ok_or_else(|| anyhow::anyhow!("Empty gdb version output"))?;

    let pattern = Regex::new(r"([1-9][0-9]*)\.?([0-9]*)")?;
    let caps = pattern
        .captures(last)
        .ok_or_else(|| anyhow::anyhow!("No version number in '{}'", line))?;

    let major = caps[1]
        .parse::<u32>()
        .map_err(|e| anyhow::anyhow!("Invalid major version in '{}': {}", last, e))?;
    let minor = match &caps[2] {
        "" => 0,
        digits => digits
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("Invalid minor version in '{}': {}", last, e))?,
    };

    Ok(GdbVersion { major, minor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rhel_version() {
        let out = "GNU gdb (GDB) Red Hat Enterprise Linux (7.2-60.el6)\n\
                   Copyright (C) 2010 Free Software Foundation, Inc.\n";
        assert_eq!(parse_gdb_version(out).unwrap(), GdbVersion::new(7, 2));
    }

    #[test]
    fn test_parse_ubuntu_version() {
        let out = "GNU gdb (Ubuntu 12.1-0ubuntu1~22.04) 12.1\n";
        assert_eq!(parse_gdb_version(out).unwrap(), GdbVersion::new(12, 1));
    }

    #[test]
    fn test_two_digit_minor_is_newer() {
        let v = parse_gdb_version("GNU gdb 7.12").unwrap();
        assert!(v > GdbVersion::new(7, 4));
    }

    #[test]
    fn test_major_only() {
        assert_eq!(parse_gdb_version("gdb 8").unwrap(), GdbVersion::new(8, 0));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_gdb_version("").is_err());
        assert!(parse_gdb_version("GNU gdb unknown").is_err());
    }
}
