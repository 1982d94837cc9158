//==================================================
// File: context/version.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Build-stamp version string derivation
// Objective: Reproduce the day-offset/two-second build numbering scheme so
//            existing tooling keeps parsing the version banner
//==================================================

use chrono::{Duration, NaiveDate};
use std::fmt;

/// Four-part version tuple in build-stamp convention: the build number
/// counts days from January 1, 2000 and the revision counts two-second
/// increments from midnight of that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl Version {
    /// Derive the running binary's version from its build metadata. The
    /// package patch level doubles as the build number; the revision may be
    /// stamped in at compile time through `REVEL_BUILD_REVISION`.
    pub fn from_build_metadata() -> Self {
        Self {
            major: parse_part(env!("CARGO_PKG_VERSION_MAJOR")),
            minor: parse_part(env!("CARGO_PKG_VERSION_MINOR")),
            build: parse_part(env!("CARGO_PKG_VERSION_PATCH")),
            revision: option_env!("REVEL_BUILD_REVISION").map_or(0, parse_part),
        }
    }

    /// Human-readable build timestamp: epoch 2000-01-01 plus `build` days,
    /// plus `revision` x 2 seconds past midnight.
    pub fn build_stamp(&self) -> String {
        let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).expect("fixed epoch is a valid date");
        let midnight = epoch.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
        let stamped = midnight
            + Duration::days(i64::from(self.build))
            + Duration::seconds(i64::from(self.revision) * 2);
        stamped.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Full version banner: tuple plus bracketed build timestamp.
    pub fn banner(&self) -> String {
        format!("{self} [{}]", self.build_stamp())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

fn parse_part(text: &str) -> u32 {
    text.parse().unwrap_or(0)
}
