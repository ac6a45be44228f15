use crate::utils::error::{Result, SyncError};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^v?(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
    )
    .expect("semver pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum PreRelease {
    Numeric(u64),
    Alpha(String),
}

impl Ord for PreRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PreRelease::Numeric(a), PreRelease::Numeric(b)) => a.cmp(b),
            (PreRelease::Numeric(_), PreRelease::Alpha(_)) => Ordering::Less,
            (PreRelease::Alpha(_), PreRelease::Numeric(_)) => Ordering::Greater,
            (PreRelease::Alpha(a), PreRelease::Alpha(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for PreRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A `major.minor.patch[-pre][+build]` version. Build metadata is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pre: Vec<PreRelease>,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| SyncError::InvalidConfigValueError {
            field: "version".to_string(),
            value: input.to_string(),
            reason: reason.to_string(),
        };

        let caps = SEMVER
            .captures(input.trim())
            .ok_or_else(|| invalid("not a semantic version"))?;
        let number = |idx: usize| -> Result<u64> {
            caps[idx]
                .parse::<u64>()
                .map_err(|_| invalid("version component out of range"))
        };

        let pre = match caps.get(4) {
            Some(m) => m
                .as_str()
                .split('.')
                .map(|ident| match ident.parse::<u64>() {
                    Ok(n) if !(ident.len() > 1 && ident.starts_with('0')) => {
                        PreRelease::Numeric(n)
                    }
                    _ => PreRelease::Alpha(ident.to_string()),
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            pre,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                // a pre-release sorts below its release
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            let idents: Vec<String> = self
                .pre
                .iter()
                .map(|p| match p {
                    PreRelease::Numeric(n) => n.to_string(),
                    PreRelease::Alpha(s) => s.clone(),
                })
                .collect();
            write!(f, "-{}", idents.join("."))?;
        }
        Ok(())
    }
}

/// Fails closed: a missing or unparsable version is never compatible.
pub fn version_at_least(reported: Option<&str>, minimum: &str) -> bool {
    let Some(reported) = reported else {
        return false;
    };
    match (Version::parse(reported), Version::parse(minimum)) {
        (Ok(reported), Ok(minimum)) => reported >= minimum,
        (Err(e), _) | (_, Err(e)) => {
            tracing::debug!("Version comparison failed closed: {}", e);
            false
        }
    }
}
