// file: src/version/mod.rs
// version: 1.0.0
// guid: 126c3c2c-21ef-4300-9e12-12767c733d0b

//! Semantic version bumping for the collection manifest

use crate::error::RunnerError;
use crate::Result;
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::str::FromStr;

/// Which version component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl BumpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = RunnerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "major" => Ok(BumpKind::Major),
            "minor" => Ok(BumpKind::Minor),
            "patch" => Ok(BumpKind::Patch),
            other => Err(RunnerError::UnknownBumpKind(other.to_string())),
        }
    }
}

/// Strictly parse a `MAJOR.MINOR.PATCH[-pre][+build]` version.
///
/// Surrounding whitespace is ignored since the manifest reader hands back a
/// trailing newline. A leading `v` or missing components are rejected.
pub fn parse_version(current: &str) -> Result<Version> {
    let trimmed = current.trim();
    Version::parse(trimmed).map_err(|e| RunnerError::InvalidVersion {
        version: trimmed.to_string(),
        reason: e.to_string(),
    })
}

/// Increment a parsed version.
///
/// Lower components reset to zero and build metadata is dropped. Bumping the
/// patch of a pre-release only strips the pre-release, since `1.2.3-rc.1`
/// already precedes `1.2.3`. A component already at `u64::MAX` cannot be
/// incremented and yields `InvalidVersion`.
pub fn increment(version: &Version, kind: BumpKind) -> Result<Version> {
    let overflow = || RunnerError::InvalidVersion {
        version: version.to_string(),
        reason: format!("{} component cannot be incremented past {}", kind, u64::MAX),
    };

    let mut next = version.clone();
    next.build = BuildMetadata::EMPTY;

    match kind {
        BumpKind::Major => {
            next.major = next.major.checked_add(1).ok_or_else(overflow)?;
            next.minor = 0;
            next.patch = 0;
        }
        BumpKind::Minor => {
            next.minor = next.minor.checked_add(1).ok_or_else(overflow)?;
            next.patch = 0;
        }
        BumpKind::Patch => {
            if version.pre.is_empty() {
                next.patch = next.patch.checked_add(1).ok_or_else(overflow)?;
            }
        }
    }

    next.pre = Prerelease::EMPTY;
    Ok(next)
}

/// Bump a version string, returning the new version string
pub fn bump(current: &str, kind: BumpKind) -> Result<String> {
    let version = parse_version(current)?;
    Ok(increment(&version, kind)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_components() {
        assert_eq!(bump("1.2.3", BumpKind::Patch).unwrap(), "1.2.4");
        assert_eq!(bump("1.2.3", BumpKind::Minor).unwrap(), "1.3.0");
        assert_eq!(bump("1.2.3", BumpKind::Major).unwrap(), "2.0.0");
    }

    #[test]
    fn test_bump_at_component_limit() {
        let max = u64::MAX;
        for (current, kind) in [
            (format!("{}.0.0", max), BumpKind::Major),
            (format!("1.{}.0", max), BumpKind::Minor),
            (format!("1.2.{}", max), BumpKind::Patch),
        ] {
            let err = bump(&current, kind).unwrap_err();
            assert!(matches!(err, RunnerError::InvalidVersion { .. }), "{}", current);
        }

        // Lower components at the limit are reset, not incremented
        assert_eq!(bump(&format!("1.{}.{}", max, max), BumpKind::Major).unwrap(), "2.0.0");
    }

    #[test]
    fn test_bump_trims_yq_output() {
        assert_eq!(bump("1.0.9\n", BumpKind::Patch).unwrap(), "1.0.10");
    }

    #[test]
    fn test_bump_invalid_version() {
        assert!(matches!(
            bump("not-a-version", BumpKind::Patch),
            Err(RunnerError::InvalidVersion { .. })
        ));
        assert!(matches!(
            bump("1.2", BumpKind::Minor),
            Err(RunnerError::InvalidVersion { .. })
        ));
        assert!(matches!(
            bump("v1.2.3", BumpKind::Major),
            Err(RunnerError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_bump_prerelease_and_build() {
        assert_eq!(bump("1.2.3-rc.1", BumpKind::Patch).unwrap(), "1.2.3");
        assert_eq!(bump("1.2.3-rc.1", BumpKind::Minor).unwrap(), "1.3.0");
        assert_eq!(bump("1.2.3+build.5", BumpKind::Patch).unwrap(), "1.2.4");
        assert_eq!(bump("0.9.7-beta+sha", BumpKind::Major).unwrap(), "1.0.0");
    }

    #[test]
    fn test_bump_kind_parse() {
        assert_eq!("major".parse::<BumpKind>().unwrap(), BumpKind::Major);
        assert_eq!("patch".parse::<BumpKind>().unwrap().to_string(), "patch");
        assert!(matches!(
            "sideways".parse::<BumpKind>(),
            Err(RunnerError::UnknownBumpKind(kind)) if kind == "sideways"
        ));
        assert!("Minor".parse::<BumpKind>().is_err());
    }
}
