//! Verification helpers for lifecycle integration tests
//!
//! Assertions over verdicts and over the residual state of a
//! [`SimulatedElement`].

use thiserror::Error;

use oroadm_verify::{Check, DefectCategory, ValidationVerdict};

use crate::element::SimulatedElement;

/// Verification error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("{check} is {actual}, expected {expected}")]
    FlagMismatch {
        check: Check,
        expected: bool,
        actual: bool,
    },

    #[error("No {category:?} finding for {check} on a subject containing '{subject}'")]
    FindingMissing {
        check: Check,
        category: DefectCategory,
        subject: String,
    },

    #[error("Resources left on the element after the run: {names:?}")]
    ResourcesLeft { names: Vec<String> },

    #[error("{count} management sessions were never closed")]
    SessionsLeaked { count: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Expected five flags, in `(create, config, pm, alarm, delete)` order.
pub type Flags = (bool, bool, bool, bool, bool);

pub const ALL_PASS: Flags = (true, true, true, true, true);

/// Verify every flag of a verdict
pub fn assert_flags(verdict: &ValidationVerdict, expected: Flags) -> VerifyResult<()> {
    let (create, config, pm, alarm, delete) = expected;
    let pairs = [
        (Check::Create, create),
        (Check::Config, config),
        (Check::Pm, pm),
        (Check::Alarm, alarm),
        (Check::Delete, delete),
    ];
    for (check, expected) in pairs {
        let actual = verdict.get(check);
        if actual != expected {
            return Err(VerificationError::FlagMismatch {
                check,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

/// Verify that a finding explains a downgrade
pub fn assert_finding(
    verdict: &ValidationVerdict,
    check: Check,
    category: DefectCategory,
    subject: &str,
) -> VerifyResult<()> {
    let found = verdict
        .findings()
        .iter()
        .any(|f| f.check == check && f.category == category && f.subject.contains(subject));
    if found {
        Ok(())
    } else {
        Err(VerificationError::FindingMissing {
            check,
            category,
            subject: subject.to_string(),
        })
    }
}

/// Verify that a run left nothing behind on the element
pub fn assert_clean(element: &SimulatedElement) -> VerifyResult<()> {
    let mut names = element.interface_names();
    names.extend(element.connection_names());
    if !names.is_empty() {
        return Err(VerificationError::ResourcesLeft { names });
    }

    let count = element.open_sessions();
    if count > 0 {
        return Err(VerificationError::SessionsLeaked { count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_flags() {
        let mut verdict = ValidationVerdict::new();
        assert!(assert_flags(&verdict, ALL_PASS).is_ok());

        verdict.downgrade(Check::Alarm, DefectCategory::TelemetryUnavailable, "X-OTU", "none");
        assert_eq!(
            assert_flags(&verdict, ALL_PASS),
            Err(VerificationError::FlagMismatch {
                check: Check::Alarm,
                expected: true,
                actual: false,
            })
        );
        assert!(assert_flags(&verdict, (true, true, true, false, true)).is_ok());
        assert!(assert_finding(&verdict, Check::Alarm, DefectCategory::TelemetryUnavailable, "OTU").is_ok());
        assert!(assert_finding(&verdict, Check::Pm, DefectCategory::TelemetryUnavailable, "OTU").is_err());
    }
}
