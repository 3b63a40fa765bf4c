//! Five-flag verdict of a lifecycle run.

use std::fmt;

use serde::Serialize;
use tracing::warn;

/// One verdict flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    Create,
    Config,
    Pm,
    Alarm,
    Delete,
}

impl Check {
    pub const ALL: [Check; 5] = [Check::Create, Check::Config, Check::Pm, Check::Alarm, Check::Delete];
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Check::Create => "createCheck",
            Check::Config => "configCheck",
            Check::Pm => "pmCheck",
            Check::Alarm => "alarmCheck",
            Check::Delete => "deleteCheck",
        };
        write!(f, "{}", s)
    }
}

/// Category of a lifecycle defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefectCategory {
    /// Observed configuration or RPC response does not contain the expected one.
    AssertionMismatch,
    /// PM or alarm lookup failed or returned an unexpected shape.
    TelemetryUnavailable,
    /// A created resource never appeared, or a deleted one is still there.
    LifecycleInconsistency,
    /// The port topology leaves a port with nothing to exercise it against.
    Reconstruction,
}

/// One logged reason for a downgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub check: Check,
    pub category: DefectCategory,
    /// Port or interface the finding is about.
    pub subject: String,
    pub detail: String,
}

/// Five independent flags, each starting true and only ever downgraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    create_check: bool,
    config_check: bool,
    pm_check: bool,
    alarm_check: bool,
    delete_check: bool,
    findings: Vec<Finding>,
}

impl Default for ValidationVerdict {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationVerdict {
    pub fn new() -> Self {
        Self {
            create_check: true,
            config_check: true,
            pm_check: true,
            alarm_check: true,
            delete_check: true,
            findings: Vec::new(),
        }
    }

    /// Current value of a flag.
    pub fn get(&self, check: Check) -> bool {
        match check {
            Check::Create => self.create_check,
            Check::Config => self.config_check,
            Check::Pm => self.pm_check,
            Check::Alarm => self.alarm_check,
            Check::Delete => self.delete_check,
        }
    }

    /// Sets a flag to false and records why. There is no way back to true.
    pub fn downgrade(
        &mut self,
        check: Check,
        category: DefectCategory,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) {
        let finding = Finding {
            check,
            category,
            subject: subject.into(),
            detail: detail.into(),
        };
        warn!("{} failed for {}: {}", check, finding.subject, finding.detail);

        let flag = match check {
            Check::Create => &mut self.create_check,
            Check::Config => &mut self.config_check,
            Check::Pm => &mut self.pm_check,
            Check::Alarm => &mut self.alarm_check,
            Check::Delete => &mut self.delete_check,
        };
        *flag = false;
        self.findings.push(finding);
    }

    /// The flags as a `(create, config, pm, alarm, delete)` tuple.
    pub fn flags(&self) -> (bool, bool, bool, bool, bool) {
        (
            self.create_check,
            self.config_check,
            self.pm_check,
            self.alarm_check,
            self.delete_check,
        )
    }

    pub fn passed(&self) -> bool {
        Check::ALL.iter().all(|c| self.get(*c))
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}

impl fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Check::ALL
            .iter()
            .map(|c| format!("{}={}", c, self.get(*c)))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_starts_all_true() {
        let verdict = ValidationVerdict::new();
        assert_eq!(verdict.flags(), (true, true, true, true, true));
        assert!(verdict.passed());
        assert!(verdict.findings().is_empty());
    }

    #[test]
    fn test_downgrade_is_independent_and_monotonic() {
        let mut verdict = ValidationVerdict::new();
        verdict.downgrade(
            Check::Pm,
            DefectCategory::TelemetryUnavailable,
            "XPDR1-NETWORK1-OTU",
            "no PM sample",
        );
        assert_eq!(verdict.flags(), (true, true, false, true, true));

        // a second downgrade of the same flag keeps it false
        verdict.downgrade(Check::Pm, DefectCategory::TelemetryUnavailable, "x", "again");
        assert!(!verdict.get(Check::Pm));
        assert_eq!(verdict.findings().len(), 2);
        assert!(!verdict.passed());
    }

    #[test]
    fn test_display_and_serialize() {
        let mut verdict = ValidationVerdict::new();
        verdict.downgrade(Check::Delete, DefectCategory::LifecycleInconsistency, "X", "still present");
        assert_eq!(
            verdict.to_string(),
            "createCheck=true configCheck=true pmCheck=true alarmCheck=true deleteCheck=false"
        );
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["deleteCheck"], false);
        assert_eq!(json["findings"][0]["category"], "lifecycle-inconsistency");
    }
}
