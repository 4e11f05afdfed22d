//! The license validation test suite.
//!
//! Validation runs a closed set of five independent tests in a fixed
//! order and collects every result; a failure never short-circuits the
//! remaining tests. The signature test anchors the suite: when it fails,
//! the other results describe possibly tampered data, which is still
//! useful for diagnosis.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::key::{Signature, VerifyingKey};
use crate::license::{normalize_hardware_address, License};

/// The closed set of validation tests, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationTest {
    /// Signature verifies against the supplied public key.
    Signature,
    /// The validity window has started.
    StartDate,
    /// The calendar expiration date has not passed.
    Expiration,
    /// The floating period since first use has not elapsed.
    FloatingExpiration,
    /// A local hardware address matches the license's lock set.
    Hardware,
}

impl ValidationTest {
    /// All tests in execution order.
    pub const ALL: [ValidationTest; 5] = [
        ValidationTest::Signature,
        ValidationTest::StartDate,
        ValidationTest::Expiration,
        ValidationTest::FloatingExpiration,
        ValidationTest::Hardware,
    ];

    /// Stable display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signature => "Signature",
            Self::StartDate => "Start Date",
            Self::Expiration => "Expiration",
            Self::FloatingExpiration => "Floating Expiration",
            Self::Hardware => "Hardware",
        }
    }
}

impl fmt::Display for ValidationTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome of a single validation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestResult {
    pub test: ValidationTest,
    pub passed: bool,
}

/// Aggregated outcome of one validation run, in test execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseState {
    results: Vec<TestResult>,
}

impl LicenseState {
    fn new(results: Vec<TestResult>) -> Self {
        Self { results }
    }

    /// Individual test results in execution order.
    #[must_use]
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// True iff every test passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Whether a specific test passed.
    #[must_use]
    pub fn passed(&self, test: ValidationTest) -> bool {
        self.results.iter().any(|r| r.test == test && r.passed)
    }
}

/// An invalid license surfaced through the error-returning API.
///
/// Carries the complete [`LicenseState`] so individual test outcomes
/// stay inspectable; an invalid license loses no diagnostic detail by
/// being reported as an error.
#[derive(Debug, Clone, Error)]
#[error("license failed validation")]
pub struct ValidationFailure {
    state: LicenseState,
}

impl ValidationFailure {
    /// The full validation report.
    #[must_use]
    pub fn state(&self) -> &LicenseState {
        &self.state
    }
}

/// Runs the validation test suite for one license against one public key.
///
/// Validation is a pure function of the license, the configuration, and
/// the caller-supplied `now`; a validator can be reused and shared
/// freely. First-use persistence is the caller's concern: the validator
/// only consumes a timestamp.
pub struct Validator {
    license: License,
    verifying_key: VerifyingKey,
    ignore_float_time: bool,
    first_use: Option<DateTime<Utc>>,
    local_addresses: BTreeSet<String>,
}

impl Validator {
    #[must_use]
    pub fn new(license: License, verifying_key: VerifyingKey) -> Self {
        Self {
            license,
            verifying_key,
            ignore_float_time: false,
            first_use: None,
            local_addresses: BTreeSet::new(),
        }
    }

    /// Suppresses the floating-expiration test. Used by tooling that
    /// only reports floating expiry instead of enforcing it.
    #[must_use]
    pub fn ignore_float_time(mut self, ignore: bool) -> Self {
        self.ignore_float_time = ignore;
        self
    }

    /// Supplies the persisted first-validated-use timestamp that anchors
    /// the floating expiration clock.
    #[must_use]
    pub fn first_use(mut self, timestamp: DateTime<Utc>) -> Self {
        self.first_use = Some(timestamp);
        self
    }

    /// Supplies the local machine's hardware addresses for the hardware
    /// test. Addresses are normalized the same way as the license's own.
    #[must_use]
    pub fn local_hardware_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.local_addresses = addresses
            .into_iter()
            .map(|a| normalize_hardware_address(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    /// The license under validation.
    #[must_use]
    pub fn license(&self) -> &License {
        &self.license
    }

    /// Runs every test and returns the aggregated report. All tests
    /// always execute; results are collected in execution order.
    #[must_use]
    pub fn validate(&self, now: DateTime<Utc>) -> LicenseState {
        let results = ValidationTest::ALL
            .iter()
            .map(|&test| TestResult {
                test,
                passed: self.run(test, now),
            })
            .collect();
        LicenseState::new(results)
    }

    /// Like [`Validator::validate`], but surfaces an invalid license as
    /// an error that still embeds the full report.
    pub fn checked_validate(&self, now: DateTime<Utc>) -> Result<LicenseState, ValidationFailure> {
        let state = self.validate(now);
        if state.is_valid() {
            Ok(state)
        } else {
            Err(ValidationFailure { state })
        }
    }

    /// How long the license remains valid from `now`: the smaller of the
    /// calendar bound and the started floating bound. `None` when neither
    /// bound applies. Non-positive for an already expired license, never
    /// an error.
    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let calendar = self.license.expiration_date().map(|expiry| expiry - now);
        let floating = match (self.license.floating_expiry(), self.first_use) {
            (Some(period), Some(first)) => {
                floating_deadline(first, period).map(|deadline| deadline - now)
            }
            _ => None,
        };
        match (calendar, floating) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    fn run(&self, test: ValidationTest, now: DateTime<Utc>) -> bool {
        match test {
            ValidationTest::Signature => self.check_signature(),
            ValidationTest::StartDate => self.check_start_date(now),
            ValidationTest::Expiration => self.check_expiration(now),
            ValidationTest::FloatingExpiration => self.check_floating_expiration(now),
            ValidationTest::Hardware => self.check_hardware(),
        }
    }

    fn check_signature(&self) -> bool {
        let Some(bytes) = self.license.signature() else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(bytes) else {
            return false;
        };
        self.verifying_key
            .verify(&self.license.canonical_payload(), &signature)
    }

    fn check_start_date(&self, now: DateTime<Utc>) -> bool {
        self.license.start_date().is_none_or(|start| now >= start)
    }

    fn check_expiration(&self, now: DateTime<Utc>) -> bool {
        self.license
            .expiration_date()
            .is_none_or(|expiry| now <= expiry)
    }

    fn check_floating_expiration(&self, now: DateTime<Utc>) -> bool {
        if self.ignore_float_time {
            return true;
        }
        let Some(period) = self.license.floating_expiry() else {
            return true;
        };
        // Without a recorded first use the floating clock has not
        // started, so the period cannot have elapsed.
        let Some(first) = self.first_use else {
            return true;
        };
        floating_deadline(first, period).is_none_or(|deadline| now <= deadline)
    }

    fn check_hardware(&self) -> bool {
        let locked = self.license.hardware_addresses();
        locked.is_empty() || self.local_addresses.iter().any(|a| locked.contains(a))
    }
}

/// First use plus the floating period. `None` on overflow, meaning a
/// deadline too far out to ever bind.
fn floating_deadline(first_use: DateTime<Utc>, period_ms: i64) -> Option<DateTime<Utc>> {
    first_use.checked_add_signed(Duration::milliseconds(period_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_stable() {
        let names: Vec<&str> = ValidationTest::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            ["Signature", "Start Date", "Expiration", "Floating Expiration", "Hardware"]
        );
    }

    #[test]
    fn state_validity_is_conjunction() {
        let all_passed = LicenseState::new(
            ValidationTest::ALL
                .iter()
                .map(|&test| TestResult { test, passed: true })
                .collect(),
        );
        assert!(all_passed.is_valid());

        let one_failed = LicenseState::new(
            ValidationTest::ALL
                .iter()
                .map(|&test| TestResult {
                    test,
                    passed: test != ValidationTest::Hardware,
                })
                .collect(),
        );
        assert!(!one_failed.is_valid());
        assert!(one_failed.passed(ValidationTest::Signature));
        assert!(!one_failed.passed(ValidationTest::Hardware));
    }
}
