//! Patient records and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal primary key for a patient record, based on UUIDv7
///
/// Distinct from the user-facing [`PatientId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatientKey(u128);

impl PatientKey {
    /// Generate a new UUIDv7-based key
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a key from a raw u128 value (storage deserialization)
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a key from its UUID string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid patient key: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for PatientKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Short patient identifier, e.g. `ANA071234`
///
/// Three letters from the patient's name (uppercased, padded with `X`),
/// the age as two digits, and a four-digit suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

/// Length of a well-formed PID
pub const PID_LEN: usize = 9;

impl PatientId {
    /// Derive a PID from name, age and suffix
    ///
    /// Only ASCII letters of the name count. Ages above 99 keep their last
    /// two digits; suffixes keep their last four.
    ///
    /// # Examples
    ///
    /// ```
    /// use medgraph_domain::PatientId;
    ///
    /// assert_eq!(PatientId::derive("Ana", 7, 1234).as_str(), "ANA071234");
    /// assert_eq!(PatientId::derive("Li", 42, 5).as_str(), "LIX420005");
    /// ```
    pub fn derive(name: &str, age: u32, suffix: u32) -> Self {
        let mut prefix: String = name
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .take(3)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        while prefix.len() < 3 {
            prefix.push('X');
        }
        Self(format!("{}{:02}{:04}", prefix, age % 100, suffix % 10_000))
    }

    /// Parse and validate a PID string (case-insensitive letters)
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.len() != PID_LEN || !s.is_ascii() {
            return Err(format!("PID '{}' must be {} ASCII characters", s, PID_LEN));
        }
        let (letters, digits) = s.split_at(3);
        if !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("PID '{}' must start with three letters", s));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("PID '{}' must end with six digits", s));
        }
        Ok(Self(format!("{}{}", letters.to_ascii_uppercase(), digits)))
    }

    /// The PID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A patient record
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    /// Internal primary key
    pub key: PatientKey,

    /// User-facing identifier
    pub pid: PatientId,

    /// Full name
    pub name: String,

    /// Age in years
    pub age: u32,

    /// Creation timestamp (seconds since Unix epoch)
    pub created_at: u64,
}

impl Patient {
    /// Create a new patient record with a fresh key
    pub fn new(pid: PatientId, name: impl Into<String>, age: u32, created_at: u64) -> Self {
        Self {
            key: PatientKey::new(),
            pid,
            name: name.into(),
            age,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_pid() {
        assert_eq!(PatientId::derive("Ana", 7, 1234).as_str(), "ANA071234");
        assert_eq!(PatientId::derive("robert", 65, 42).as_str(), "ROB650042");
    }

    #[test]
    fn test_derive_pads_short_names() {
        assert_eq!(PatientId::derive("Al", 30, 1).as_str(), "ALX300001");
        assert_eq!(PatientId::derive("", 30, 1).as_str(), "XXX300001");
    }

    #[test]
    fn test_derive_skips_non_letters() {
        assert_eq!(PatientId::derive("O'Neil", 50, 9999).as_str(), "ONE509999");
        assert_eq!(PatientId::derive("  jo ann", 8, 10).as_str(), "JOA080010");
    }

    #[test]
    fn test_derive_wraps_age_and_suffix() {
        assert_eq!(PatientId::derive("Eve", 104, 12345).as_str(), "EVE042345");
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(PatientId::parse("ana071234").unwrap().as_str(), "ANA071234");
        assert!(PatientId::parse("AN071234").is_err());
        assert!(PatientId::parse("ANA07123X").is_err());
        assert!(PatientId::parse("A1A071234").is_err());
    }

    #[test]
    fn test_derived_pid_parses() {
        let pid = PatientId::derive("Zoë", 3, 77);
        assert_eq!(PatientId::parse(pid.as_str()).unwrap(), pid);
    }

    #[test]
    fn test_patient_key_display_and_parse() {
        let key = PatientKey::new();
        let parsed = PatientKey::from_string(&key.to_string()).unwrap();
        assert_eq!(key, parsed);
        assert!(PatientKey::from_string("nope").is_err());
    }
}
