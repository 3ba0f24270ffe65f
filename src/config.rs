//! Compilation options, carried into the compiled schema.
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ------------------------------- Policy ---------------------------------- //

// serde_json's own nesting limit for parsed text
const DEFAULT_MAX_DEPTH: usize = 128;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Which JSON numbers satisfy `"type": "number"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberPolicy {
    /// Only floating-point literals (`1.0`, `2.5`); `1` is an integer, not a number.
    #[default]
    Strict,
    /// Any JSON number.
    Lenient,
}

/// Which keywords are enforced at validation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assertions {
    /// Types, composition, enum, object and array structure. Numeric and string
    /// range keywords only drive type inference.
    #[default]
    Structural,
    /// Structural plus `minLength`/`maxLength`/`pattern` and the numeric range keywords.
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CompileOptions {
    pub number_policy: NumberPolicy,
    pub assertions: Assertions,
    /// Cap on schema nesting while compiling and on recursion while validating.
    pub max_depth: usize,
    #[serde(with = "millis")]
    pub fetch_timeout: Duration,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            number_policy: NumberPolicy::default(),
            assertions: Assertions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
        }
    }
}

impl CompileOptions {
    pub fn number_policy(mut self, policy: NumberPolicy) -> Self {
        self.number_policy = policy;
        self
    }
    pub fn assertions(mut self, assertions: Assertions) -> Self {
        self.assertions = assertions;
        self
    }
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

mod millis {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
