//! Status codes returned by fallible engine operations.
//!
//! Negative values are failures, zero and positive values are success or
//! informational. Known codes carry a description for error reports;
//! unknown ones are still reported, just without a name.

/// A status code from an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    /// Success.
    pub const OK: Self = Self(0);
    /// Unspecified failure.
    pub const FAIL: Self = Self(-1);
    /// A parameter was invalid.
    pub const INVALID_PARAM: Self = Self(-100_000);
    /// The operation is not supported.
    pub const NOT_SUPPORTED: Self = Self(-100_001);
    /// Out of memory.
    pub const NO_MEM: Self = Self(-100_002);
    /// A fixed limit was reached.
    pub const LIMIT: Self = Self(-100_003);
    /// The requested item does not exist.
    pub const NOT_FOUND: Self = Self(-100_004);
    /// The operation timed out.
    pub const TIMED_OUT: Self = Self(-100_005);
    /// The object is in the wrong state for this operation.
    pub const LOGIC: Self = Self(-100_006);
    /// A file could not be opened or accessed.
    pub const FILE_ACCESS: Self = Self(-100_100);
    /// A file was not found.
    pub const FILE_NOT_FOUND: Self = Self(-100_101);
    /// A read or write ended early.
    pub const IO: Self = Self(-100_102);
    /// Data is corrupt.
    pub const CORRUPTED: Self = Self(-100_103);

    const DESCRIPTIONS: &'static [(ErrorCode, &'static str)] = &[
        (Self::OK, "no error reported here"),
        (Self::FAIL, "function failed (no details available)"),
        (Self::INVALID_PARAM, "invalid function argument"),
        (Self::NOT_SUPPORTED, "function not supported"),
        (Self::NO_MEM, "not enough memory"),
        (Self::LIMIT, "fixed limit exceeded"),
        (Self::NOT_FOUND, "item not found"),
        (Self::TIMED_OUT, "timed out"),
        (Self::LOGIC, "logic error in code"),
        (Self::FILE_ACCESS, "insufficient access rights to open file"),
        (Self::FILE_NOT_FOUND, "file not found"),
        (Self::IO, "error during IO"),
        (Self::CORRUPTED, "data is corrupted"),
    ];

    /// Whether this code signals failure.
    pub const fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// Description of a known code.
    pub fn known_description(self) -> Option<&'static str> {
        Self::DESCRIPTIONS
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, desc)| *desc)
    }

    /// Description for error reports; unknown codes are described by number.
    pub fn description(self) -> String {
        match self.known_description() {
            Some(desc) => desc.to_string(),
            None => format!("Unknown error ({})", self.0),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        Self(code)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        Self(code as i64)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
