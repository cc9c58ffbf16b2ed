//! Protocol status codes.
//!
//! Numeric values follow the OPC UA status code table so clients can tell
//! rejection reasons apart without string matching.

use serde::{Deserialize, Serialize};

/// Result code of a read, write or address-space operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const GOOD: Self = Self(0x0000_0000);
    pub const BAD_INTERNAL_ERROR: Self = Self(0x8002_0000);
    pub const BAD_WAITING_FOR_INITIAL_DATA: Self = Self(0x8032_0000);
    pub const BAD_NODE_ID_INVALID: Self = Self(0x8033_0000);
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    pub const BAD_INDEX_RANGE_INVALID: Self = Self(0x8036_0000);
    pub const BAD_NOT_READABLE: Self = Self(0x803A_0000);
    pub const BAD_NOT_WRITABLE: Self = Self(0x803B_0000);
    pub const BAD_OUT_OF_RANGE: Self = Self(0x803C_0000);
    pub const BAD_NOT_FOUND: Self = Self(0x803E_0000);
    pub const BAD_PARENT_NODE_ID_INVALID: Self = Self(0x805B_0000);
    pub const BAD_NODE_ID_EXISTS: Self = Self(0x805E_0000);
    pub const BAD_NODE_CLASS_INVALID: Self = Self(0x805F_0000);
    pub const BAD_BROWSE_NAME_DUPLICATED: Self = Self(0x8061_0000);
    pub const BAD_TYPE_DEFINITION_INVALID: Self = Self(0x8063_0000);
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    pub const BAD_INVALID_ARGUMENT: Self = Self(0x80AB_0000);

    pub fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    pub fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Symbolic name, or `Unknown` for codes outside the table above.
    pub fn name(self) -> &'static str {
        match self {
            Self::GOOD => "Good",
            Self::BAD_INTERNAL_ERROR => "BadInternalError",
            Self::BAD_WAITING_FOR_INITIAL_DATA => "BadWaitingForInitialData",
            Self::BAD_NODE_ID_INVALID => "BadNodeIdInvalid",
            Self::BAD_NODE_ID_UNKNOWN => "BadNodeIdUnknown",
            Self::BAD_INDEX_RANGE_INVALID => "BadIndexRangeInvalid",
            Self::BAD_NOT_READABLE => "BadNotReadable",
            Self::BAD_NOT_WRITABLE => "BadNotWritable",
            Self::BAD_OUT_OF_RANGE => "BadOutOfRange",
            Self::BAD_NOT_FOUND => "BadNotFound",
            Self::BAD_PARENT_NODE_ID_INVALID => "BadParentNodeIdInvalid",
            Self::BAD_NODE_ID_EXISTS => "BadNodeIdExists",
            Self::BAD_NODE_CLASS_INVALID => "BadNodeClassInvalid",
            Self::BAD_BROWSE_NAME_DUPLICATED => "BadBrowseNameDuplicated",
            Self::BAD_TYPE_DEFINITION_INVALID => "BadTypeDefinitionInvalid",
            Self::BAD_TYPE_MISMATCH => "BadTypeMismatch",
            Self::BAD_INVALID_ARGUMENT => "BadInvalidArgument",
            _ => "Unknown",
        }
    }

    /// Turn a status into a `Result`, `Ok` for every good code.
    pub fn into_result(self) -> Result<(), StatusCode> {
        if self.is_good() { Ok(()) } else { Err(self) }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::GOOD
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.0)
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StatusCode({})", self.name())
    }
}

impl std::error::Error for StatusCode {}

impl From<Result<(), StatusCode>> for StatusCode {
    fn from(result: Result<(), StatusCode>) -> Self {
        match result {
            Ok(()) => StatusCode::GOOD,
            Err(code) => code,
        }
    }
}
