//! Uniform result envelope

use serde::{Deserialize, Serialize};

use cf_console_provider::ApiMessage;

use crate::error::{CoreError, CoreResult};

/// Outcome of one gateway call, shaped like the upstream envelope.
///
/// `success` implies `errors` is empty; a failure carries at least one error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord<T> {
    pub success: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

impl<T> ResourceRecord<T> {
    /// Success with a payload
    #[must_use]
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: Vec::new(),
        }
    }

    /// Success without a payload (deletes, cache purges without a body)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            success: true,
            result: None,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn failure(err: &CoreError) -> Self {
        Self {
            success: false,
            result: None,
            errors: err.to_messages(),
        }
    }

    #[must_use]
    pub fn from_result(result: CoreResult<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::success(value),
            Ok(None) => Self::empty(),
            Err(e) => Self::failure(&e),
        }
    }

    /// Code of the first error, if the call failed
    #[must_use]
    pub fn first_error_code(&self) -> Option<i64> {
        self.errors.first().map(|e| e.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_has_no_errors() {
        let record = ResourceRecord::success(1);
        assert!(record.success);
        assert!(record.errors.is_empty());
        assert_eq!(record.result, Some(1));
    }

    #[test]
    fn failure_carries_error_code() {
        let record: ResourceRecord<u8> = ResourceRecord::failure(&CoreError::NoCurrentAccount);
        assert!(!record.success);
        assert_eq!(record.result, None);
        assert_eq!(record.first_error_code(), Some(CoreError::NoCurrentAccount.code()));
    }

    #[test]
    fn from_empty_ok() {
        let record: ResourceRecord<u8> = ResourceRecord::from_result(Ok(None));
        assert!(record.success);
        assert!(record.result.is_none());
    }
}
