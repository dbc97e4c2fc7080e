//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use sdw_core::domain::DomainError;
use sdw_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SYSTEM_ERROR: i32 = 5002;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Validation(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::NotFound(msg) => ErrorObjectOwned::owned(code::NOT_FOUND, msg, None::<()>),
        AppError::InvalidState(msg) => ErrorObjectOwned::owned(code::CONFLICT, msg, None::<()>),
        AppError::Domain(e) => match e {
            DomainError::JobNotFound(_) => {
                ErrorObjectOwned::owned(code::NOT_FOUND, e.to_string(), None::<()>)
            }
            DomainError::ValidationError(_) => {
                ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
            }
            DomainError::InvalidStateTransition { .. } | DomainError::NoPendingPrompt(_) => {
                ErrorObjectOwned::owned(code::CONFLICT, e.to_string(), None::<()>)
            }
        },
        AppError::Execution(e) => {
            ErrorObjectOwned::owned(code::SYSTEM_ERROR, e.to_string(), None::<()>)
        }
        AppError::Io(e) => ErrorObjectOwned::owned(code::SYSTEM_ERROR, e.to_string(), None::<()>),
        AppError::Serialization(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::Config(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
        AppError::Internal(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
    }
}

/// Standard throttling error
pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_4001() {
        let err = to_rpc_error(AppError::NotFound("Job x not found".to_string()));
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[test]
    fn invalid_state_maps_to_conflict() {
        let err = to_rpc_error(AppError::InvalidState("busy".to_string()));
        assert_eq!(err.code(), code::CONFLICT);
    }

    #[test]
    fn domain_transition_maps_to_conflict() {
        let err = to_rpc_error(AppError::Domain(DomainError::InvalidStateTransition {
            from: "completed".to_string(),
            to: "completing".to_string(),
        }));
        assert_eq!(err.code(), code::CONFLICT);
    }
}
