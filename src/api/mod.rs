pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;

/// Reject empty or whitespace-only input fields
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
