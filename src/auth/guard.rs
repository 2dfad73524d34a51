use crate::error::ApiError;
use crate::users::model::{Role, User};

/// Role check for an already-authenticated identity. Runs after the protect
/// extractor has resolved the user.
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".into(),
        ))
    }
}
