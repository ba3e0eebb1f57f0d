use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::progress::ProgressResponse;
use crate::schemas::user::UserResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LinkStudentRequest {
    #[validate(length(min = 1, message = "student_username must not be empty"))]
    pub(crate) student_username: String,
    #[validate(email(message = "student_email must be a valid address"))]
    pub(crate) student_email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChildResponse {
    pub(crate) child: UserResponse,
    pub(crate) progress: Vec<ProgressResponse>,
}
