use serde::Serialize;

use crate::schemas::assignment::AssignmentResponse;
use crate::schemas::course::CourseResponse;
use crate::schemas::family::ChildResponse;
use crate::schemas::progress::ProgressResponse;

/// Role-routed dashboard payload; the `role` tag tells the client which
/// variant it received.
#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub(crate) enum DashboardResponse {
    Teacher { courses: Vec<CourseResponse> },
    Student { assignments: Vec<AssignmentResponse>, progress: Vec<ProgressResponse> },
    Parent { children: Vec<ChildResponse> },
}
