pub mod auth;
pub mod response;
pub mod view_count;

pub use auth::{optional_user, require_access, require_refresh, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use view_count::{board_content_view, job_posting_view, senior_project_view};
