pub mod banner_service;
pub mod community_service;
pub mod employment_service;
pub mod profile_service;
pub mod senior_project_service;
pub mod user_service;

pub use banner_service::BannerService;
pub use community_service::CommunityService;
pub use employment_service::EmploymentService;
pub use profile_service::ProfileService;
pub use senior_project_service::SeniorProjectService;
pub use user_service::UserService;
