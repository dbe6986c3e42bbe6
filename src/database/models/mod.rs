pub mod banner;
pub mod board;
pub mod category;
pub mod posting;
pub mod profile;
pub mod project;
pub mod user;

pub use banner::Banner;
pub use board::{BoardContentRow, CommentRow};
pub use category::Lookup;
pub use posting::{JobPostingDetailRow, JobPostingListRow, PostingOwner};
pub use profile::ProfileRow;
pub use project::{SeniorProjectRow, TeamMemberRow};
pub use user::{AdminSummary, StudentSummary, User};
