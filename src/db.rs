pub mod user_repo;
pub use user_repo::UserRepository;
pub mod session_repo;
pub use session_repo::SessionRepository;
pub mod directory_repo;
pub use directory_repo::{BranchDirectory, DirectoryRepository};
pub mod scope_repo;
pub use scope_repo::{ScopeSelectionRepository, ScopeSelectionStore};
pub mod metrics_repo;
pub use metrics_repo::{BranchMetricsSource, MetricsRepository};
