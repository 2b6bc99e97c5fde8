//! Main coordination logic

pub mod approvals;
pub mod assembler;
pub mod correlation;
pub mod processor;
pub mod protection;
pub mod reviews;

pub use approvals::{extract_approvals, DeploymentOutcome};
pub use assembler::ReportAssembler;
pub use correlation::ActorTimeWindow;
pub use processor::AuditProcessor;
pub use protection::{Protection, ProtectionResolver};
pub use reviews::{ReviewSummary, RunReviewFetcher};
