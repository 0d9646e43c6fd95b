mod escrow;
mod notifications;
mod projects;
mod proposals;

pub use escrow::EscrowService;
pub use notifications::NotificationService;
pub use projects::ProjectService;
pub use proposals::ProposalService;
