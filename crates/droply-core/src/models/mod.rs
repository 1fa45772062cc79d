pub mod plan;
pub mod recipient;
pub mod transfer;
pub mod user;

pub use plan::{PlanLimits, PlanTier};
pub use recipient::Recipient;
pub use transfer::{FileObject, Transfer, TransferEvent, TransferEventType, TransferStatus};
pub use user::{Branding, User};
