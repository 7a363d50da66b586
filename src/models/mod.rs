pub mod api;
pub mod outcome;
pub mod plan;
pub mod snapshot;
pub mod user;

pub use outcome::{ErrorKind, Failure, Outcome};
pub use plan::{AccessLevel, PlanRecord, PlanUpdate, ShareGrant, SharedPlanView};
pub use snapshot::Snapshot;
pub use user::{PublicUser, Subscription, UserFragment, UserRecord, UserTable};
