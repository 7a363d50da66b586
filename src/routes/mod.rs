pub mod health;
pub mod login;
pub mod plans;
pub mod register;
pub mod subscription;
pub mod user;

pub use health::health_check;
pub use login::login_user;
pub use plans::{
    create_plan, delete_plan, get_plan, list_public_plans, list_shared_plans, list_user_plans,
    share_plan, unshare_plan, update_plan,
};
pub use register::register_user;
pub use subscription::{cancel_subscription, update_subscription};
pub use user::{delete_user, get_user};
