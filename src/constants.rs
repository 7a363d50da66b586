/// Minimum password length, counted in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Liveness probe bound (1 second)
pub const PROBE_TIMEOUT_MS: u64 = 1_000;

/// Bound for every data call to the backend (3 seconds)
pub const REQUEST_TIMEOUT_MS: u64 = 3_000;

/// Default port of the backend, same as the static pages expect
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Snapshot schema version written into the backend file
pub const SNAPSHOT_API_VERSION: &str = "1.0";

// =============================================================================
// Local Mirror Keys
// =============================================================================

/// Namespaced key holding the mirrored user array
pub const MIRROR_USERS_KEY: &str = "aiwallet_users";

pub const SESSION_USER_ID_KEY: &str = "userId";
pub const SESSION_USERNAME_KEY: &str = "username";
pub const SESSION_EMAIL_KEY: &str = "email";
pub const SESSION_USER_PLAN_KEY: &str = "userPlan";
pub const SESSION_PLAN_PURCHASE_DATE_KEY: &str = "planPurchaseDate";

// =============================================================================
// Messages
// =============================================================================

pub const MSG_ALL_FIELDS_REQUIRED: &str = "All fields are required";
pub const MSG_LOGIN_FIELDS_REQUIRED: &str = "Email/Username and password are required";
pub const MSG_USER_EXISTS: &str = "User already exists";
pub const MSG_WEAK_PASSWORD: &str = "Password must be at least 8 characters";
pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_INVALID_PASSWORD: &str = "Invalid password";
pub const MSG_REGISTERED: &str = "Registration successful";
pub const MSG_LOGGED_IN: &str = "Login successful";
pub const MSG_SUBSCRIPTION_UPDATED: &str = "Subscription updated";
pub const MSG_SUBSCRIPTION_CANCELLED: &str = "Subscription cancelled";
pub const MSG_ACCOUNT_DELETED: &str = "Account and all associated plans deleted";

pub const MSG_PLAN_NOT_FOUND: &str = "Plan not found";
pub const MSG_PLAN_CREATED: &str = "Plan created";
pub const MSG_PLAN_DELETED: &str = "Plan deleted";
pub const MSG_PLAN_SHARED: &str = "Plan shared";
pub const MSG_PLAN_UNSHARED: &str = "Plan unshared";
pub const MSG_SHARE_TARGET_NOT_FOUND: &str = "User with this email not found";
pub const MSG_NOT_PLAN_OWNER: &str = "You do not own this plan";
pub const MSG_ALREADY_SHARED: &str = "Plan already shared with this user";
pub const MSG_PLAN_NAME_REQUIRED: &str = "Plan name is required";

pub const MSG_INTERNAL: &str = "Internal server error";
