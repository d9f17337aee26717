//! The API endpoint URIs.

/// The health probe.
pub const HEALTH: &str = "/health";
/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in an existing user.
pub const LOG_IN: &str = "/auth/login";
/// The route for reading, updating and deleting the current user.
pub const ME: &str = "/auth/me";
/// The route for creating (or returning) an anonymous guest profile.
pub const PROFILES: &str = "/profile";
/// The route for looking up a guest profile by username.
pub const PROFILE: &str = "/profile/:username";
/// The route for listing and creating the current user's transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for updating and deleting a single transaction.
pub const TRANSACTION: &str = "/transactions/:transaction_id";
/// The route for the fixed category catalog.
pub const CATEGORIES: &str = "/transactions/categories";
/// The route for the current user's financial summary.
pub const SUMMARY: &str = "/transactions/summary";
/// The route for listing the current user's notifications.
pub const NOTIFICATIONS: &str = "/notifications";
/// The route for marking a single notification as read.
pub const NOTIFICATION_READ: &str = "/notifications/:notification_id/read";
/// The route for marking all of the current user's notifications as read.
pub const NOTIFICATIONS_READ_ALL: &str = "/notifications/read-all";
/// The route for the mocked mobile-money top-up.
pub const TELEBIRR_PAY: &str = "/telebirr/pay";
/// The route for charging the premium insights fee to the wallet.
pub const TELEBIRR_AI_PAY: &str = "/telebirr/ai/pay";
/// The route for AI-generated financial tips.
pub const AI_TIPS: &str = "/ai/tips";
/// The route for the per-month category breakdown report.
pub const MONTHLY_REPORT: &str = "/reports/monthly";
