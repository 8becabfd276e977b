//! Route paths, shared by the router and the integration tests.

pub const GET_API_HEALTH: &str = "/api/health";
pub const POST_API_SEED: &str = "/api/seed";

pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const POST_AUTH_LOGOUT: &str = "/api/auth/logout";
pub const GET_AUTH_SESSION: &str = "/api/auth/session";

pub const APPOINTMENTS: &str = "/api/appointments";
pub const APPOINTMENTS_ID: &str = "/api/appointments/{id}";

pub const INVENTORY: &str = "/api/inventory";
pub const INVENTORY_ID: &str = "/api/inventory/{id}";

pub const INVOICES: &str = "/api/invoices";
pub const INVOICES_ID: &str = "/api/invoices/{id}";

pub const TREATMENTS: &str = "/api/treatments";

pub const GET_DASHBOARD_STATS: &str = "/api/dashboard/stats";

pub const USERS: &str = "/api/users";
pub const USERS_ID: &str = "/api/users/{id}";

pub const PAGE_HOME: &str = "/";
pub const PAGE_LOGIN: &str = "/auth/login";
pub const PAGE_REGISTER: &str = "/auth/register";
pub const STATIC: &str = "/static";
