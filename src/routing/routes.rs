use crate::identity::Role;

/// Every view the client can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Search,
    Login,
    Register,
    EmailVerified,
    AuthAction,
    VendorProfile { id: String },
    CustomerProfile,
    CustomerCoins,
    CustomerAppointments,
    VendorDashboard,
    VendorOffers,
    VendorCalendar,
    VendorSettings,
    Admin,
    NotFound { path: String },
}

/// Who may render a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Any signed-in session, role known or not.
    Authenticated,
    /// Signed in with a known role from the list.
    Roles(&'static [Role]),
}

const VENDOR_ROLES: &[Role] = &[Role::Vendor, Role::Admin];
const ADMIN_ROLES: &[Role] = &[Role::Admin];

impl Route {
    /// Match a location (path, optionally with query or fragment) against the route table.
    pub fn parse(location: &str) -> Route {
        let path = location.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        match path {
            "/" => Route::Home,
            "/search" => Route::Search,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/email-verified" => Route::EmailVerified,
            "/auth/action" => Route::AuthAction,
            "/customer/profile" => Route::CustomerProfile,
            "/customer/coins" => Route::CustomerCoins,
            "/customer/appointments" => Route::CustomerAppointments,
            "/vendor-dashboard" => Route::VendorDashboard,
            "/vendor-offers" => Route::VendorOffers,
            "/vendor-calendar" => Route::VendorCalendar,
            "/vendor-settings" => Route::VendorSettings,
            "/admin" => Route::Admin,
            other => match other.strip_prefix("/vendor/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::VendorProfile { id: id.to_string() },
                _ => Route::NotFound { path: other.to_string() },
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Search => "/search".into(),
            Route::Login => "/login".into(),
            Route::Register => "/register".into(),
            Route::EmailVerified => "/email-verified".into(),
            Route::AuthAction => "/auth/action".into(),
            Route::VendorProfile { id } => format!("/vendor/{}", id),
            Route::CustomerProfile => "/customer/profile".into(),
            Route::CustomerCoins => "/customer/coins".into(),
            Route::CustomerAppointments => "/customer/appointments".into(),
            Route::VendorDashboard => "/vendor-dashboard".into(),
            Route::VendorOffers => "/vendor-offers".into(),
            Route::VendorCalendar => "/vendor-calendar".into(),
            Route::VendorSettings => "/vendor-settings".into(),
            Route::Admin => "/admin".into(),
            Route::NotFound { path } => path.clone(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::CustomerProfile | Route::CustomerCoins | Route::CustomerAppointments => Access::Authenticated,
            Route::VendorDashboard | Route::VendorOffers | Route::VendorCalendar | Route::VendorSettings => Access::Roles(VENDOR_ROLES),
            Route::Admin => Access::Roles(ADMIN_ROLES),
            _ => Access::Public,
        }
    }

    /// Where a user with `role` lands after signing in.
    pub fn home_for(role: Option<Role>) -> Route {
        match role {
            Some(Role::Vendor) => Route::VendorDashboard,
            _ => Route::Home,
        }
    }
}
