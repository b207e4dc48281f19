//! Screen routes and the access rules in front of them.

use core::fmt;

use casedesk_auth::{Capabilities, Capability};
use casedesk_core::{CaseId, ClientId, FoiaCaseId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Unauthenticated root (login).
    Root,
    Register,
    Dashboard,
    Clients,
    ClientDetails(ClientId),
    EditClient(ClientId),
    Cases,
    CaseDetails(CaseId),
    Documents,
    FoiaCases,
    FoiaCaseDetails(FoiaCaseId),
    Questionnaires,
    Billing,
    Company,
    Superadmin,
    Profile,
    NotFound,
}

/// What to do with a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect(Route),
    /// Render the "Access Denied" panel in place of the screen.
    Denied,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Clients => "/clients".to_string(),
            Route::ClientDetails(id) => format!("/clients/{id}"),
            Route::EditClient(id) => format!("/clients/{id}/edit"),
            Route::Cases => "/cases".to_string(),
            Route::CaseDetails(id) => format!("/cases/{id}"),
            Route::Documents => "/documents".to_string(),
            Route::FoiaCases => "/foia-cases".to_string(),
            Route::FoiaCaseDetails(id) => format!("/foia-cases/{id}"),
            Route::Questionnaires => "/questionnaires".to_string(),
            Route::Billing => "/billing".to_string(),
            Route::Company => "/company".to_string(),
            Route::Superadmin => "/superadmin".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Match a location path; anything unknown is `NotFound`.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Root,
            ["register"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            ["clients"] => Route::Clients,
            ["clients", id] => Route::ClientDetails(ClientId::new(*id)),
            ["clients", id, "edit"] => Route::EditClient(ClientId::new(*id)),
            ["cases"] => Route::Cases,
            ["cases", id] => Route::CaseDetails(CaseId::new(*id)),
            ["documents"] => Route::Documents,
            ["foia-cases"] => Route::FoiaCases,
            ["foia-cases", id] => Route::FoiaCaseDetails(FoiaCaseId::new(*id)),
            ["questionnaires"] => Route::Questionnaires,
            ["billing"] => Route::Billing,
            ["company"] => Route::Company,
            ["superadmin"] => Route::Superadmin,
            ["profile"] => Route::Profile,
            _ => Route::NotFound,
        }
    }

    /// Reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Root | Route::Register)
    }

    /// Roles allowed in; empty means any authenticated user.
    pub fn required_capabilities(&self) -> &'static [Capability] {
        match self {
            Route::Clients | Route::ClientDetails(_) | Route::EditClient(_) | Route::Cases | Route::CaseDetails(_) => {
                &[Capability::Attorney, Capability::Paralegal]
            }
            Route::Billing | Route::Company => &[Capability::Attorney],
            Route::Superadmin => &[Capability::Superadmin],
            Route::Questionnaires => &[Capability::Client, Capability::Attorney, Capability::Paralegal],
            _ => &[],
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Decide a navigation for a session with `capabilities` (`None` = anonymous).
///
/// Public routes bounce a logged-in user to the dashboard; private routes
/// bounce an anonymous one to root; role gates deny in place.
pub fn guard(route: &Route, capabilities: Option<&Capabilities>) -> AccessDecision {
    if *route == Route::NotFound {
        return AccessDecision::Allow;
    }
    match (route.is_public(), capabilities) {
        (true, Some(_)) => AccessDecision::Redirect(Route::Dashboard),
        (true, None) => AccessDecision::Allow,
        (false, None) => AccessDecision::Redirect(Route::Root),
        (false, Some(caps)) => {
            if caps.allows_any(route.required_capabilities()) {
                AccessDecision::Allow
            } else {
                AccessDecision::Denied
            }
        }
    }
}
