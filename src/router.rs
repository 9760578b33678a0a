use std::fmt;

use crate::session::AuthContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
    Register,
    Submit,
    Modules,
    Student(i64),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Dashboard => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Submit => "/submit".to_string(),
            Route::Modules => "/myModules".to_string(),
            Route::Student(id) => format!("/students/{id}"),
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Where a request for `route` actually lands given the current session.
pub fn guard(route: Route, auth: Option<&AuthContext>) -> Route {
    match (auth.is_some(), route.is_protected()) {
        (false, true) => Route::Login,
        (true, false) => Route::Dashboard,
        _ => route,
    }
}

/// Records navigation events in order.
#[derive(Debug, Default)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(route = %route, "navigate");
        self.history.push(route);
    }

    pub fn current(&self) -> Option<&Route> {
        self.history.last()
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }
}
