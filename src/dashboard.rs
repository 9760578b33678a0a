use crate::api::StudentApi;
use crate::error::DashboardError;
use crate::models::{Aggregate, Module, ModuleFilterOption, RosterRow, StudentRecord};
use crate::roster;
use crate::router::{Navigator, Route};
use crate::session::AuthContext;
use crate::view::{self, ViewState};

/// Dashboard state. The roster and the module options are each written only
/// by their own fetch; results tagged with an older session generation are dropped.
#[derive(Debug, Default)]
pub struct DashboardState {
    roster: Vec<RosterRow>,
    module_options: Vec<ModuleFilterOption>,
    pub view: ViewState,
    live_generation: Option<u64>,
    session_expired: bool,
    notices: Vec<String>,
}

impl DashboardState {
    pub fn begin_session(&mut self, auth: &AuthContext) {
        self.live_generation = Some(auth.generation);
        self.session_expired = false;
    }

    pub fn roster(&self) -> &[RosterRow] {
        &self.roster
    }

    pub fn module_options(&self) -> &[ModuleFilterOption] {
        &self.module_options
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    pub fn visible(&self) -> Vec<RosterRow> {
        view::view(&self.roster, &self.view)
    }

    pub fn aggregate(&self) -> Aggregate {
        roster::aggregate(&self.roster)
    }

    fn is_live(&self, generation: u64) -> bool {
        self.live_generation == Some(generation)
    }

    fn expire(&mut self, navigator: &mut Navigator) {
        tracing::info!("session expired, redirecting to login");
        self.roster.clear();
        self.module_options.clear();
        self.live_generation = None;
        self.session_expired = true;
        navigator.navigate(Route::Login);
    }

    /// Returns whether the result was applied.
    pub fn apply_roster(
        &mut self,
        generation: u64,
        result: Result<Vec<StudentRecord>, DashboardError>,
        navigator: &mut Navigator,
    ) -> bool {
        if !self.is_live(generation) {
            tracing::debug!(generation, "discarding roster from stale session");
            return false;
        }
        match result {
            Ok(records) => {
                self.roster = roster::project(&records);
                tracing::info!(rows = self.roster.len(), "roster replaced");
            }
            Err(DashboardError::SessionExpired) => self.expire(navigator),
            Err(error) => {
                tracing::warn!(%error, "roster fetch failed");
                self.roster.clear();
                self.notices.push(format!("Failed to load students: {error}"));
            }
        }
        true
    }

    pub fn apply_modules(
        &mut self,
        generation: u64,
        result: Result<Vec<Module>, DashboardError>,
        navigator: &mut Navigator,
    ) -> bool {
        if !self.is_live(generation) {
            tracing::debug!(generation, "discarding modules from stale session");
            return false;
        }
        match result {
            Ok(modules) => {
                self.module_options = roster::module_filter_options(&modules);
            }
            Err(DashboardError::SessionExpired) => self.expire(navigator),
            Err(error) => {
                tracing::warn!(%error, "module fetch failed");
                self.notices.push(format!("Failed to fetch modules: {error}"));
            }
        }
        true
    }

    /// Loads roster and module options concurrently. Failures end up in the
    /// state and the navigator, never as an error to the caller.
    pub async fn refresh<A: StudentApi>(
        &mut self,
        api: &A,
        auth: &AuthContext,
        navigator: &mut Navigator,
    ) {
        let (students, modules) = tokio::join!(api.fetch_students(auth), api.fetch_modules(auth));
        self.apply_roster(auth.generation, students, navigator);
        self.apply_modules(auth.generation, modules, navigator);
    }
}
