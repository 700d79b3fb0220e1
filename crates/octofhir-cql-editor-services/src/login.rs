//! UMLS login check

use crate::session::SessionContext;
use crate::terminology::TerminologyService;
use log::{debug, warn};

/// Whether the session is signed in to UMLS.
///
/// Fails closed: transport errors, non-success statuses and undecodable
/// bodies all resolve to `false`.
pub async fn check_login(service: &dyn TerminologyService, session: &SessionContext) -> bool {
    match service.check_login(session).await {
        Ok(logged_in) => {
            debug!("UMLS login status: {logged_in}");
            logged_in
        }
        Err(err) => {
            warn!("UMLS login check failed, treating session as signed out: {err}");
            false
        }
    }
}
