//! Resolution of the single application type.

use crate::type_registry::TypeDefinition;
use itertools::Itertools;
use tracing::{debug, warn};

/// Finds the type carrying the `Application` role. With multiple such types, the last one in
/// discovery order wins.
pub fn resolve_application_type(candidates: &[TypeDefinition]) -> Option<&TypeDefinition> {
    let applications = candidates
        .iter()
        .filter(|candidate| candidate.is_application())
        .collect_vec();

    if applications.len() > 1 {
        warn!(
            candidates = %applications.iter().map(|candidate| candidate.type_name).join(", "),
            "Multiple application types found - using the last one."
        );
    }

    let application = applications.last().copied();
    if let Some(application) = application {
        debug!("Found application type: {}", application.type_name);
    }

    application
}
