//! Dispatch of the application lifecycle. The phases always run in the same order: INIT, EXECUTE,
//! TERMINATE. Each phase is isolated - a failure of one phase is recorded in the resulting
//! [LifecycleReport] and the next phase is still attempted.
//!
//! A single application instance is materialized by the first phase needing it and reused by the
//! following phases. When materialization fails, the phase fails and the next phase retries.

use crate::context::ApplicationContext;
use crate::error::LifecycleError;
use crate::marker::LifecyclePhase;
use crate::type_registry::{ManagedInstance, TypeDefinition};
use tracing::{debug, error, info, warn};

/// Lifecycle state machine.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum LifecycleState {
    #[default]
    NotStarted,
    Initialized,
    Executed,
    Terminated,
}

impl LifecycleState {
    /// State reached after given phase has been attempted.
    pub fn after(phase: LifecyclePhase) -> Self {
        match phase {
            LifecyclePhase::Init => LifecycleState::Initialized,
            LifecyclePhase::Execute => LifecycleState::Executed,
            LifecyclePhase::Terminate => LifecycleState::Terminated,
        }
    }
}

/// What happened to a single phase.
#[derive(Clone, Debug)]
pub enum PhaseOutcome {
    /// The lifecycle method ran successfully.
    Completed,
    /// An optional phase had no method.
    NotDeclared,
    /// A required phase had no method.
    Missing,
    Failed(LifecycleError),
}

impl PhaseOutcome {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseOutcome::Completed)
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, PhaseOutcome::Failed(_))
    }
}

#[derive(Clone, Debug)]
pub struct PhaseReport {
    pub phase: LifecyclePhase,
    pub outcome: PhaseOutcome,
}

/// Result of dispatching the whole lifecycle.
#[derive(Clone, Debug, Default)]
pub struct LifecycleReport {
    pub state: LifecycleState,
    /// Attempted phases in dispatch order.
    pub phases: Vec<PhaseReport>,
}

impl LifecycleReport {
    pub fn outcome(&self, phase: LifecyclePhase) -> Option<&PhaseOutcome> {
        self.phases
            .iter()
            .find(|report| report.phase == phase)
            .map(|report| &report.outcome)
    }

    /// Phases which ran successfully, in order.
    pub fn completed_phases(&self) -> Vec<LifecyclePhase> {
        self.phases
            .iter()
            .filter(|report| report.outcome.is_completed())
            .map(|report| report.phase)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LifecycleError> {
        self.phases.iter().filter_map(|report| match &report.outcome {
            PhaseOutcome::Failed(error) => Some(error),
            _ => None,
        })
    }

    /// Phases which were required, but had no method.
    pub fn missing_phases(&self) -> Vec<LifecyclePhase> {
        self.phases
            .iter()
            .filter(|report| matches!(report.outcome, PhaseOutcome::Missing))
            .map(|report| report.phase)
            .collect()
    }

    /// True when nothing failed and nothing required was missing.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none() && self.missing_phases().is_empty()
    }
}

/// Invokes lifecycle methods of an application type.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleDispatcher<'a> {
    context: &'a ApplicationContext,
}

impl<'a> LifecycleDispatcher<'a> {
    pub fn new(context: &'a ApplicationContext) -> Self {
        Self { context }
    }

    /// Runs all phases of the given application type.
    pub fn dispatch(&self, application: &TypeDefinition) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        let mut instance = None;

        for phase in LifecyclePhase::ALL {
            let outcome = self.run_phase(application, phase, &mut instance);

            report.state = LifecycleState::after(phase);
            report.phases.push(PhaseReport { phase, outcome });
        }

        report
    }

    fn run_phase(
        &self,
        application: &TypeDefinition,
        phase: LifecyclePhase,
        instance: &mut Option<ManagedInstance>,
    ) -> PhaseOutcome {
        let method = match application.lifecycle_method(phase) {
            Some(method) => method,
            None if phase.is_required() => {
                warn!(
                    "No annotated execution method was found in application: {}",
                    application.type_name
                );
                return PhaseOutcome::Missing;
            }
            None => {
                debug!(%phase, "No lifecycle method declared - skipping phase.");
                return PhaseOutcome::NotDeclared;
            }
        };

        let target = match instance.take() {
            Some(existing) => Ok(existing),
            None => self.context.materialize(application.type_id),
        };

        let mut target = match target {
            Ok(target) => target,
            Err(error) => {
                let error = LifecycleError::Materialization { phase, error };
                error!(%error, "Lifecycle phase not executed.");
                return PhaseOutcome::Failed(error);
            }
        };

        debug!(%phase, method = method.method_name, "Invoking lifecycle method...");

        let result = (method.invoker)(target.as_mut(), self.context);
        *instance = Some(target);

        match result {
            Ok(()) => {
                info!(%phase, "Lifecycle phase completed.");
                PhaseOutcome::Completed
            }
            Err(error) => {
                let error = LifecycleError::Invocation {
                    phase,
                    method_name: method.method_name.to_string(),
                    error,
                };
                error!(%error, "Lifecycle phase failed.");
                PhaseOutcome::Failed(error)
            }
        }
    }
}
