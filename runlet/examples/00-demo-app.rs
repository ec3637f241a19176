use runlet::application;
use runlet_di::context::ApplicationContext;
use runlet_di::error::InstanceError;
use runlet_di::{lifecycle, Managed};
use std::process::ExitCode;
use tracing::info;

// the application type is discovered automatically; its configuration is read from the declared
// file, relative to the working directory
#[derive(Managed)]
#[managed(application, config_file = "config/demo.properties")]
struct DemoApplication;

#[lifecycle]
impl DemoApplication {
    // lifecycle methods can take the context to create other managed types
    #[app_init]
    fn initialize(&self, context: &ApplicationContext) -> Result<(), InstanceError> {
        context.new_instance::<DemoInitializer>()?.initialize();
        Ok(())
    }

    #[app_exec]
    fn execute(&self, context: &ApplicationContext) -> Result<(), InstanceError> {
        context.new_instance::<DemoExecutor>()?.execute();
        Ok(())
    }

    #[app_term]
    fn terminate(&self, context: &ApplicationContext) -> Result<(), InstanceError> {
        context.new_instance::<DemoTerminator>()?.terminate();
        Ok(())
    }
}

#[derive(Managed)]
struct DemoInitializer {
    #[property(name = "demo.nameOfOwner")]
    owner_name: String,
}

impl DemoInitializer {
    fn initialize(&self) {
        info!("Beginning initialization...");
        info!("Owner: {}", self.owner_name);
        info!("Completed initialization.");
    }
}

#[derive(Managed)]
struct DemoExecutor {
    #[property(name = "demo.isDebugEnabled", optional)]
    is_debug_enabled: bool,
    #[property(name = "demo.maxRetryAttempts")]
    max_retry_attempts: i32,
    // explicit kind, although it would be inferred from the field type anyway
    #[property(name = "demo.numberOfMillisToWait", kind = "long")]
    number_of_millis_to_wait: i64,
}

impl DemoExecutor {
    fn execute(&self) {
        info!("Beginning execution...");
        info!(
            debug = self.is_debug_enabled,
            retries = self.max_retry_attempts,
            wait = self.number_of_millis_to_wait,
            "Executing..."
        );
        info!("Completed execution.");
    }
}

#[derive(Managed)]
struct DemoTerminator {
    // read from the process environment
    #[property(name = "USER", system, optional)]
    user: String,
}

impl DemoTerminator {
    fn terminate(&self) {
        info!("Beginning termination...");
        info!("Goodbye {}", self.user);
        info!("Completed termination.");
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() -> ExitCode {
    // create our application, which will find the application type
    let application =
        application::create_default().expect("unable to create default application");

    // logs "Owner: Ada" during initialization
    if application.run().is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
