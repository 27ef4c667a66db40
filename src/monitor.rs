//! Optional external monitoring integration.
//!
//! The agent is loaded at most once, at startup, and only when the
//! environment opts in. When it stays off, nothing is constructed and the
//! rest of the server never notices.

use std::env;

/// Opts the process into the monitoring agent when set to `true`.
const ENABLED_VAR: &str = "NEW_RELIC_ENABLED";

/// Deployment environment name; the agent stays off when this is unset or
/// names a test environment.
const RUN_ENV_VAR: &str = "NODE_ENV";

/// Handle to an activated reporting agent.
#[derive(Debug)]
pub struct MonitoringAgent {
    run_env: String,
}

impl MonitoringAgent {
    pub fn run_env(&self) -> &str {
        &self.run_env
    }
}

/// Checks the environment once and activates the agent when both guards pass.
pub fn init_from_env() -> Option<MonitoringAgent> {
    init(env::var(ENABLED_VAR).ok(), env::var(RUN_ENV_VAR).ok())
}

fn init(enabled: Option<String>, run_env: Option<String>) -> Option<MonitoringAgent> {
    if enabled.as_deref() != Some("true") {
        return None;
    }
    let run_env = run_env?;
    if run_env.contains("test") {
        return None;
    }

    log::info!("Monitoring agent enabled for environment {}", run_env);
    Some(MonitoringAgent { run_env })
}
