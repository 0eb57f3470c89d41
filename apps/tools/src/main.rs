use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use lti_core::{registration::RegistrationSettings, LtiResourceLink, Registration};
use lti_proctoring::{
    message::launch::{StartProctoringLaunchRequest, StartProctoringLaunchRequestBuilder},
    AcsAction, AcsClaim, AcsControl, AcsControlResultSerializer, AcsServiceClient,
};
use serde::Deserialize;

#[derive(Parser, Debug)]
struct Cli {
    /// TOML file with a `[registration]` table, as read by acs_server.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the OIDC initiation URL of a Start Proctoring launch.
    StartProctoring {
        #[arg(long)]
        resource_link_id: String,
        #[arg(long)]
        resource_link_url: Option<String>,
        #[arg(long)]
        start_assessment_url: String,
        #[arg(long)]
        login_hint: String,
        #[arg(long, default_value_t = 1)]
        attempt_number: u32,
        #[arg(long)]
        deployment_id: Option<String>,
        /// Grants an ACS claim pointing at this control URL.
        #[arg(long)]
        acs_url: Option<String>,
        #[arg(long = "acs-action", value_parser = parse_action)]
        acs_actions: Vec<AcsAction>,
    },
    /// Send an ACS control and print the control result.
    SendControl {
        #[arg(long)]
        acs_url: String,
        #[arg(long)]
        resource_link_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long, value_parser = parse_action)]
        action: AcsAction,
        #[arg(long, default_value_t = 1)]
        attempt_number: u32,
        #[arg(long)]
        extra_time: Option<u32>,
        #[arg(long, value_parser = parse_severity)]
        incident_severity: Option<f64>,
        #[arg(long)]
        reason_code: Option<String>,
        #[arg(long)]
        reason_message: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct ToolsConfig {
    #[serde(default)]
    registration: Option<RegistrationSettings>,
}

fn parse_action(value: &str) -> Result<AcsAction, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn parse_severity(value: &str) -> Result<f64, String> {
    let severity: f64 = value.parse().map_err(|err| format!("{err}"))?;
    if !severity.is_finite() {
        return Err(format!("incident severity must be finite, got '{value}'"));
    }
    Ok(severity)
}

fn load_registration(path: Option<&Path>) -> Result<Registration> {
    let settings = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            let config: ToolsConfig = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config '{}'", path.display()))?;
            config.registration.unwrap_or_default()
        }
        None => RegistrationSettings::default(),
    };
    Ok(settings.to_registration())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registration = load_registration(cli.config.as_deref())?;

    match cli.command {
        Command::StartProctoring {
            resource_link_id,
            resource_link_url,
            start_assessment_url,
            login_hint,
            attempt_number,
            deployment_id,
            acs_url,
            acs_actions,
        } => {
            let mut resource_link = LtiResourceLink::new(resource_link_id);
            if let Some(url) = resource_link_url {
                resource_link = resource_link.with_url(url);
            }
            let mut request =
                StartProctoringLaunchRequest::new(resource_link, start_assessment_url, login_hint)
                    .with_attempt_number(attempt_number);
            if let Some(deployment_id) = deployment_id {
                request = request.with_deployment_id(deployment_id);
            }
            if let Some(acs_url) = acs_url {
                request = request.with_acs_claim(&AcsClaim::new(acs_actions, acs_url));
            }

            let message = StartProctoringLaunchRequestBuilder::default()
                .build_start_proctoring_launch_request(&registration, request)?;
            println!("{}", message.to_url()?);
        }
        Command::SendControl {
            acs_url,
            resource_link_id,
            user_id,
            action,
            attempt_number,
            extra_time,
            incident_severity,
            reason_code,
            reason_message,
        } => {
            let mut control = AcsControl::new(
                LtiResourceLink::new(resource_link_id),
                user_id,
                action,
                Utc::now().fixed_offset(),
                attempt_number,
            );
            if let Some(extra_time) = extra_time {
                control = control.with_extra_time(extra_time);
            }
            if let Some(incident_severity) = incident_severity {
                control = control.with_incident_severity(incident_severity);
            }
            if let Some(reason_code) = reason_code {
                control = control.with_reason_code(reason_code);
            }
            if let Some(reason_message) = reason_message {
                control = control.with_reason_message(reason_message);
            }

            let result = AcsServiceClient::default()
                .send_control(&registration, &mut control, &acs_url)
                .await?;
            println!("{}", AcsControlResultSerializer::default().serialize(&result)?);
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
