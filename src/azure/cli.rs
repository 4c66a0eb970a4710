//! Azure CLI command execution.
//!
//! Used to obtain a management token from an existing `az login` session.

use crate::config;
use crate::error::{UtilizationError, UtilizationResult};
use colored::Colorize;
use regex::Regex;
use serde::Deserialize;
use std::process::Command;
use std::sync::OnceLock;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

/// Largest stdout accepted from a command.
const MAX_OUTPUT_BYTES: usize = 500_000;

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzAccessToken {
    access_token: String,
}

/// Run a command and return its stdout.
///
/// The command string is split on spaces, with quoted substrings preserved.
pub fn run(cmd: &str) -> UtilizationResult<String> {
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let cmds: Vec<&str> = split_and_strip(cmd);
    let (program, args) = cmds
        .split_first()
        .ok_or_else(|| UtilizationError::Command("empty command".to_string()))?;
    log::trace!("split cmds={:?}", cmds);

    let output = Command::new(program).args(args).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        UtilizationError::Command(format!("failed to execute {program}: {e}"))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!("{failed} to run {program}", failed = "failed".on_red());
        return Err(UtilizationError::Command(format!(
            "{program} exited with {status}: {stderr}",
            status = output.status,
            stderr = stderr.trim()
        )));
    }

    log::debug!("Success output.stdout.len(): {}", output.stdout.len());
    if output.stdout.len() > MAX_OUTPUT_BYTES {
        return Err(UtilizationError::Command(format!(
            "response too large: {} bytes from {program}",
            output.stdout.len()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| UtilizationError::Command(format!("invalid UTF-8 from {program}: {e}")))
}

/// The `az` invocation that prints a management access token.
pub fn access_token_command(tenant_id: Option<&str>) -> String {
    let resource = config::MANAGEMENT_SCOPE.trim_end_matches(".default");
    match tenant_id {
        Some(tenant) => format!(
            "az account get-access-token --resource {resource} --tenant {tenant} --output json"
        ),
        None => format!("az account get-access-token --resource {resource} --output json"),
    }
}

/// Get a management access token from the logged in az cli session.
pub fn az_access_token(tenant_id: Option<&str>) -> UtilizationResult<String> {
    let output = run(&access_token_command(tenant_id))?;
    parse_access_token(&output)
}

fn parse_access_token(output: &str) -> UtilizationResult<String> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    let token: AzAccessToken = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| UtilizationError::parse("az account get-access-token", e))?;
    Ok(token.access_token)
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .filter(|s| !s.is_empty())
        .collect()
}
