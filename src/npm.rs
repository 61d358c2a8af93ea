//! npm registry operations.
//!
//! Download and publish shell out to the `npm` binary with inherited stdio so
//! the user sees npm's own progress and prompts. Argument lists are built by
//! separate functions so they can be checked without running npm.

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::config::npmrc_path;
use crate::error::{Error, Result};

const NPM: &str = if cfg!(windows) { "npm.cmd" } else { "npm" };

/// Line prefix of an npm registry auth token in `.npmrc`.
pub const AUTH_TOKEN_KEY: &str = "//registry.npmjs.org/:_authToken=";

/// Scope of `@scope/name`, without the `@`.
#[must_use]
pub fn package_scope(name: &str) -> Option<&str> {
    let rest = name.strip_prefix('@')?;
    let (scope, package) = rest.split_once('/')?;
    (!scope.is_empty() && !package.is_empty()).then_some(scope)
}

/// True if `.npmrc` content carries a registry auth token.
#[must_use]
pub fn has_auth_token(npmrc: &str) -> bool {
    npmrc.lines().any(|line| line.trim_start().starts_with(AUTH_TOKEN_KEY))
}

/// True if the user's `~/.npmrc` carries a registry auth token.
#[must_use]
pub fn is_logged_in() -> bool {
    npmrc_path()
        .and_then(|path| fs::read_to_string(path).ok())
        .is_some_and(|content| has_auth_token(&content))
}

#[must_use]
pub fn install_args(package: &str, location: &Path) -> Vec<String> {
    vec![
        "install".to_string(),
        package.to_string(),
        "--prefix".to_string(),
        location.display().to_string(),
    ]
}

#[must_use]
pub fn login_args(username: &str, email: &str, scope: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "login".to_string(),
        "--username".to_string(),
        username.to_string(),
        "--email".to_string(),
        email.to_string(),
    ];
    if let Some(scope) = scope {
        args.push(format!("--scope=@{scope}"));
    }
    args
}

#[must_use]
pub fn publish_args(scoped: bool) -> Vec<String> {
    let mut args = vec!["publish".to_string()];
    if scoped {
        args.extend(["--access".to_string(), "public".to_string()]);
    }
    args
}

/// Run `npm <args>`, optionally inside `cwd`.
///
/// # Errors
///
/// Returns `Process` if npm cannot be started or exits unsuccessfully.
pub fn run_npm(args: &[String], cwd: Option<&Path>) -> Result<()> {
    let command_line = format!("npm {}", args.join(" "));
    debug!("Running: {command_line}");

    let mut command = Command::new(NPM);
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let status = command.status().map_err(|e| Error::Process {
        command: command_line.clone(),
        message: e.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Process {
            command: command_line,
            message: status
                .code()
                .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}")),
        })
    }
}

/// `npm install <package> --prefix <location>`.
///
/// # Errors
///
/// Returns `Process` if npm fails.
pub fn install(package: &str, location: &Path) -> Result<()> {
    info!("Downloading the integration package {package} to {} ...", location.display());
    run_npm(&install_args(package, location), None)?;
    info!("Package {package} downloaded successfully");
    Ok(())
}

/// Log in to the registry unless `~/.npmrc` already has a token, then
/// `npm publish` from `package_dir`.
///
/// # Errors
///
/// Returns `Process` if login or publish fails.
pub fn publish(package_name: &str, package_dir: &Path, username: &str, email: &str) -> Result<()> {
    let scope = package_scope(package_name);

    info!("Logging into the integration package registry ...");
    if is_logged_in() {
        info!("Already logged into the integration package registry");
    } else {
        run_npm(&login_args(username, email, scope), None)?;
        info!("Logged into the integration package registry successfully");
    }

    info!("Publishing the integration package from {} ...", package_dir.display());
    info!("Package name: {package_name}");
    info!("Scope: {}", scope.unwrap_or("none"));
    run_npm(&publish_args(scope.is_some()), Some(package_dir))?;
    info!("Package {package_name} published successfully");
    Ok(())
}
