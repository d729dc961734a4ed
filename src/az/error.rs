//! Error taxonomy for Azure CLI invocations
//!
//! Every failure surfaced by the `az` layer is one of these variants, each
//! carrying the remediation hint shown to the user. Generic subprocess
//! failures are always upgraded to `CommandFailed`; typed variants are never
//! downgraded.

use thiserror::Error;

use super::credentials::{PRIMARY_TOKEN_VAR, SECONDARY_TOKEN_VAR};

/// Closed set of failures the `az` wrapper can produce
#[derive(Debug, Error)]
pub enum AzError {
    /// The `az` binary is missing or not on PATH
    #[error("Azure CLI not found. Install it: https://aka.ms/install-azure-cli")]
    NotInstalled,

    /// `az account show` failed, no active session
    #[error("Not logged in to Azure. Run: az login")]
    NotLoggedIn,

    /// A `repos`/`devops` command was issued without the required extension
    #[error("Azure CLI extension '{name}' is not installed. Run: az extension add --name {name}")]
    ExtensionMissing { name: String },

    /// The az devops extension has no default organization set
    #[error("Azure DevOps organization is not configured. Run: az devops configure --defaults organization=https://dev.azure.com/<org>")]
    NotConfigured,

    /// Any other command failure; carries raw stderr and the exit code when known
    #[error("az command failed{}: {stderr}", .exit_code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    CommandFailed {
        stderr: String,
        exit_code: Option<i32>,
    },

    /// All credential sources were exhausted
    #[error(
        "Could not resolve an Azure DevOps access token. \
         Set {} or {}, or run: az login",
        PRIMARY_TOKEN_VAR,
        SECONDARY_TOKEN_VAR
    )]
    TokenResolution {
        #[source]
        source: Box<AzError>,
    },
}
