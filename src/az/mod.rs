//! Azure CLI integration
//!
//! Everything that talks to `az`: subprocess execution with typed failure
//! classification, and access-token resolution with process-lifetime caching.

mod credentials;
mod error;
mod executor;

pub use credentials::CredentialResolver;
pub use error::AzError;
pub use executor::{AzCli, AzCliExecutor};

use anyhow::Result;
use owo_colors::OwoColorize;

/// Handle the `ado auth` command: show how credentials resolve, without ever
/// printing the token itself
pub async fn show_auth(json: bool) -> Result<()> {
    let mut resolver = CredentialResolver::new(AzCliExecutor::new());
    let ctx = resolver.auth_context().await?;

    if json {
        // AuthContext skips the token field during serialization
        println!("{}", serde_json::to_string_pretty(&ctx)?);
        return Ok(());
    }

    println!("{} token resolved", "✓".green());
    println!("  source: {}", ctx.source.describe().cyan());
    if let Some(sub) = &ctx.subscription {
        println!("  subscription: {} ({})", sub.name.cyan(), sub.id);
        println!("  tenant: {}", sub.tenant_id);
        println!("  state: {}", sub.state);
    }
    Ok(())
}
