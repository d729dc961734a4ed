//! Access token resolution and caching
//!
//! Tokens come from three sources, tried in order: the primary environment
//! variable, the secondary environment variable, and finally `az account
//! get-access-token`. The resolved credential is cached for the lifetime of
//! the resolver instance; so is the subscription metadata that only the az
//! path can provide.

use serde::Serialize;
use serde_json::Value;

use super::error::AzError;
use super::executor::AzCli;

/// Primary token environment variable (the one `az devops` itself honors)
pub const PRIMARY_TOKEN_VAR: &str = "AZURE_DEVOPS_EXT_PAT";

/// Secondary token environment variable
pub const SECONDARY_TOKEN_VAR: &str = "AZURE_DEVOPS_PAT";

/// Environment lookup, injectable so tests never touch the real process
/// environment
pub type EnvReader = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Where the resolved token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenSource {
    PrimaryEnv,
    SecondaryEnv,
    AzCli,
}

impl TokenSource {
    pub fn describe(&self) -> String {
        match self {
            TokenSource::PrimaryEnv => format!("environment variable {PRIMARY_TOKEN_VAR}"),
            TokenSource::SecondaryEnv => format!("environment variable {SECONDARY_TOKEN_VAR}"),
            TokenSource::AzCli => "az account get-access-token".to_string(),
        }
    }
}

/// Active subscription metadata from `az account show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub state: String,
}

/// Result of a full resolution: the token, how it was obtained, and the
/// subscription when the az path produced it. The token itself is excluded
/// from serialization so JSON output can never leak it.
#[derive(Debug, Serialize)]
pub struct AuthContext {
    #[serde(skip)]
    pub access_token: String,
    pub source: TokenSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionInfo>,
}

#[derive(Debug, Clone)]
struct Credential {
    token: String,
    source: TokenSource,
}

/// Stateful resolver owning the two cache slots (credential, subscription)
pub struct CredentialResolver<C> {
    cli: C,
    env: EnvReader,
    credential: Option<Credential>,
    subscription: Option<SubscriptionInfo>,
}

impl<C: AzCli> CredentialResolver<C> {
    pub fn new(cli: C) -> Self {
        Self::with_env(cli, Box::new(|key| std::env::var(key).ok()))
    }

    /// Build with a custom environment lookup (for testing)
    pub fn with_env(cli: C, env: EnvReader) -> Self {
        Self {
            cli,
            env,
            credential: None,
            subscription: None,
        }
    }

    /// Read an environment variable, treating blank-after-trim as absent
    fn env_token(&self, var: &str) -> Option<String> {
        (self.env)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Resolve a bearer token, caching the result. Env vars are checked
    /// before any subprocess is spawned.
    pub async fn access_token(&mut self) -> Result<String, AzError> {
        if let Some(cred) = &self.credential {
            return Ok(cred.token.clone());
        }

        for (var, source) in [
            (PRIMARY_TOKEN_VAR, TokenSource::PrimaryEnv),
            (SECONDARY_TOKEN_VAR, TokenSource::SecondaryEnv),
        ] {
            if let Some(token) = self.env_token(var) {
                self.credential = Some(Credential {
                    token: token.clone(),
                    source,
                });
                return Ok(token);
            }
        }

        let token = match self.cli.get_access_token().await {
            Ok(t) => {
                let t = t.trim().to_string();
                if t.is_empty() {
                    return Err(AzError::TokenResolution {
                        source: Box::new(AzError::CommandFailed {
                            stderr: "az returned an empty access token".to_string(),
                            exit_code: None,
                        }),
                    });
                }
                t
            }
            Err(err) => {
                return Err(AzError::TokenResolution {
                    source: Box::new(err),
                })
            }
        };

        self.credential = Some(Credential {
            token: token.clone(),
            source: TokenSource::AzCli,
        });
        Ok(token)
    }

    /// Best-effort subscription lookup. Never fails: any probe failure,
    /// command failure, or unusable payload yields `None`.
    pub async fn subscription_info(&mut self) -> Option<SubscriptionInfo> {
        if let Some(info) = &self.subscription {
            return Some(info.clone());
        }
        if !self.cli.is_installed().await {
            return None;
        }
        if !self.cli.is_logged_in().await {
            return None;
        }
        let account = self.cli.run("account show --output json").await.ok()?;
        let info = subscription_from_account(&account)?;
        self.subscription = Some(info.clone());
        Some(info)
    }

    /// Full resolution. The source is re-derived from the environment on
    /// every call so it stays accurate even when the token itself was served
    /// from cache.
    pub async fn auth_context(&mut self) -> Result<AuthContext, AzError> {
        let access_token = self.access_token().await?;

        let source = if self.env_token(PRIMARY_TOKEN_VAR).is_some() {
            TokenSource::PrimaryEnv
        } else if self.env_token(SECONDARY_TOKEN_VAR).is_some() {
            TokenSource::SecondaryEnv
        } else {
            TokenSource::AzCli
        };

        let subscription = if source == TokenSource::AzCli {
            self.subscription_info().await
        } else {
            None
        };

        Ok(AuthContext {
            access_token,
            source,
            subscription,
        })
    }

    /// Source tag of the currently cached credential, if any
    pub fn cached_source(&self) -> Option<TokenSource> {
        self.credential.as_ref().map(|c| c.source)
    }

    /// Drop both cache slots; the next call re-resolves from scratch
    pub fn clear_cache(&mut self) {
        self.credential = None;
        self.subscription = None;
    }
}

/// Extract subscription fields from an `az account show` payload. Absent id
/// and name means the payload is unusable.
fn subscription_from_account(account: &Value) -> Option<SubscriptionInfo> {
    let id = field(account, "id");
    let name = field(account, "name");
    if id.is_none() && name.is_none() {
        return None;
    }
    let tenant_id = field(account, "tenantId").or_else(|| field(account, "homeTenantId"));
    Some(SubscriptionInfo {
        id: id.unwrap_or_default(),
        name: name.unwrap_or_default(),
        tenant_id: tenant_id.unwrap_or_default(),
        state: field(account, "state").unwrap_or_else(|| "Unknown".to_string()),
    })
}

/// Coerce a JSON field to a string, with null treated as absent
fn field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
