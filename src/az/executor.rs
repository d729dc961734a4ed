//! Azure CLI subprocess execution
//!
//! Wraps `az` invocations behind the [`AzCli`] trait so callers (and tests)
//! can swap the real binary for a mock. Every probe spawns exactly one
//! process; `run` adds the install/login/extension gating on top.

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::error::AzError;

/// Resource GUID of the Azure DevOps token endpoint. Must match what the
/// service expects byte for byte.
pub const AZURE_DEVOPS_RESOURCE_ID: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Extension the `repos`/`devops` command families require
pub const DEVOPS_EXTENSION: &str = "azure-devops";

/// Command-line prefixes that belong to the restricted families.
/// Matching is exact and case-sensitive.
const RESTRICTED_PREFIXES: [&str; 2] = ["repos ", "devops "];

/// Azure CLI operations used by the rest of the crate
#[async_trait]
pub trait AzCli: Send + Sync {
    /// True iff the `az` binary is present and answers a version query
    async fn is_installed(&self) -> bool;

    /// True iff there is an active `az login` session
    async fn is_logged_in(&self) -> bool;

    /// True iff the named extension shows up in `az extension list`
    async fn has_extension(&self, name: &str) -> bool;

    /// Run one `az` command line and parse its stdout as JSON
    async fn run(&self, line: &str) -> Result<Value, AzError>;

    /// Fetch an Azure DevOps access token via `az account get-access-token`
    async fn get_access_token(&self) -> Result<String, AzError>;
}

/// Production executor spawning the real `az` binary
pub struct AzCliExecutor {
    program: String,
}

impl Default for AzCliExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl AzCliExecutor {
    pub fn new() -> Self {
        Self::with_program("az")
    }

    /// Use a different binary (for testing)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Spawn one process for the given command line and collect its output
    async fn exec(&self, line: &str) -> std::io::Result<std::process::Output> {
        Command::new(&self.program)
            .args(split_args(line))
            .output()
            .await
    }

    /// On a failed token command, re-probe install/login state so the error
    /// names the root cause instead of the symptom
    async fn diagnose_token_failure(&self, fallback: AzError) -> AzError {
        if !self.is_installed().await {
            AzError::NotInstalled
        } else if !self.is_logged_in().await {
            AzError::NotLoggedIn
        } else {
            fallback
        }
    }
}

#[async_trait]
impl AzCli for AzCliExecutor {
    async fn is_installed(&self) -> bool {
        self.exec("version --output json")
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn is_logged_in(&self) -> bool {
        self.exec("account show --output json")
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn has_extension(&self, name: &str) -> bool {
        let Ok(output) = self.exec("extension list --output json").await else {
            return false;
        };
        if !output.status.success() {
            return false;
        }
        let Ok(extensions) = serde_json::from_slice::<Value>(&output.stdout) else {
            return false;
        };
        extensions
            .as_array()
            .is_some_and(|list| list.iter().any(|e| e["name"].as_str() == Some(name)))
    }

    async fn run(&self, line: &str) -> Result<Value, AzError> {
        if !self.is_installed().await {
            return Err(AzError::NotInstalled);
        }
        if !self.is_logged_in().await {
            return Err(AzError::NotLoggedIn);
        }
        if requires_devops_extension(line) && !self.has_extension(DEVOPS_EXTENSION).await {
            return Err(AzError::ExtensionMissing {
                name: DEVOPS_EXTENSION.to_string(),
            });
        }

        let output = self.exec(line).await.map_err(|e| AzError::CommandFailed {
            stderr: e.to_string(),
            exit_code: None,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        // Known stderr phrases win over the exit code
        if let Some(err) = classify_stderr(&stderr) {
            return Err(err);
        }
        if !output.status.success() {
            let stderr = if stderr.trim().is_empty() {
                format!("az {line} exited with a failure status")
            } else {
                stderr
            };
            return Err(AzError::CommandFailed {
                stderr,
                exit_code: output.status.code(),
            });
        }

        parse_stdout(&String::from_utf8_lossy(&output.stdout))
    }

    async fn get_access_token(&self) -> Result<String, AzError> {
        let line = format!(
            "account get-access-token --resource {AZURE_DEVOPS_RESOURCE_ID} \
             --query accessToken --output tsv"
        );
        match self.exec(&line).await {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                let failure = AzError::CommandFailed {
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    exit_code: output.status.code(),
                };
                Err(self.diagnose_token_failure(failure).await)
            }
            Err(e) => {
                let failure = AzError::CommandFailed {
                    stderr: e.to_string(),
                    exit_code: None,
                };
                Err(self.diagnose_token_failure(failure).await)
            }
        }
    }
}

/// Split a command line into arguments. Double quotes group words, so
/// values like project names may contain spaces.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

/// True iff the command line belongs to a family that needs the
/// azure-devops extension
pub(crate) fn requires_devops_extension(line: &str) -> bool {
    RESTRICTED_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Map recognized stderr phrases to typed failures
fn classify_stderr(stderr: &str) -> Option<AzError> {
    if stderr.contains("organization") && stderr.contains("not configured") {
        return Some(AzError::NotConfigured);
    }
    if stderr.contains("az devops configure --defaults organization") {
        return Some(AzError::NotConfigured);
    }
    if stderr.contains("not found") || stderr.contains("does not exist") {
        return Some(AzError::CommandFailed {
            stderr: stderr.to_string(),
            exit_code: None,
        });
    }
    None
}

/// Parse command stdout; az prints nothing at all for some commands, which
/// counts as an empty object rather than a parse error
fn parse_stdout(stdout: &str) -> Result<Value, AzError> {
    if stdout.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(stdout).map_err(|e| AzError::CommandFailed {
        stderr: format!("could not parse az output as JSON: {e}"),
        exit_code: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_args_on_plain_whitespace() {
        assert_eq!(
            split_args("repos pr list --creator @me"),
            vec!["repos", "pr", "list", "--creator", "@me"]
        );
        assert_eq!(split_args("  account   show  "), vec!["account", "show"]);
    }

    #[test]
    fn split_args_keeps_quoted_values_intact() {
        let args = split_args(r#"repos pr list --project "My Project" --output json"#);
        let idx = args.iter().position(|a| a == "--project").unwrap();
        assert_eq!(args[idx + 1], "My Project");
        assert_eq!(args.last().unwrap(), "json");
        assert!(!args.contains(&"Project".to_string()));
    }

    #[test]
    fn split_args_empty_quotes_are_dropped() {
        assert_eq!(split_args(r#"show """#), vec!["show"]);
    }

    #[test]
    fn repos_commands_are_restricted() {
        assert!(requires_devops_extension("repos pr list --creator @me"));
        assert!(requires_devops_extension("devops project list"));
    }

    #[test]
    fn other_commands_are_not_restricted() {
        assert!(!requires_devops_extension("account show --output json"));
        assert!(!requires_devops_extension("boards work-item show --id 1"));
        // substring elsewhere in the line does not count
        assert!(!requires_devops_extension("extension add --name azure-devops repos "));
    }

    #[test]
    fn restriction_is_case_sensitive() {
        assert!(!requires_devops_extension("Repos pr list"));
        assert!(!requires_devops_extension("DEVOPS project list"));
    }

    #[test]
    fn classify_org_not_configured() {
        let err = classify_stderr("ERROR: organization is not configured").unwrap();
        assert!(matches!(err, AzError::NotConfigured));
    }

    #[test]
    fn classify_configure_hint() {
        let stderr = "Run az devops configure --defaults organization=... first";
        assert!(matches!(
            classify_stderr(stderr),
            Some(AzError::NotConfigured)
        ));
    }

    #[test]
    fn classify_not_found_keeps_stderr_without_exit_code() {
        let err = classify_stderr("ERROR: pull request 99 does not exist").unwrap();
        match err {
            AzError::CommandFailed { stderr, exit_code } => {
                assert!(stderr.contains("does not exist"));
                assert!(exit_code.is_none());
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn classify_unrecognized_stderr_is_none() {
        assert!(classify_stderr("WARNING: something benign").is_none());
        assert!(classify_stderr("").is_none());
    }

    #[test]
    fn parse_empty_stdout_is_empty_object() {
        let value = parse_stdout("").unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn parse_whitespace_stdout_is_empty_object() {
        let value = parse_stdout("   \n  ").unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn parse_json_stdout() {
        let value = parse_stdout(r#"[{"name": "azure-devops"}]"#).unwrap();
        assert_eq!(value[0]["name"], "azure-devops");
    }

    #[test]
    fn parse_garbage_stdout_is_command_failure() {
        let err = parse_stdout("not json at all").unwrap_err();
        assert!(matches!(err, AzError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn missing_binary_probes_are_false_and_never_error() {
        let az = AzCliExecutor::with_program("/nonexistent/az-test-binary");
        assert!(!az.is_installed().await);
        assert!(!az.is_logged_in().await);
        assert!(!az.has_extension(DEVOPS_EXTENSION).await);
    }

    #[tokio::test]
    async fn missing_binary_run_is_not_installed() {
        let az = AzCliExecutor::with_program("/nonexistent/az-test-binary");
        let err = az.run("repos pr list").await.unwrap_err();
        assert!(matches!(err, AzError::NotInstalled));
    }

    #[tokio::test]
    async fn token_failure_reports_not_installed_over_raw_error() {
        let az = AzCliExecutor::with_program("/nonexistent/az-test-binary");
        let err = az.get_access_token().await.unwrap_err();
        assert!(matches!(err, AzError::NotInstalled));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn silent_success_yields_empty_object() {
        // /bin/true ignores its arguments and prints nothing
        let az = AzCliExecutor::with_program("/bin/true");
        let value = az.run("boards work-item show --id 1").await.unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn restricted_command_requires_extension() {
        // extension list prints nothing under /bin/true, so the probe is false
        let az = AzCliExecutor::with_program("/bin/true");
        let err = az.run("repos pr list --creator @me").await.unwrap_err();
        assert!(matches!(err, AzError::ExtensionMissing { ref name } if name == DEVOPS_EXTENSION));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_probe_reports_not_installed() {
        // every invocation exits 1, so the install probe fails first
        let az = AzCliExecutor::with_program("/bin/false");
        let err = az.run("account list").await.unwrap_err();
        assert!(matches!(err, AzError::NotInstalled));
    }
}
