//! Application Configuration
//!
//! Built once at startup from the environment (after `.env` is loaded), then
//! overridden by command-line flags.

use std::sync::Arc;

use agent_core::{AgentConfig, AgentError, GenerationOptions, LlmProvider, Result};
use agent_runtime::mcp::StdioConnector;
use agent_runtime::{OllamaConfig, OllamaProvider, OpenAiEndpoint, OpenAiProvider};
use agent_runtime::openai::{AZURE_API_VERSION, OPENAI_BASE_URL};

use crate::cli::Cli;

const DEFAULT_MAX_ITERATIONS: usize = 25;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    #[default]
    Ollama,
    Openai,
}

impl std::str::FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "azure" => Ok(Self::Openai),
            other => Err(AgentError::Config(format!("unknown provider '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AzureSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: Option<usize>,
    pub ollama: OllamaConfig,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub azure: Option<AzureSettings>,
    /// Tool host program followed by its arguments
    pub mcp_server: Option<Vec<String>>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = GenerationOptions::default();

        let azure = match var("AZURE_AI_ENDPOINT") {
            Some(endpoint) => Some(AzureSettings {
                endpoint,
                api_key: var("AZURE_AI_API_KEY").ok_or_else(|| {
                    AgentError::Config("AZURE_AI_API_KEY is required with AZURE_AI_ENDPOINT".into())
                })?,
                api_version: var("AZURE_AI_API_VERSION").unwrap_or_else(|| AZURE_API_VERSION.into()),
                deployment: var("AZURE_AI_DEPLOYMENT"),
            }),
            None => None,
        };

        let max_iterations = parse_var(&var, "REACT_MAX_ITERATIONS")?.unwrap_or(DEFAULT_MAX_ITERATIONS);

        Ok(Self {
            provider: var("REACT_PROVIDER")
                .map(|p| p.parse())
                .transpose()?
                .unwrap_or_default(),
            model: var("REACT_MODEL"),
            temperature: parse_var(&var, "REACT_TEMPERATURE")?.unwrap_or(defaults.temperature),
            max_tokens: parse_var(&var, "REACT_MAX_TOKENS")?.unwrap_or(defaults.max_tokens),
            max_iterations: Some(max_iterations).filter(|&n| n > 0),
            ollama: OllamaConfig {
                host: var("OLLAMA_HOST").unwrap_or_else(|| OllamaConfig::default().host),
                port: parse_var(&var, "OLLAMA_PORT")?.unwrap_or(OllamaConfig::default().port),
            },
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.into()),
            azure,
            mcp_server: tool_host_command(&var)?,
        })
    }

    /// Apply command-line overrides
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(provider) = cli.provider {
            self.provider = provider;
        }
        if let Some(model) = &cli.model {
            self.model = Some(model.clone());
        }
        if let Some(temperature) = cli.temperature {
            self.temperature = temperature;
        }
        if let Some(max) = cli.max_iterations {
            self.max_iterations = Some(max).filter(|&n| n > 0);
        }
        if let Some(program) = &cli.mcp_server {
            let mut command = vec![program.clone()];
            command.extend(cli.server_args.iter().cloned());
            self.mcp_server = Some(command);
        }
    }

    fn model_name(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match (self.provider, &self.azure) {
            (ProviderKind::Ollama, _) => GenerationOptions::default().model,
            (ProviderKind::Openai, Some(AzureSettings { deployment: Some(d), .. })) => d.clone(),
            (ProviderKind::Openai, _) => "gpt-4o".into(),
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            max_iterations: self.max_iterations,
            generation: GenerationOptions {
                model: self.model_name(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                ..GenerationOptions::default()
            },
            ..AgentConfig::default()
        }
    }

    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>> {
        Ok(match self.provider {
            ProviderKind::Ollama => Arc::new(OllamaProvider::from_config(self.ollama.clone())),
            ProviderKind::Openai => Arc::new(OpenAiProvider::new(self.openai_endpoint()?)),
        })
    }

    fn openai_endpoint(&self) -> Result<OpenAiEndpoint> {
        if let Some(azure) = &self.azure {
            return Ok(OpenAiEndpoint::Azure {
                endpoint: azure.endpoint.clone(),
                deployment: azure.deployment.clone().unwrap_or_else(|| self.model_name()),
                api_version: azure.api_version.clone(),
                api_key: azure.api_key.clone(),
            });
        }
        let api_key = self.openai_api_key.clone().ok_or_else(|| {
            AgentError::Config("OPENAI_API_KEY or AZURE_AI_ENDPOINT must be set for --provider openai".into())
        })?;
        Ok(OpenAiEndpoint::OpenAi {
            base_url: self.openai_base_url.clone(),
            api_key,
        })
    }

    /// Connector for the configured tool host, if tools are remote
    pub fn tool_host(&self) -> Option<StdioConnector> {
        let (program, args) = self.mcp_server.as_deref()?.split_first()?;
        Some(StdioConnector::new(program.clone(), args.iter().cloned()))
    }
}

/// `REACT_MCP_SERVER` on its own is split on whitespace. When
/// `REACT_MCP_SERVER_ARGS` (a JSON array of strings) is also set, the program
/// path is taken verbatim, so both may contain spaces.
fn tool_host_command(var: &impl Fn(&str) -> Option<String>) -> Result<Option<Vec<String>>> {
    let Some(command) = var("REACT_MCP_SERVER") else {
        return Ok(None);
    };
    let Some(raw_args) = var("REACT_MCP_SERVER_ARGS") else {
        return Ok(Some(command.split_whitespace().map(str::to_string).collect()));
    };
    let args: Vec<String> = serde_json::from_str(&raw_args).map_err(|e| {
        AgentError::Config(format!("REACT_MCP_SERVER_ARGS must be a JSON array of strings: {e}"))
    })?;
    Ok(Some(std::iter::once(command).chain(args).collect()))
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.parse()
                .map_err(|e| AgentError::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use agent_core::TransportConnector;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.max_iterations, Some(25));
        assert!(config.mcp_server.is_none());

        let agent = config.agent_config();
        assert_eq!(agent.generation.model, "llama3.2");
        assert!((agent.generation.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(agent.generation.max_tokens, 1000);
    }

    #[test]
    fn test_zero_iterations_means_unbounded() {
        let config = load(&[("REACT_MAX_ITERATIONS", "0")]).unwrap();
        assert_eq!(config.max_iterations, None);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = load(&[("REACT_TEMPERATURE", "warm")]).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
        assert!(err.to_string().contains("REACT_TEMPERATURE"));
    }

    #[test]
    fn test_azure_settings() {
        let config = load(&[
            ("REACT_PROVIDER", "openai"),
            ("AZURE_AI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_AI_API_KEY", "secret"),
            ("AZURE_AI_DEPLOYMENT", "gpt-4o-mini"),
        ])
        .unwrap();
        assert_eq!(config.agent_config().generation.model, "gpt-4o-mini");
        assert!(matches!(
            config.openai_endpoint().unwrap(),
            OpenAiEndpoint::Azure { api_version, .. } if api_version == AZURE_API_VERSION
        ));

        assert!(load(&[("AZURE_AI_ENDPOINT", "https://x")]).is_err());
    }

    #[test]
    fn test_openai_requires_key() {
        let config = load(&[("REACT_PROVIDER", "openai")]).unwrap();
        assert!(config.build_provider().is_err());
    }

    #[test]
    fn test_tool_host_with_spaces() {
        let config = load(&[
            ("REACT_MCP_SERVER", "/opt/my tools/tool-host"),
            ("REACT_MCP_SERVER_ARGS", r#"["--config", "my settings.toml"]"#),
        ])
        .unwrap();
        assert_eq!(
            config.mcp_server,
            Some(vec![
                "/opt/my tools/tool-host".to_string(),
                "--config".into(),
                "my settings.toml".into(),
            ])
        );

        let err = load(&[("REACT_MCP_SERVER", "tool-host"), ("REACT_MCP_SERVER_ARGS", "--quiet")])
            .unwrap_err();
        assert!(err.to_string().contains("REACT_MCP_SERVER_ARGS"));
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = load(&[("REACT_MCP_SERVER", "tool-host --quiet"), ("REACT_MODEL", "llama3.1")]).unwrap();
        assert_eq!(config.tool_host().unwrap().describe(), "tool-host --quiet");

        config.merge_cli(&Cli {
            model: Some("qwen2.5".into()),
            max_iterations: Some(0),
            mcp_server: Some("python".into()),
            server_args: vec!["mcp_server.py".into()],
            ..Cli::default()
        });
        assert_eq!(config.agent_config().generation.model, "qwen2.5");
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.mcp_server, Some(vec!["python".into(), "mcp_server.py".into()]));
    }
}
