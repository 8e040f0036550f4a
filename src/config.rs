use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use crate::factory::{ProviderConfig, DEFAULT_BASE_URL};
use crate::{Error, GenerationSettings};

// Command line interface; every serve option can also come from the environment.
#[derive(Parser, Debug)]
#[command(name = "todo-assist")]
#[command(about = "Task list backend with streamed AI-generated task descriptions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Generate a description against a running server and print it live
    Describe(DescribeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// OpenAI-compatible router base URL
    #[arg(long, env = "PROVIDER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Credential for the router; falls back to OPENAI_API_KEY
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model requested from the router
    #[arg(long, env = "MODEL", default_value = "Qwen/Qwen2.5-VL-7B-Instruct:hyperbolic")]
    pub model: String,

    /// Upper bound on generated tokens
    #[arg(long, default_value_t = 10_000)]
    pub max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.6)]
    pub temperature: f32,

    /// Nucleus sampling threshold
    #[arg(long, default_value_t = 0.9)]
    pub top_p: f32,

    /// Delay between two streamed characters, in milliseconds
    #[arg(long, env = "PACING_MS", default_value_t = 50)]
    pub pacing_ms: u64,

    /// Buffered events per generation stream
    #[arg(long, default_value_t = 64)]
    pub channel_capacity: usize,

    /// Supabase project URL; todo routes are only served when the key is set too
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anon key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,
}

impl ServeArgs {
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            pacing: Duration::from_millis(self.pacing_ms),
            channel_capacity: self.channel_capacity,
        }
    }

    pub fn provider_config(&self) -> Result<ProviderConfig, Error> {
        match &self.api_key {
            Some(api_key) => Ok(ProviderConfig::new(self.base_url.clone(), api_key.clone())),
            None => {
                let from_env = ProviderConfig::from_env()?;
                Ok(ProviderConfig::new(self.base_url.clone(), from_env.api_key))
            }
        }
    }

    /// Supabase URL and key, when both are configured.
    pub fn supabase(&self) -> Option<(String, String)> {
        match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Some((url.clone(), key.clone()))
            }
            _ => None,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DescribeArgs {
    /// Base URL of a running server
    #[arg(short, long, default_value = "http://localhost:3000")]
    pub endpoint: String,

    /// Task title to describe
    #[arg(short, long)]
    pub title: String,

    /// Character budget, clamped to 5..=100
    #[arg(short, long, default_value_t = 20, allow_negative_numbers = true)]
    pub word_limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_args() {
        let cli = Cli::try_parse_from([
            "todo-assist",
            "serve",
            "--port",
            "8080",
            "--api-key",
            "hf_test",
            "--pacing-ms",
            "0",
        ])
        .unwrap();

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8080);
        assert_eq!(args.base_url, DEFAULT_BASE_URL);

        let settings = args.generation_settings();
        assert_eq!(settings.pacing, Duration::ZERO);
        assert_eq!(settings.max_tokens, 10_000);

        let provider = args.provider_config().unwrap();
        assert_eq!(provider.api_key, "hf_test");
    }

    #[test]
    fn test_help_lists_argument_docs() {
        use clap::CommandFactory;

        let mut cli = Cli::command();
        let serve = cli.find_subcommand_mut("serve").unwrap().render_help().to_string();
        assert!(serve.contains("Delay between two streamed characters"));
        assert!(serve.contains("Supabase anon key"));

        let describe = cli
            .find_subcommand_mut("describe")
            .unwrap()
            .render_help()
            .to_string();
        assert!(describe.contains("Character budget"));
    }

    #[test]
    fn test_describe_args() {
        let cli = Cli::try_parse_from(["todo-assist", "describe", "--title", "写周报"]).unwrap();
        let Command::Describe(args) = cli.command else {
            panic!("expected describe");
        };
        assert_eq!(args.title, "写周报");
        assert_eq!(args.word_limit, 20);
        assert_eq!(args.endpoint, "http://localhost:3000");
    }

    #[test]
    fn test_supabase_requires_both_values() {
        let cli = Cli::try_parse_from([
            "todo-assist",
            "serve",
            "--api-key",
            "k",
            "--supabase-url",
            "https://abc.supabase.co",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        // SUPABASE_ANON_KEY may be set in the environment running the tests.
        if std::env::var("SUPABASE_ANON_KEY").is_err() {
            assert!(args.supabase().is_none());
        }
    }
}
