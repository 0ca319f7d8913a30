use std::fs::File;
use std::future::Future;
use std::io::{BufWriter, Write};
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use frotz_env::{ConfigLoader, FrotzConfig, FrotzProcess};
use grunk_core::agent::{
    ActionProposer, Episode, EpisodeConfig, EventSink, NullSink, PromptConfig, ProposerFailure,
    TurnEvent, WorldContext, build_action_prompt,
};
use grunk_core::eval;
use grunk_core::llm::{OllamaClient, OllamaConfig};

struct OllamaProposer {
    client: OllamaClient,
    system_prompt: String,
    prompt_cfg: PromptConfig,
}

impl ActionProposer for OllamaProposer {
    fn propose<'a>(
        &'a self,
        observation: &'a str,
        context: &'a WorldContext,
        feedback: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProposerFailure>> + Send + 'a>> {
        Box::pin(async move {
            let prompt = build_action_prompt(
                &self.system_prompt,
                observation,
                context,
                feedback,
                &self.prompt_cfg,
            );
            self.client
                .generate(&prompt)
                .await
                .map_err(|e| ProposerFailure::Failed(format!("{e:#}")))
        })
    }
}

/// Appends one JSON line per committed turn.
struct JsonlSink {
    out: BufWriter<File>,
}

impl JsonlSink {
    fn create(path: &str) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("create event log {path}"))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }
}

impl EventSink for JsonlSink {
    fn record(&mut self, event: &TurnEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
                    tracing::warn!(target: "runner", "runner.event_log.write_failed err={e}");
                }
            }
            Err(e) => tracing::warn!(target: "runner", "runner.event_log.encode_failed err={e}"),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let endpoint = env_or(
        "GRUNK_LLM_ENDPOINT",
        "http://127.0.0.1:11434/api/generate",
    );
    let model = env_or("GRUNK_LLM_MODEL", "llama3");
    let frotz_config_path = env_or("GRUNK_FROTZ_CONFIG", "config/frotz.toml");
    let max_turns: u64 = std::env::var("GRUNK_MAX_TURNS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(40);
    let event_log = std::env::var("GRUNK_EVENT_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let frotz_config: FrotzConfig = ConfigLoader::parse_from_file(&frotz_config_path)?;
    let game = FrotzProcess::spawn(&frotz_config)?;

    let episode_config = EpisodeConfig {
        max_turns,
        proposer_timeout: Duration::from_secs(
            std::env::var("GRUNK_PROPOSER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        ),
        ..EpisodeConfig::default()
    };
    let proposer = OllamaProposer {
        client: OllamaClient::new(OllamaConfig { endpoint, model }),
        system_prompt: episode_config.system_prompt.clone(),
        prompt_cfg: PromptConfig::default(),
    };

    let mut episode = Episode::new(episode_config);
    let report = match event_log.as_deref() {
        Some(path) => {
            let mut sink = JsonlSink::create(path)?;
            episode.run(&game, &proposer, &mut sink).await
        }
        None => episode.run(&game, &proposer, &mut NullSink).await,
    };
    game.shutdown().await.ok();

    let evaluation = eval::evaluate(&report);
    tracing::info!(
        target: "runner",
        "runner.episode.finished outcome={:?} turns={} score={}",
        report.outcome,
        report.turns_played,
        report.score
    );

    println!(
        "outcome: {:?} | turns: {} | score: {}",
        report.outcome, report.turns_played, report.score
    );
    println!(
        "achievements: {}/{}",
        evaluation.earned, evaluation.total
    );
    for achievement in &evaluation.achievements {
        let mark = if achievement.earned { "x" } else { " " };
        println!("  [{mark}] {} - {}", achievement.name, achievement.description);
    }
    Ok(())
}
