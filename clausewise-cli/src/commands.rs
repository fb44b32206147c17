//! CLI subcommand handlers.

use crate::render;
use crate::{Commands, ConfigAction};
use anyhow::Context;
use clausewise_core::config::{ClausewiseConfig, config_exists, load_config};
use clausewise_core::error::ConfigError;
use clausewise_core::index::VectorIndex;
use clausewise_core::presets;
use clausewise_core::{
    ComplianceResponse, GenerationBackend, QaResponse, ReasoningOrchestrator, RuleRegistry,
    Severity, create_backend, create_embedder,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Global flags that affect every subcommand.
#[derive(Debug, Default)]
pub struct Options {
    pub model: Option<String>,
    pub json: bool,
}

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    options: &Options,
) -> anyhow::Result<()> {
    match command {
        Commands::Check {
            query,
            preset,
            top_k,
        } => {
            let query = resolve_query(query, preset.as_deref())?;
            handle_check(&query, top_k, workspace, options).await
        }
        Commands::Ask { question, top_k } => handle_ask(&question, top_k, workspace, options).await,
        Commands::Rules { severity } => handle_rules(&severity, workspace, options),
        Commands::Presets => emit(options, render::presets_report(), render::presets_json()),
        Commands::Config { action } => handle_config(action, workspace, options),
    }
}

fn resolve_query(query: Option<String>, preset: Option<&str>) -> anyhow::Result<String> {
    if let Some(slug) = preset {
        let suggested = presets::find(slug).with_context(|| {
            let known: Vec<&str> = presets::SUGGESTED_QUERIES.iter().map(|q| q.slug).collect();
            format!("Unknown preset '{}'. Available: {}", slug, known.join(", "))
        })?;
        return Ok(suggested.query.to_string());
    }
    query.context("A compliance query or --preset is required")
}

fn load_settings(workspace: &Path, options: &Options) -> anyhow::Result<ClausewiseConfig> {
    if !config_exists(Some(workspace)) {
        info!("No configuration file found; using defaults and CLAUSEWISE_* environment");
    }
    let mut config = load_config(Some(workspace), None).map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })?;
    if let Some(model) = &options.model {
        config.llm.model = model.clone();
    }
    for warning in config.llm.validate() {
        warn!("{}", warning);
    }
    Ok(config)
}

fn load_registry(config: &ClausewiseConfig, workspace: &Path) -> anyhow::Result<RuleRegistry> {
    let rules_path = config.data.rules_file(workspace)?;
    Ok(RuleRegistry::from_path(&rules_path)?)
}

fn build_orchestrator(
    config: &ClausewiseConfig,
    workspace: &Path,
) -> anyhow::Result<ReasoningOrchestrator> {
    let registry = load_registry(config, workspace)?;
    let (_, index_path) = config.data.resolve(workspace);
    let embedder = create_embedder(&config.embedding)?;
    let index = VectorIndex::open(&index_path, embedder)?;
    let backend = create_backend(&config.llm)?;

    info!(
        rules = registry.len(),
        passages = index.len(),
        backend = backend.name(),
        "Resources loaded"
    );
    Ok(ReasoningOrchestrator::new(
        Arc::new(registry),
        Arc::new(index),
        backend,
    ))
}

async fn handle_check(
    query: &str,
    top_k: Option<usize>,
    workspace: &Path,
    options: &Options,
) -> anyhow::Result<()> {
    let config = load_settings(workspace, options)?;
    let k = top_k.unwrap_or(config.retrieval.top_k);
    let orchestrator = build_orchestrator(&config, workspace)?;

    let response = ComplianceResponse::from(orchestrator.check_compliance(query, k).await?);
    emit(
        options,
        render::compliance_report(&response),
        render::ok_envelope(&response)?,
    )
}

async fn handle_ask(
    question: &str,
    top_k: Option<usize>,
    workspace: &Path,
    options: &Options,
) -> anyhow::Result<()> {
    let config = load_settings(workspace, options)?;
    let k = top_k.unwrap_or(config.retrieval.top_k);
    let orchestrator = build_orchestrator(&config, workspace)?;

    let response = QaResponse::from(orchestrator.answer_question(question, k).await?);
    emit(
        options,
        render::answer_report(&response),
        render::ok_envelope(&response)?,
    )
}

fn handle_rules(severity: &[Severity], workspace: &Path, options: &Options) -> anyhow::Result<()> {
    let config = load_settings(workspace, options)?;
    let registry = load_registry(&config, workspace)?;
    let selected = if severity.is_empty() {
        registry.iter().collect::<Vec<_>>()
    } else {
        registry.filter_by_severity(severity)
    };
    emit(
        options,
        render::rules_report(&selected),
        render::ok_envelope(&selected)?,
    )
}

fn handle_config(action: ConfigAction, workspace: &Path, options: &Options) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".clausewise");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&ClausewiseConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_settings(workspace, options)?;
            emit(
                options,
                toml::to_string_pretty(&config)?,
                render::ok_envelope(&config)?,
            )
        }
    }
}

fn emit(options: &Options, report: String, json: String) -> anyhow::Result<()> {
    if options.json {
        println!("{}", json);
    } else {
        print!("{}", report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_query_prefers_preset() {
        let query = resolve_query(None, Some("termination")).unwrap();
        assert_eq!(query, "What are the termination provisions in the contracts?");
    }

    #[test]
    fn test_resolve_query_unknown_preset_lists_choices() {
        let err = resolve_query(None, Some("warranty")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("warranty"));
        assert!(message.contains("governing-law"));
    }

    #[test]
    fn test_resolve_query_plain() {
        assert_eq!(
            resolve_query(Some("Is there a cap?".into()), None).unwrap(),
            "Is there a cap?"
        );
        assert!(resolve_query(None, None).is_err());
    }

    #[test]
    fn test_missing_rules_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_registry(&ClausewiseConfig::default(), dir.path()).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_load_registry_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data/compliance_rules.json"),
            r#"{"R1": {"name": "Party ID", "description": "d", "severity": "HIGH",
                "check": "c", "remediation": "r"}}"#,
        )
        .unwrap();

        let registry = load_registry(&ClausewiseConfig::default(), dir.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("R1").unwrap().severity, Severity::High);
    }

    #[test]
    fn test_missing_index_fails_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/compliance_rules.json"), "{}").unwrap();

        let mut config = ClausewiseConfig::default();
        config.llm.provider = "mock".into();
        let err = build_orchestrator(&config, dir.path()).err().unwrap();
        assert!(err.to_string().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_check_with_mock_backend() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/compliance_rules.json"), "{}").unwrap();

        let mut config = ClausewiseConfig::default();
        config.llm.provider = "mock".into();
        let embedder = create_embedder(&config.embedding).unwrap();
        VectorIndex::build(
            embedder,
            vec![("Party A is Acme Corp.".to_string(), "c1.txt".to_string())],
        )
        .await
        .unwrap()
        .save(&dir.path().join("models/vectorstore"))
        .unwrap();

        let orchestrator = build_orchestrator(&config, dir.path()).unwrap();
        let result = orchestrator.check_compliance("Who are the parties?", 5).await.unwrap();
        assert_eq!(result.sources, vec!["c1.txt"]);
        assert_eq!(result.source_count, Some(1));
    }
}
