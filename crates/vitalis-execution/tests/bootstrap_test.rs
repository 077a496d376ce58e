use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vitalis_application::SendOutcome;
use vitalis_core::generation::{GenerationResult, GenerationService, HistoryTurn};
use vitalis_core::message::PayloadKind;
use vitalis_core::session::ToolResponse;
use vitalis_execution::bootstrap_conversation;
use vitalis_infrastructure::{ConfigService, InMemorySessionTransport};

struct CannedGeneration;

#[async_trait]
impl GenerationService for CannedGeneration {
    async fn generate_recipe(&self, _: &str, _: &[HistoryTurn], _: &CancellationToken) -> GenerationResult {
        Ok(ToolResponse::new("Receta").with_data(json!({"recipe": {"title": "Avena"}})))
    }

    async fn generate_exercise(&self, _: &str, _: &[HistoryTurn], _: &CancellationToken) -> GenerationResult {
        Ok(ToolResponse::new("Ejercicio"))
    }

    async fn generate_full_routine(&self, _: &str, _: &[HistoryTurn], _: &CancellationToken) -> GenerationResult {
        Ok(ToolResponse::new("Rutina"))
    }

    async fn generate_meal_plan(&self, _: &str, _: &[HistoryTurn], _: &CancellationToken) -> GenerationResult {
        Ok(ToolResponse::new("Plan"))
    }

    async fn generate_motivational_support(
        &self,
        _: &str,
        _: &[HistoryTurn],
        _: &CancellationToken,
    ) -> GenerationResult {
        Ok(ToolResponse::new("¡Tú puedes!"))
    }
}

#[tokio::test]
async fn test_bootstrap_uses_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "page_size = 4\ngreeting = \"Hola de prueba\"\n").unwrap();

    let conversation = bootstrap_conversation(
        Arc::new(CannedGeneration),
        Arc::new(InMemorySessionTransport::new()),
        &ConfigService::with_path(&path),
    )
    .await
    .unwrap();

    assert_eq!(conversation.config().page_size, 4);
    conversation.start().await.unwrap();

    let messages = conversation.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text.as_deref(), Some("Hola de prueba"));
}

#[tokio::test]
async fn test_bootstrapped_conversation_answers() {
    let dir = tempfile::tempdir().unwrap();
    let conversation = bootstrap_conversation(
        Arc::new(CannedGeneration),
        Arc::new(InMemorySessionTransport::new()),
        &ConfigService::with_path(dir.path().join("missing.toml")),
    )
    .await
    .unwrap();
    conversation.start().await.unwrap();

    let outcome = conversation.send("Quiero una receta").await.unwrap();
    assert!(matches!(outcome, SendOutcome::Committed { .. }));

    let last = conversation.messages().await.pop().unwrap();
    assert_eq!(last.payload.map(|p| p.kind()), Some(PayloadKind::Recipe));
    conversation.shutdown().await;
}
