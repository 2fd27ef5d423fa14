use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_tools::{async_trait, FileConverter, FileFormat, SearchHit, ToolError, Toolbox, WebSearch};
use chrono::{TimeZone, Utc};
use knowledge::KnowledgeError;
use mock_brain::{EchoBrain, FailingBrain, FailureKind, ScriptedBrain};
use orchestrator::{
    Attachment, BrainError, Caller, ContextKind, Mode, NewReminder, OrchestratorConfig,
    OrchestratorError, ReminderStore, ScoredPassage, TurnOrchestrator, TurnRequest, VectorIndex,
    DatabaseReminderStore, KNOWLEDGE_CONTEXT_HEADER, MAX_TITLE_CHARS, REMINDER_UNAVAILABLE_NOTICE,
    SIGN_IN_NOTICE,
};

struct RecordingConverter {
    calls: Mutex<Vec<(FileFormat, FileFormat)>>,
}

impl RecordingConverter {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(FileFormat, FileFormat)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileConverter for RecordingConverter {
    async fn convert(
        &self,
        _data: &[u8],
        source: &FileFormat,
        target: &FileFormat,
    ) -> Result<Vec<u8>, ToolError> {
        self.calls.lock().unwrap().push((source.clone(), target.clone()));
        Ok(format!("{}->{}", source, target).into_bytes())
    }
}

struct FixedIndex {
    passages: Vec<ScoredPassage>,
}

#[async_trait]
impl VectorIndex for FixedIndex {
    async fn similarity_search(
        &self,
        _query: &str,
        k: usize,
    ) -> Result<Vec<ScoredPassage>, KnowledgeError> {
        Ok(self.passages.iter().take(k).cloned().collect())
    }

    fn len(&self) -> usize {
        self.passages.len()
    }
}

struct FixedSearch;

#[async_trait]
impl WebSearch for FixedSearch {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchHit>, ToolError> {
        Ok(vec![SearchHit {
            title: format!("About {}", query),
            url: "https://news.example.com/1".to_string(),
            snippet: "Fresh snippet".to_string(),
        }])
    }
}

#[derive(Default)]
struct MemoryReminderStore {
    saved: Mutex<Vec<(String, NewReminder)>>,
}

#[async_trait]
impl ReminderStore for MemoryReminderStore {
    async fn create_reminder(
        &self,
        user_id: &str,
        reminder: &NewReminder,
    ) -> Result<i64, OrchestratorError> {
        let mut saved = self.saved.lock().unwrap();
        saved.push((user_id.to_string(), reminder.clone()));
        Ok(saved.len() as i64)
    }
}

struct BrokenReminderStore;

#[async_trait]
impl ReminderStore for BrokenReminderStore {
    async fn create_reminder(
        &self,
        _user_id: &str,
        _reminder: &NewReminder,
    ) -> Result<i64, OrchestratorError> {
        Err(OrchestratorError::Configuration("disk full".to_string()))
    }
}

fn passage(score: f32, text: &str) -> ScoredPassage {
    ScoredPassage {
        source: "handbook.md#0".to_string(),
        text: text.to_string(),
        score,
    }
}

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig::default()
        .with_backoff_base(Duration::from_millis(1))
        .with_primary_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_plain_chat_echoes_through_primary() {
    let orchestrator = TurnOrchestrator::new(Arc::new(EchoBrain::new()));

    let envelope = orchestrator
        .process(&TurnRequest::new("Hello there"), &Caller::anonymous())
        .await
        .unwrap();

    assert_eq!(envelope.reply, "Hello there");
    assert_eq!(envelope.mode, Mode::NormalChat);
    assert_eq!(envelope.provider.as_deref(), Some("EchoBrain"));
    assert_eq!(envelope.context, ContextKind::None);
    assert!(!envelope.fell_back);
    assert!(envelope.image_url.is_none());
}

#[tokio::test]
async fn test_code_block_routes_to_coding_help() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Use an iterator."));
    let orchestrator = TurnOrchestrator::new(brain.clone());

    let turn = TurnRequest::new("why is this slow?\n```\nfor i in 0..n { v.push(i) }\n```");
    let envelope = orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    assert_eq!(envelope.mode, Mode::CodingHelp);
    let request = brain.last_request().unwrap();
    assert!(request
        .system_instruction
        .unwrap()
        .contains("MODE: Coding help"));
}

#[tokio::test]
async fn test_attachment_always_selects_file_mode() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("It lists quarterly revenue."));
    let orchestrator = TurnOrchestrator::new(brain.clone());

    let turn = TurnRequest::new("what does this say?")
        .with_mode(Mode::CodingHelp)
        .with_attachment(Attachment::new("q3.pdf", "application/pdf", b"%PDF".to_vec()));
    let envelope = orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    assert_eq!(envelope.mode, Mode::FileAnalysis);
    assert_eq!(brain.last_request().unwrap().inline_count(), 1);
}

#[tokio::test]
async fn test_relevant_passages_are_retrieved() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Thirty days."));
    let index = Arc::new(FixedIndex {
        passages: vec![
            passage(0.9, "Refunds take 30 days."),
            passage(0.72, "Refunds go to the original card."),
            passage(0.5, "Our office is in Lisbon."),
            passage(0.3, "We were founded in 2019."),
        ],
    });
    let orchestrator = TurnOrchestrator::new(brain.clone()).with_index(index);

    let envelope = orchestrator
        .process(&TurnRequest::new("how long do refunds take?"), &Caller::anonymous())
        .await
        .unwrap();

    assert_eq!(envelope.context, ContextKind::Retrieved);
    let sent = brain.last_request().unwrap().user_text();
    assert!(sent.contains(KNOWLEDGE_CONTEXT_HEADER));
    assert!(sent.contains("Refunds take 30 days."));
    assert!(sent.contains("Refunds go to the original card."));
    assert!(!sent.contains("Lisbon"));
    assert!(!sent.contains("2019"));
}

#[tokio::test]
async fn test_explicit_context_skips_retrieval() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("ok"));
    let index = Arc::new(FixedIndex {
        passages: vec![passage(0.95, "Knowledge base passage.")],
    });
    let orchestrator = TurnOrchestrator::new(brain.clone()).with_index(index);

    let turn = TurnRequest::new("summarize").with_context("Caller supplied notes.");
    let envelope = orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    assert_eq!(envelope.context, ContextKind::Explicit);
    let sent = brain.last_request().unwrap().user_text();
    assert!(sent.contains("Caller supplied notes."));
    assert!(!sent.contains("Knowledge base passage."));
}

#[tokio::test]
async fn test_image_directive_is_extracted_and_dispatched() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply(
        r#"Sure! Here you go: {"action": "generate_image", "prompt": "a red fox"} Enjoy."#,
    ));
    let orchestrator = TurnOrchestrator::new(brain);

    let envelope = orchestrator
        .process(&TurnRequest::new("draw a red fox"), &Caller::anonymous())
        .await
        .unwrap();

    assert_eq!(envelope.reply, "Sure! Here you go:  Enjoy.");
    assert!(envelope.image_url.unwrap().contains("a%20red%20fox"));
    assert!(envelope.video_url.is_none());
}

#[tokio::test]
async fn test_bare_directive_gets_default_reply() {
    let brain = Arc::new(
        ScriptedBrain::new("primary").reply(r#"{"action": "generate_image", "prompt": "sunset"}"#),
    );
    let orchestrator = TurnOrchestrator::new(brain);

    let envelope = orchestrator
        .process(&TurnRequest::new("draw a sunset"), &Caller::anonymous())
        .await
        .unwrap();

    assert_eq!(envelope.reply, "Here's your image!");
    assert!(envelope.image_url.is_some());
}

#[tokio::test]
async fn test_reply_without_directive_has_no_side_effect() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Paris is the capital of France."));
    let orchestrator = TurnOrchestrator::new(brain);

    let envelope = orchestrator
        .process(&TurnRequest::new("capital of France?"), &Caller::anonymous())
        .await
        .unwrap();

    assert_eq!(envelope.reply, "Paris is the capital of France.");
    assert!(envelope.image_url.is_none());
    assert!(envelope.video_url.is_none());
    assert!(envelope.conversion.is_none());
}

#[tokio::test]
async fn test_legacy_markdown_image_sets_url() {
    let brain = Arc::new(
        ScriptedBrain::new("primary").reply("Here: ![fox](https://img.example.com/fox.png)"),
    );
    let orchestrator = TurnOrchestrator::new(brain);

    let envelope = orchestrator
        .process(&TurnRequest::new("show me a fox"), &Caller::anonymous())
        .await
        .unwrap();

    assert_eq!(
        envelope.image_url.as_deref(),
        Some("https://img.example.com/fox.png")
    );
}

#[tokio::test]
async fn test_failing_alternate_falls_back_to_primary_once() {
    let primary = Arc::new(ScriptedBrain::new("primary").reply("from primary"));
    let alternate = Arc::new(FailingBrain::new("groq", FailureKind::Server));
    let orchestrator = TurnOrchestrator::new(primary.clone()).with_alternate(alternate.clone());

    let turn = TurnRequest::new("hi").with_provider("groq");
    let envelope = orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    assert_eq!(envelope.reply, "from primary");
    assert_eq!(envelope.provider.as_deref(), Some("primary"));
    assert!(envelope.fell_back);
    assert_eq!(alternate.call_count(), 1);
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn test_primary_failure_fails_the_turn() {
    let primary = Arc::new(FailingBrain::new("primary", FailureKind::Unauthorized));
    let orchestrator = TurnOrchestrator::new(primary.clone()).with_config(fast_config());

    let result = orchestrator
        .process(&TurnRequest::new("hello"), &Caller::anonymous())
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.provider, "primary");
    assert_eq!(err.attempts, 1);
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn test_rate_limited_primary_is_retried() {
    let primary = Arc::new(
        ScriptedBrain::new("primary")
            .fail(BrainError::RateLimited("slow down".to_string()))
            .reply("second try"),
    );
    let orchestrator = TurnOrchestrator::new(primary.clone()).with_config(fast_config());

    let envelope = orchestrator
        .process(&TurnRequest::new("hello"), &Caller::anonymous())
        .await
        .unwrap();

    assert_eq!(envelope.reply, "second try");
    assert_eq!(primary.call_count(), 2);
}

#[tokio::test]
async fn test_conversion_without_directive_uses_extension() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("I can't help with that."));
    let converter = Arc::new(RecordingConverter::new());
    let orchestrator = TurnOrchestrator::new(brain)
        .with_toolbox(Toolbox::new().with_converter(converter.clone()));

    let turn = TurnRequest::new("convert this please")
        .with_attachment(Attachment::new("report.pdf", "application/pdf", b"%PDF".to_vec()));
    let envelope = orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    assert_eq!(converter.calls(), vec![(FileFormat::Pdf, FileFormat::Docx)]);
    let conversion = envelope.conversion.unwrap();
    assert_eq!(conversion.file_name, "report.docx");
    assert_eq!(conversion.data, b"pdf->docx".to_vec());
}

#[tokio::test]
async fn test_conversion_end_to_end() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply(
        r#"{"action":"file_conversion","source_format":"docx","target_format":"pdf","original_filename":"notes.docx"}"#,
    ));
    let converter = Arc::new(RecordingConverter::new());
    let orchestrator = TurnOrchestrator::new(brain.clone())
        .with_toolbox(Toolbox::new().with_converter(converter.clone()));

    let docx = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    let turn = TurnRequest::new("convert this to pdf")
        .with_attachment(Attachment::new("notes.docx", docx, b"PK".to_vec()));
    let envelope = orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    assert_eq!(envelope.mode, Mode::FileConversion);
    let conversion = envelope.conversion.unwrap();
    assert_eq!(conversion.file_name, "notes.pdf");
    assert_eq!(conversion.media_type, "application/pdf");
    assert!(envelope.reply.starts_with("Done! I converted notes.docx to PDF."));
    assert!(envelope.image_url.is_none());
    assert!(envelope.video_url.is_none());

    let request = brain.last_request().unwrap();
    assert!(request.json_output);
    assert_eq!(request.inline_count(), 0);
}

#[tokio::test]
async fn test_conversion_planning_failure_still_converts() {
    let brain = Arc::new(FailingBrain::new("primary", FailureKind::Unauthorized));
    let converter = Arc::new(RecordingConverter::new());
    let orchestrator = TurnOrchestrator::new(brain)
        .with_config(fast_config())
        .with_toolbox(Toolbox::new().with_converter(converter.clone()));

    let turn = TurnRequest::new("convert to pdf")
        .with_attachment(Attachment::new("sheet.xlsx", "application/octet-stream", vec![1, 2]));
    let envelope = orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    assert_eq!(converter.calls(), vec![(FileFormat::Xlsx, FileFormat::Pdf)]);
    assert!(envelope.conversion.is_some());
    assert!(envelope.provider.is_none());
}

#[tokio::test]
async fn test_reminder_saved_for_signed_in_caller() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Got it, I'll remind you."));
    let store = Arc::new(MemoryReminderStore::default());
    let orchestrator = TurnOrchestrator::new(brain.clone()).with_reminder_store(store.clone());

    let turn = TurnRequest::new("remind me to call mom at 6 pm");
    let envelope = orchestrator
        .process_at(&turn, &Caller::authenticated("user-7"), now)
        .await
        .unwrap();

    let saved = store.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "user-7");
    assert_eq!(saved[0].1.title, "call mom");
    assert_eq!(saved[0].1.remind_at, "2026-10-18T18:00:00Z");
    assert_eq!(envelope.reminder_id, Some(1));
    assert_eq!(
        envelope.voice_confirmation.as_deref(),
        Some("Reminder set: call mom at 18:00")
    );
    assert!(brain.last_request().unwrap().user_text().contains("[TURN NOTES]"));
}

#[tokio::test]
async fn test_long_reminder_title_is_still_saved() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
    let database = database::Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    database.migrate().await.unwrap();
    let store = Arc::new(DatabaseReminderStore::new(database));
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Noted."));
    let orchestrator = TurnOrchestrator::new(brain).with_reminder_store(store.clone());

    let text = format!(
        "remind me in 10 minutes to {}",
        "pick up the groceries and the dry cleaning ".repeat(10)
    );
    let envelope = orchestrator
        .process_at(&TurnRequest::new(text), &Caller::authenticated("user-7"), now)
        .await
        .unwrap();

    let id = envelope.reminder_id.unwrap();
    assert!(!envelope.reply.contains(REMINDER_UNAVAILABLE_NOTICE));
    let saved = database::reminder::get_reminder(store.database().pool(), id)
        .await
        .unwrap();
    assert!(saved.title.starts_with("pick up the groceries"));
    assert!(saved.title.chars().count() <= MAX_TITLE_CHARS);
    assert_eq!(saved.remind_at, "2026-10-18T10:10:00Z");
}

#[tokio::test]
async fn test_reminder_requires_sign_in() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Sure."));
    let store = Arc::new(MemoryReminderStore::default());
    let orchestrator = TurnOrchestrator::new(brain).with_reminder_store(store.clone());

    let envelope = orchestrator
        .process_at(&TurnRequest::new("remind me to call mom at 6 pm"), &Caller::anonymous(), now)
        .await
        .unwrap();

    assert!(store.saved.lock().unwrap().is_empty());
    assert!(envelope.reminder_id.is_none());
    assert!(envelope.reply.ends_with(SIGN_IN_NOTICE));
}

#[tokio::test]
async fn test_reminder_store_failure_degrades() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Sure."));
    let orchestrator =
        TurnOrchestrator::new(brain).with_reminder_store(Arc::new(BrokenReminderStore));

    let envelope = orchestrator
        .process_at(
            &TurnRequest::new("remind me in 10 minutes to stretch"),
            &Caller::authenticated("user-7"),
            now,
        )
        .await
        .unwrap();

    assert!(envelope.reminder_id.is_none());
    assert!(envelope.reply.ends_with(REMINDER_UNAVAILABLE_NOTICE));
}

#[tokio::test]
async fn test_web_search_results_are_prepended() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Here is the latest."));
    let orchestrator = TurnOrchestrator::new(brain.clone())
        .with_toolbox(Toolbox::new().with_search(Arc::new(FixedSearch)));

    orchestrator
        .process(&TurnRequest::new("what's the latest news on mars rovers"), &Caller::anonymous())
        .await
        .unwrap();

    let sent = brain.last_request().unwrap().user_text();
    assert!(sent.starts_with("[WEB SEARCH RESULTS]"));
    assert!(sent.contains("Source: https://news.example.com/1"));
}

#[tokio::test]
async fn test_caller_instruction_is_appended() {
    let brain = Arc::new(ScriptedBrain::new("primary").reply("Ahoy."));
    let orchestrator = TurnOrchestrator::new(brain.clone());

    let turn = TurnRequest::new("hello").with_system_instruction("Talk like a pirate.");
    orchestrator.process(&turn, &Caller::anonymous()).await.unwrap();

    let system = brain.last_request().unwrap().system_instruction.unwrap();
    assert!(system.contains("ADDITIONAL INSTRUCTIONS:\nTalk like a pirate."));
}
