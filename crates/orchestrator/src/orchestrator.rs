//! Turn orchestrator that coordinates one assistant turn end to end.

use std::fmt;
use std::sync::Arc;

use agent_tools::{truncate_utf8, Toolbox};
use brain_core::{Attachment, Brain, ContentPart, GenerationRequest};
use chrono::{DateTime, Utc};
use compat_brain::{provider_names_from_env, CompatBrain};
use database::{Database, NewReminder};
use gemini_brain::GeminiBrain;
use knowledge::{KnowledgeBase, KnowledgeConfig, VectorIndex};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::actions::{ActionDirective, ActionDispatcher, SideEffectResult};
use crate::config::OrchestratorConfig;
use crate::context::Context;
use crate::dispatcher::{GenerationResult, ProviderDispatcher};
use crate::envelope::{ConvertedFile, ResponseEnvelope};
use crate::error::{GenerationError, OrchestratorError};
use crate::extractor::extract_action;
use crate::intent::{detect_reminder, detect_web_search, resolve_language};
use crate::mode::{resolve_mode, Mode};
use crate::prompts::PromptLibrary;
use crate::reminders::{DatabaseReminderStore, ReminderStore};
use crate::retrieval::{ContextKind, RetrievalRouter};
use crate::turn::{Caller, TurnRequest};

/// Shown to anonymous callers who ask for a reminder.
pub const SIGN_IN_NOTICE: &str =
    "I can't save reminders until you sign in. Please log in and ask me again.";

/// Shown when a reminder could not be persisted.
pub const REMINDER_UNAVAILABLE_NOTICE: &str =
    "I couldn't save that reminder right now. Please try again later.";

const DEFAULT_CONVERSION_TEXT: &str = "Convert the attached file.";
const DEFAULT_IMAGE_REPLY: &str = "Here's your image!";
const DEFAULT_VIDEO_REPLY: &str = "Here's your video!";

/// Old-style `![alt](url)` image links some models still emit.
static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[[^\]]*\]\((https?://[^)\s]+)\)").expect("markdown image pattern")
});

/// Stages a turn moves through, in order.
///
/// `ConvertFile` replaces `Generate`, `ExtractAction` and `DispatchAction`
/// for `FILE_CONVERSION` turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Classify,
    DetectIntents,
    ResolveContext,
    ConvertFile,
    Generate,
    ExtractAction,
    DispatchAction,
    Respond,
}

impl TurnStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::DetectIntents => "detect_intents",
            Self::ResolveContext => "resolve_context",
            Self::ConvertFile => "convert_file",
            Self::Generate => "generate",
            Self::ExtractAction => "extract_action",
            Self::DispatchAction => "dispatch_action",
            Self::Respond => "respond",
        }
    }
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a turn has learned so far.
struct TurnState {
    stage: TurnStage,
    mode: Mode,
    language: String,
    context: Context,
    context_kind: ContextKind,
    reply: String,
    image_url: Option<String>,
    legacy_image_url: Option<String>,
    video_url: Option<String>,
    conversion: Option<ConvertedFile>,
    voice_confirmation: Option<String>,
    reminder_id: Option<i64>,
    provider: Option<String>,
    fell_back: bool,
    notices: Vec<String>,
}

impl TurnState {
    fn new(mode: Mode, language: String) -> Self {
        Self {
            stage: TurnStage::Classify,
            mode,
            language,
            context: Context::new(),
            context_kind: ContextKind::None,
            reply: String::new(),
            image_url: None,
            legacy_image_url: None,
            video_url: None,
            conversion: None,
            voice_confirmation: None,
            reminder_id: None,
            provider: None,
            fell_back: false,
            notices: Vec::new(),
        }
    }

    fn enter(&mut self, stage: TurnStage) {
        debug!(from = %self.stage, to = %stage, "Turn stage");
        self.stage = stage;
    }

    fn record_generation(&mut self, generation: &GenerationResult) {
        self.provider = Some(generation.provider.clone());
        self.fell_back = generation.fell_back;
    }

    fn apply(&mut self, effect: SideEffectResult) {
        if effect.image_url.is_some() {
            self.image_url = effect.image_url;
        }
        if effect.video_url.is_some() {
            self.video_url = effect.video_url;
        }
        if effect.conversion.is_some() {
            self.conversion = effect.conversion;
        }
        if let Some(reply) = effect.reply {
            self.reply = reply;
        }
    }

    fn into_envelope(self) -> ResponseEnvelope {
        let mut builder = ResponseEnvelope::builder(self.mode, self.language)
            .reply(self.reply)
            .image_url(self.image_url)
            .image_url_if_unset(self.legacy_image_url)
            .video_url(self.video_url)
            .conversion(self.conversion)
            .voice_confirmation(self.voice_confirmation)
            .provider(self.provider, self.fell_back)
            .context(self.context_kind)
            .reminder_id(self.reminder_id);
        for notice in self.notices {
            builder = builder.notice(notice);
        }
        builder.build()
    }
}

/// Runs assistant turns: classify, gather context, generate, act, respond.
///
/// The only error a turn can return is [`GenerationError`]. Every other
/// collaborator failure (search, retrieval, reminders, media tools) degrades
/// the turn instead of failing it.
pub struct TurnOrchestrator {
    config: OrchestratorConfig,
    prompts: PromptLibrary,
    dispatcher: ProviderDispatcher,
    retrieval: RetrievalRouter,
    actions: ActionDispatcher,
    reminders: Option<Arc<dyn ReminderStore>>,
    knowledge_base: Option<Arc<KnowledgeBase>>,
    database: Option<Database>,
}

impl TurnOrchestrator {
    /// Create an orchestrator around a primary provider with default
    /// configuration, no knowledge base, no tools and no reminder store.
    pub fn new(primary: Arc<dyn Brain>) -> Self {
        let config = OrchestratorConfig::default();
        Self {
            dispatcher: ProviderDispatcher::new(primary).with_policy(config.retry_policy()),
            retrieval: RetrievalRouter::new(None)
                .with_top_k(config.retrieval_top_k)
                .with_threshold(config.relevance_threshold),
            prompts: PromptLibrary::default(),
            actions: ActionDispatcher::default(),
            reminders: None,
            knowledge_base: None,
            database: None,
            config,
        }
    }

    /// Create an orchestrator from environment variables.
    ///
    /// - Primary provider: `GEMINI_*` (see `gemini-brain`)
    /// - Alternates: `ALTERNATE_PROVIDERS` (see `compat-brain`); ones that
    ///   fail to configure are skipped with a warning
    /// - Tools: see `agent-tools`
    /// - Knowledge base: `KB_PATH` and `EMBEDDING_*` (see `knowledge`)
    /// - Reminders: `DATABASE_URL`; reminders are unavailable when unset
    /// - Tuning: `ASSISTANT_*` (see [`OrchestratorConfig::from_env`])
    pub async fn from_env() -> Result<Self, OrchestratorError> {
        let config = OrchestratorConfig::from_env();
        let prompts = PromptLibrary::from_env();

        let primary = GeminiBrain::from_env().map_err(|e| {
            OrchestratorError::Configuration(format!("Failed to create primary provider: {}", e))
        })?;
        let toolbox = Toolbox::from_env()?;

        let knowledge_base = Arc::new(KnowledgeConfig::from_env().open().await?);
        info!(passages = knowledge_base.len(), "Knowledge base ready");

        let mut orchestrator = Self::new(Arc::new(primary))
            .with_config(config)
            .with_prompts(prompts)
            .with_toolbox(toolbox)
            .with_knowledge_base(knowledge_base);

        for name in provider_names_from_env() {
            match CompatBrain::from_env(&name) {
                Ok(brain) => {
                    info!(provider = %name, "Registered alternate provider");
                    orchestrator.dispatcher =
                        orchestrator.dispatcher.with_named_alternate(name, Arc::new(brain));
                }
                Err(e) => warn!(provider = %name, "Skipping alternate provider: {}", e),
            }
        }

        match Database::from_env().await? {
            Some(database) => {
                orchestrator = orchestrator
                    .with_reminder_store(Arc::new(DatabaseReminderStore::new(database.clone())));
                orchestrator.database = Some(database);
            }
            None => info!("DATABASE_URL not set, reminders are disabled"),
        }

        Ok(orchestrator)
    }

    /// Replace the tuning parameters.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.dispatcher = self.dispatcher.with_policy(config.retry_policy());
        self.retrieval = self
            .retrieval
            .with_top_k(config.retrieval_top_k)
            .with_threshold(config.relevance_threshold);
        self.config = config;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    /// Register an alternate provider under its own name.
    pub fn with_alternate(mut self, brain: Arc<dyn Brain>) -> Self {
        self.dispatcher = self.dispatcher.with_alternate(brain);
        self
    }

    pub fn with_toolbox(mut self, toolbox: Toolbox) -> Self {
        self.actions = ActionDispatcher::new(toolbox);
        self
    }

    /// Use `index` for retrieval.
    pub fn with_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.retrieval = RetrievalRouter::new(Some(index))
            .with_top_k(self.config.retrieval_top_k)
            .with_threshold(self.config.relevance_threshold);
        self
    }

    /// Use a knowledge base for retrieval and close it on shutdown.
    pub fn with_knowledge_base(mut self, knowledge_base: Arc<KnowledgeBase>) -> Self {
        let index: Arc<dyn VectorIndex> = knowledge_base.clone();
        self.knowledge_base = Some(knowledge_base);
        self.with_index(index)
    }

    pub fn with_reminder_store(mut self, store: Arc<dyn ReminderStore>) -> Self {
        self.reminders = Some(store);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    pub fn dispatcher(&self) -> &ProviderDispatcher {
        &self.dispatcher
    }

    /// Passages currently searchable.
    pub fn knowledge_base_size(&self) -> usize {
        self.retrieval.knowledge_base_size()
    }

    /// Release the knowledge base and database pool.
    pub async fn shutdown(&self) {
        if let Some(kb) = &self.knowledge_base {
            kb.close().await;
        }
        if let Some(database) = &self.database {
            database.close().await;
        }
        info!("Orchestrator shut down");
    }

    /// Run one turn.
    pub async fn process(
        &self,
        turn: &TurnRequest,
        caller: &Caller,
    ) -> Result<ResponseEnvelope, GenerationError> {
        self.process_at(turn, caller, Utc::now()).await
    }

    /// Run one turn as if the current time were `now`.
    pub async fn process_at(
        &self,
        turn: &TurnRequest,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<ResponseEnvelope, GenerationError> {
        let mode = resolve_mode(turn.mode, &turn.text, &turn.attachments);
        let language = resolve_language(turn.language.as_deref(), &turn.text);
        info!(
            mode = %mode,
            language = %language,
            attachments = turn.attachments.len(),
            authenticated = caller.is_authenticated(),
            "Processing turn"
        );
        let mut state = TurnState::new(mode, language);

        state.enter(TurnStage::DetectIntents);
        self.handle_reminder(turn, caller, now, &mut state).await;
        self.gather_search(turn, &mut state).await;

        state.enter(TurnStage::ResolveContext);
        let bundle = self
            .retrieval
            .resolve_context(turn, self.retrieval.knowledge_base_size())
            .await;
        state.context_kind = bundle.kind();
        state.context.set_bundle(&bundle);

        if mode == Mode::FileConversion {
            state.enter(TurnStage::ConvertFile);
            self.convert_file(turn, &mut state).await;
        } else {
            state.enter(TurnStage::Generate);
            let request = self.build_request(turn, &state).await;
            let generation = self
                .dispatcher
                .generate(&request, turn.alternate_provider())
                .await
                .map_err(|e| {
                    warn!(provider = %e.provider, attempts = e.attempts, "Turn failed: {}", e.source);
                    e
                })?;
            state.record_generation(&generation);

            state.enter(TurnStage::ExtractAction);
            self.act_on_reply(turn, generation.text, &mut state).await;
        }

        state.enter(TurnStage::Respond);
        let envelope = state.into_envelope();
        info!(
            mode = %envelope.mode,
            provider = envelope.provider.as_deref().unwrap_or("none"),
            fell_back = envelope.fell_back,
            context = ?envelope.context,
            image = envelope.image_url.is_some(),
            video = envelope.video_url.is_some(),
            conversion = envelope.conversion.is_some(),
            "Turn complete"
        );
        Ok(envelope)
    }

    /// Detect a reminder and persist it for authenticated callers.
    async fn handle_reminder(
        &self,
        turn: &TurnRequest,
        caller: &Caller,
        now: DateTime<Utc>,
        state: &mut TurnState,
    ) {
        let offset = turn.utc_offset_minutes.unwrap_or(0);
        let Some(intent) = detect_reminder(&turn.text, now, offset) else {
            return;
        };

        let Some(user_id) = caller.user_id() else {
            info!("Reminder requested by anonymous caller, not saved");
            state.notices.push(SIGN_IN_NOTICE.to_string());
            return;
        };

        let Some(store) = &self.reminders else {
            warn!("Reminder requested but no reminder store is configured");
            state.notices.push(REMINDER_UNAVAILABLE_NOTICE.to_string());
            return;
        };

        match store.create_reminder(user_id, &NewReminder::from(&intent)).await {
            Ok(id) => {
                let confirmation = intent.confirmation(now);
                state.context.add_note(format!(
                    "{} It is already saved; confirm it briefly.",
                    confirmation
                ));
                state.voice_confirmation = Some(confirmation);
                state.reminder_id = Some(id);
            }
            Err(e) => {
                warn!("Failed to save reminder: {}", e);
                state.notices.push(REMINDER_UNAVAILABLE_NOTICE.to_string());
            }
        }
    }

    /// Run a web search when the turn asks for fresh information.
    async fn gather_search(&self, turn: &TurnRequest, state: &mut TurnState) {
        let Some(search) = &self.actions.toolbox().search else {
            return;
        };
        let Some(query) = detect_web_search(&turn.text, state.mode) else {
            return;
        };

        let limit = if state.mode == Mode::DeepSearch {
            self.config.deep_search_limit
        } else {
            self.config.search_limit
        };

        match search.search(&query, limit).await {
            Ok(mut hits) => {
                hits.truncate(limit);
                info!(query = %query, results = hits.len(), "Web search complete");
                state.context.add_search_results(&query, hits);
            }
            Err(e) => warn!(query = %query, "Web search failed, continuing without it: {}", e),
        }
    }

    /// The provider request for a non-conversion turn.
    async fn build_request(&self, turn: &TurnRequest, state: &TurnState) -> GenerationRequest {
        let system_instruction = self.prompts.system_instruction(
            state.mode,
            &state.language,
            &turn.attachments,
            turn.system_instruction.as_deref(),
        );

        let mut parts = Vec::new();
        let text = state.context.augment_message(&turn.text);
        if !text.trim().is_empty() {
            parts.push(ContentPart::text(text));
        }

        for attachment in &turn.attachments {
            parts.push(ContentPart::inline(attachment));
        }

        for attachment in turn.attachments.iter().filter(|a| a.is_document()) {
            if let Some(extracted) = self.extract_text(attachment).await {
                parts.push(ContentPart::text(format!(
                    "[EXTRACTED TEXT: {}]\n{}",
                    attachment.file_name, extracted
                )));
            }
        }

        GenerationRequest {
            system_instruction: Some(system_instruction),
            history: turn.history.clone(),
            parts,
            json_output: state.mode.requires_json(),
        }
    }

    async fn extract_text(&self, attachment: &Attachment) -> Option<String> {
        let extractor = self.actions.toolbox().extractor.as_ref()?;
        match extractor
            .extract_text(&attachment.data, &attachment.media_type)
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                let text = text.trim();
                let budget: usize = text
                    .chars()
                    .take(self.config.extracted_text_max_chars)
                    .map(char::len_utf8)
                    .sum();
                Some(truncate_utf8(text, budget))
            }
            Ok(_) => {
                debug!(file = %attachment.file_name, "No text extracted");
                None
            }
            Err(e) => {
                warn!(file = %attachment.file_name, "Text extraction failed: {}", e);
                None
            }
        }
    }

    /// Plan a conversion with the model and run it.
    ///
    /// The model only plans. When it fails or returns no usable directive,
    /// source and target fall back to the file extension.
    async fn convert_file(&self, turn: &TurnRequest, state: &mut TurnState) {
        let text = if turn.text.trim().is_empty() {
            DEFAULT_CONVERSION_TEXT
        } else {
            turn.text.as_str()
        };
        let request = GenerationRequest {
            system_instruction: Some(self.prompts.system_instruction(
                Mode::FileConversion,
                &state.language,
                &turn.attachments,
                None,
            )),
            history: Vec::new(),
            parts: vec![ContentPart::text(text)],
            json_output: true,
        };

        let planned = match self
            .dispatcher
            .generate(&request, turn.alternate_provider())
            .await
        {
            Ok(generation) => {
                state.record_generation(&generation);
                extract_action(&generation.text)
                    .map(|extraction| extraction.directive)
                    .filter(|directive| matches!(directive, ActionDirective::FileConversion { .. }))
            }
            Err(e) => {
                warn!("Conversion planning failed, using file extension: {}", e);
                None
            }
        };

        let directive = planned.unwrap_or_else(|| {
            info!("No conversion directive from model, using file extension");
            ActionDirective::fallback_conversion()
        });

        state.enter(TurnStage::DispatchAction);
        let effect = self.actions.dispatch(&directive, &turn.attachments).await;
        state.conversion = effect.conversion;
        state.reply = effect.reply.unwrap_or_default();
    }

    /// Pull a directive out of the reply, run it and tidy the reply.
    async fn act_on_reply(&self, turn: &TurnRequest, text: String, state: &mut TurnState) {
        match extract_action(&text) {
            Some(extraction) => {
                state.reply = extraction.cleaned_text;
                state.enter(TurnStage::DispatchAction);
                let effect = self
                    .actions
                    .dispatch(&extraction.directive, &turn.attachments)
                    .await;
                state.apply(effect);
            }
            None => state.reply = text.trim().to_string(),
        }

        state.legacy_image_url = legacy_image_url(&state.reply);

        if state.reply.is_empty() {
            if state.image_url.is_some() || state.legacy_image_url.is_some() {
                state.reply = DEFAULT_IMAGE_REPLY.to_string();
            } else if state.video_url.is_some() {
                state.reply = DEFAULT_VIDEO_REPLY.to_string();
            }
        }
    }
}

/// URL of the first markdown image link in `text`.
fn legacy_image_url(text: &str) -> Option<String> {
    MARKDOWN_IMAGE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
