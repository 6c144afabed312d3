//! Interactive flow: summarize, then act on the draft.
//!
//! Every flow is a failure boundary. Errors end in a screen for the
//! requesting user and a [`FlowState::Error`], never in a propagated `Err`.

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{Instrument, error, info, info_span, warn};

use super::deliver::{replace, show};
use super::export::{export_title, publish_text};
use super::fetch::fetch_conversation;
use super::markdown::{preview, render_markdown_file};
use crate::ai::Summarizer;
use crate::core::models::{
    ConversationScope, DraftAction, InteractionTask, ReplyTarget, SummaryDraft,
};
use crate::core::token;
use crate::errors::BotError;
use crate::notion::DocumentExporter;
use crate::slack::views::{
    draft_screen, error_screen, exported_screen, markdown_screen, progress_screen,
    published_screen,
};
use crate::slack::{ChatPlatform, Screen};

/// Screen the requesting user ends up on after a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    DraftReady(SummaryDraft),
    Published,
    Exported { url: String },
    MarkdownShown { file_url: String },
    Error { message: String },
}

pub struct Dispatcher<'a> {
    pub chat: &'a dyn ChatPlatform,
    pub summarizer: &'a dyn Summarizer,
    pub exporter: &'a dyn DocumentExporter,
    /// Zone for timestamps in exported documents.
    pub timezone: Tz,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(
        chat: &'a dyn ChatPlatform,
        summarizer: &'a dyn Summarizer,
        exporter: &'a dyn DocumentExporter,
        timezone: Tz,
    ) -> Self {
        Self {
            chat,
            summarizer,
            exporter,
            timezone,
        }
    }

    /// Run one queued task to completion.
    pub async fn run(&self, task: &InteractionTask) -> FlowState {
        let span = info_span!("interaction", correlation_id = %task.correlation_id());
        async {
            match task {
                InteractionTask::Summarize {
                    user_id,
                    scope,
                    response_url,
                    ..
                } => self.summarize(user_id, scope, response_url.clone()).await,
                InteractionTask::Action {
                    action,
                    value,
                    target,
                    ..
                } => self.handle_action(*action, value, target).await,
            }
        }
        .instrument(span)
        .await
    }

    /// Dispatch a button click carrying `raw_token`.
    pub async fn handle_action(
        &self,
        action: DraftAction,
        raw_token: &str,
        target: &ReplyTarget,
    ) -> FlowState {
        let draft = match token::decode(raw_token) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Rejected {} click: {}", action.action_id(), e);
                let message = e.user_message();
                self.show_or_log(target, &Screen::notice(message.clone())).await;
                return FlowState::Error { message };
            }
        };

        info!(
            "Handling {} for channel {}",
            action.action_id(),
            draft.scope.channel_id()
        );
        match action {
            DraftAction::Publish => self.publish(&draft, target).await,
            DraftAction::Export => self.export(&draft, target).await,
            DraftAction::ShowMarkdown => self.show_markdown(&draft, raw_token, target).await,
            DraftAction::BackToDraft => self.back(draft, target).await,
        }
    }

    // ========================================================================
    // Summarize
    // ========================================================================

    pub async fn summarize(
        &self,
        user_id: &str,
        scope: &ConversationScope,
        response_url: Option<String>,
    ) -> FlowState {
        let scope = &scope.clone().clamped();
        let target = ReplyTarget {
            channel_id: Some(scope.channel_id().to_string()),
            user_id: user_id.to_string(),
            thread_ts: scope.thread_ts().map(str::to_string),
            response_url,
        };

        self.show_or_log(&target, &progress_screen(scope)).await;

        match self.generate_draft(scope).await {
            Ok(draft) => {
                self.show_or_log(&target, &draft_screen(&draft)).await;
                FlowState::DraftReady(draft)
            }
            Err(e) => {
                error!("Summarization for {} failed: {}", scope.channel_id(), e);
                self.fail(&target, &e).await
            }
        }
    }

    async fn generate_draft(&self, scope: &ConversationScope) -> Result<SummaryDraft, BotError> {
        let conversation = fetch_conversation(self.chat, scope).await?;
        let summary = self
            .summarizer
            .summarize(&conversation, scope.message_count())
            .await?;
        Ok(SummaryDraft::new(scope.clone(), summary).fit_to_token_limit())
    }

    // ========================================================================
    // Draft actions
    // ========================================================================

    async fn publish(&self, draft: &SummaryDraft, target: &ReplyTarget) -> FlowState {
        let text = publish_text(&draft.scope, &draft.summary_text);
        let posted = self
            .chat
            .post_message(draft.scope.channel_id(), draft.scope.thread_ts(), &text)
            .await;

        match posted {
            Ok(()) => {
                self.replace_or_log(target, &published_screen(&draft.scope)).await;
                FlowState::Published
            }
            Err(e) => {
                error!("Publishing to {} failed: {}", draft.scope.channel_id(), e);
                self.fail(target, &e).await
            }
        }
    }

    /// A failed export leaves the draft in place and shows the reason separately.
    async fn export(&self, draft: &SummaryDraft, target: &ReplyTarget) -> FlowState {
        let title = export_title(self.chat, &draft.scope).await;
        let result = self.exporter.export(&title, &draft.summary_text).await;

        match (result.success, result.url) {
            (true, Some(url)) => {
                info!("Exported summary to {}", url);
                self.replace_or_log(target, &exported_screen(&url)).await;
                FlowState::Exported { url }
            }
            _ => {
                let reason = result
                    .error
                    .unwrap_or_else(|| "no page URL returned".to_string());
                warn!("Export failed: {}", reason);
                self.fail(target, &BotError::ExportFailure(reason)).await
            }
        }
    }

    async fn show_markdown(
        &self,
        draft: &SummaryDraft,
        raw_token: &str,
        target: &ReplyTarget,
    ) -> FlowState {
        let exported_at = Utc::now().with_timezone(&self.timezone);
        let uploaded = match render_markdown_file(self.chat, draft, &exported_at).await {
            Ok(file) => self
                .chat
                .upload_text_file(&target.user_id, &file)
                .await
                .map(|url| (file, url))
                .map_err(|e| match e {
                    BotError::RenderOrUploadFailure(_) => e,
                    other => BotError::RenderOrUploadFailure(other.to_string()),
                }),
            Err(e) => Err(e),
        };

        match uploaded {
            Ok((file, file_url)) => {
                let screen =
                    markdown_screen(&file.filename, &file_url, &preview(&file.content), raw_token);
                self.replace_or_log(target, &screen).await;
                FlowState::MarkdownShown { file_url }
            }
            Err(e) => {
                error!("Markdown export failed: {}", e);
                let message = e.user_message();
                self.replace_or_log(target, &error_screen(&message, Some(raw_token))).await;
                FlowState::Error { message }
            }
        }
    }

    async fn back(&self, draft: SummaryDraft, target: &ReplyTarget) -> FlowState {
        self.replace_or_log(target, &draft_screen(&draft)).await;
        FlowState::DraftReady(draft)
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    async fn fail(&self, target: &ReplyTarget, e: &BotError) -> FlowState {
        let message = e.user_message();
        self.show_or_log(target, &error_screen(&message, None)).await;
        FlowState::Error { message }
    }

    async fn show_or_log(&self, target: &ReplyTarget, screen: &Screen) {
        if let Err(e) = show(self.chat, target, screen).await {
            error!("Could not deliver message to {}: {}", target.user_id, e);
        }
    }

    async fn replace_or_log(&self, target: &ReplyTarget, screen: &Screen) {
        if let Err(e) = replace(self.chat, target, screen).await {
            error!("Could not deliver message to {}: {}", target.user_id, e);
        }
    }
}
