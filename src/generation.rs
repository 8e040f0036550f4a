//! Streamed task-description generation.
//!
//! A [`DescriptionGenerator`] turns one [`GenerationRequest`] into a sequence
//! of [`GenerationEvent`]s written to a bounded channel: one `Char` event per
//! generated character, then exactly one `Done` or `Error`. The HTTP layer
//! only forwards the channel to the wire.

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Instrument};

use crate::accumulator::BudgetAccumulator;
use crate::cleaner::clean_model_output;
use crate::provider::ChatProvider;
use crate::{Error, GenerationEvent, GenerationRequest, GenerationSettings, StreamEvent};

/// Message sent to the client when the provider fails mid-stream.
pub const GENERATION_FAILED: &str = "生成失败";

/// Build the instruction prompt for a task title and character budget.
pub fn build_prompt(request: &GenerationRequest) -> String {
    format!(
        "请直接输出最终的任务描述，不要输出任何推理过程，不要包含 <think> 标签。\n\
         要求：\n\
         1. 描述具体、清晰\n\
         2. 字数控制在{limit}字以内\n\
         3. 语言简洁明了\n\
         4. 要体现任务的目标和重要性\n\
         \n\
         任务标题：{title}\n\
         任务描述：",
        limit = request.word_limit,
        title = request.title,
    )
}

/// How the character phase of a generation ended.
enum Outcome {
    /// Upstream finished or the budget ran out; carries the raw text.
    Finished(String),
    /// The receiving side hung up.
    Disconnected,
}

/// Generates task descriptions against a shared chat provider.
pub struct DescriptionGenerator {
    provider: Arc<dyn ChatProvider>,
    settings: GenerationSettings,
}

impl DescriptionGenerator {
    pub fn new(provider: Arc<dyn ChatProvider>, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }

    /// Run a generation on a background task and return its event receiver.
    pub fn spawn(self: &Arc<Self>, request: GenerationRequest) -> mpsc::Receiver<GenerationEvent> {
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let generator = Arc::clone(self);
        tokio::spawn(async move { generator.run(request, tx).await }.in_current_span());
        rx
    }

    /// Drive one generation to completion, writing its events to `tx`.
    ///
    /// Unless the receiver is dropped first, the last event written is the
    /// only terminal one.
    pub async fn run(&self, request: GenerationRequest, tx: mpsc::Sender<GenerationEvent>) {
        info!(
            title = %request.title,
            word_limit = request.word_limit,
            provider = self.provider.name(),
            "starting description generation"
        );

        let terminal = match self.stream_characters(&request, &tx).await {
            Ok(Outcome::Finished(raw)) => {
                let description = clean_model_output(&raw);
                info!(
                    raw_chars = raw.chars().count(),
                    description_chars = description.chars().count(),
                    "description generated"
                );
                GenerationEvent::done(description)
            }
            Ok(Outcome::Disconnected) => {
                debug!("client disconnected, abandoning generation");
                return;
            }
            Err(e) => {
                warn!(error = %e, "description generation failed");
                GenerationEvent::error(GENERATION_FAILED)
            }
        };

        if tx.send(terminal).await.is_err() {
            debug!("client disconnected before the terminal event");
        }
    }

    async fn stream_characters(
        &self,
        request: &GenerationRequest,
        tx: &mpsc::Sender<GenerationEvent>,
    ) -> Result<Outcome, Error> {
        let chat = self.settings.chat_request(build_prompt(request));
        let mut stream = self.provider.stream_chat(&chat).await?.stream();
        let mut budget = BudgetAccumulator::new(request.word_limit);

        // Dropping `stream` on the way out closes the upstream connection.
        'fragments: while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::ContentDelta { delta } => {
                    for ch in delta.chars() {
                        if !budget.push(ch) {
                            info!(
                                word_limit = request.word_limit,
                                "character budget reached, closing upstream stream"
                            );
                            break 'fragments;
                        }

                        let event = GenerationEvent::char(ch, budget.text(), budget.len());
                        if tx.send(event).await.is_err() {
                            return Ok(Outcome::Disconnected);
                        }

                        if !self.settings.pacing.is_zero() {
                            tokio::time::sleep(self.settings.pacing).await;
                        }
                    }
                }
                StreamEvent::Done {
                    finish_reason,
                    usage,
                } => {
                    debug!(?finish_reason, ?usage, "upstream stream finished");
                    break;
                }
                StreamEvent::Error { error } => {
                    return Err(Error::provider(self.provider.name(), error));
                }
            }
        }

        Ok(Outcome::Finished(budget.into_text()))
    }
}
