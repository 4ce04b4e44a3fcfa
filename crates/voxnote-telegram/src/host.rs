use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use voxnote_core::{TelegramConfig, VoiceRef};
use voxnote_pipeline::Pipeline;
use voxnote_store::{ActivityStore, UserProfile, VOICE_MESSAGE_ACTION};

use crate::client::TelegramClient;
use crate::types::Update;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct VoiceJob {
    update_id: i64,
    chat_id: i64,
    message_id: i64,
    voice: VoiceRef,
    sender: Option<UserProfile>,
}

impl VoiceJob {
    fn from_update(update: Update) -> Option<Self> {
        let message = update.message?;
        let voice = message.voice?;
        Some(Self {
            update_id: update.update_id,
            chat_id: message.chat.id,
            message_id: message.message_id,
            voice: voice.voice_ref(),
            sender: message.from.as_ref().map(|u| u.profile()),
        })
    }
}

struct HostContext {
    client: Arc<TelegramClient>,
    pipeline: Arc<Pipeline>,
    store: Arc<dyn ActivityStore>,
    poll_timeout_secs: u64,
    skip_pending_updates: bool,
    retry_delay: Duration,
}

/// Long-polling bot loop.
///
/// Every voice message gets its own task running the pipeline, so a slow
/// transcription never holds up the next update.
pub struct BotHost {
    context: Arc<HostContext>,
    stop_tx: Option<watch::Sender<bool>>,
    task_handle: Option<JoinHandle<()>>,
}

impl BotHost {
    pub fn new(
        client: Arc<TelegramClient>,
        pipeline: Arc<Pipeline>,
        store: Arc<dyn ActivityStore>,
        config: &TelegramConfig,
    ) -> Self {
        Self {
            context: Arc::new(HostContext {
                client,
                pipeline,
                store,
                poll_timeout_secs: config.poll_timeout_secs,
                skip_pending_updates: config.skip_pending_updates,
                retry_delay: DEFAULT_RETRY_DELAY,
            }),
            stop_tx: None,
            task_handle: None,
        }
    }

    /// Override the pause after a failed `getUpdates`. Call before `start`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        if let Some(context) = Arc::get_mut(&mut self.context) {
            context.retry_delay = delay;
        }
        self
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn start(&mut self) {
        if self.task_handle.is_some() {
            tracing::warn!("BotHost already started");
            return;
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        let context = Arc::clone(&self.context);
        self.stop_tx = Some(stop_tx);
        self.task_handle = Some(tokio::spawn(poll_loop(context, stop_rx)));
    }

    /// Stop polling and wait for in-flight voice messages to be answered.
    pub async fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("bot loop panicked: {e}");
            }
        }
    }
}

async fn poll_loop(context: Arc<HostContext>, mut stop_rx: watch::Receiver<bool>) {
    let mut offset = None;
    if context.skip_pending_updates {
        match context.client.drop_pending_updates().await {
            Ok(next) => offset = next,
            Err(e) => tracing::warn!("could not skip pending updates: {e}"),
        }
    }

    tracing::info!(
        poll_timeout_secs = context.poll_timeout_secs,
        "bot polling started"
    );

    let mut runs: Vec<JoinHandle<()>> = Vec::new();
    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            result = context.client.get_updates(offset, context.poll_timeout_secs) => {
                match result {
                    Ok(updates) => {
                        for update in updates {
                            offset = Some(update.update_id + 1);
                            match VoiceJob::from_update(update) {
                                Some(job) => {
                                    runs.push(tokio::spawn(handle_voice(Arc::clone(&context), job)));
                                }
                                None => tracing::trace!("ignoring update without voice"),
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("getUpdates failed: {e}");
                        tokio::select! {
                            _ = stop_rx.changed() => break,
                            _ = tokio::time::sleep(context.retry_delay) => {}
                        }
                    }
                }
            }
        }
        runs.retain(|handle| !handle.is_finished());
    }

    tracing::info!(in_flight = runs.len(), "bot polling stopped");
    for handle in runs {
        if let Err(e) = handle.await {
            tracing::error!("voice task panicked: {e}");
        }
    }
}

async fn handle_voice(context: Arc<HostContext>, job: VoiceJob) {
    tracing::debug!(
        update_id = job.update_id,
        chat_id = job.chat_id,
        file_id = %job.voice.file_id,
        "handling voice message"
    );

    let (reply, ()) = tokio::join!(
        context.pipeline.run(&job.voice),
        record_activity(context.store.as_ref(), job.sender.as_ref()),
    );

    if let Err(e) = context
        .client
        .send_message(job.chat_id, &reply, Some(job.message_id))
        .await
    {
        tracing::error!(
            chat_id = job.chat_id,
            message_id = job.message_id,
            "failed to send reply: {e}"
        );
    }
}

/// Best-effort: failures are logged and never reach the user.
async fn record_activity(store: &dyn ActivityStore, sender: Option<&UserProfile>) {
    let Some(user) = sender else {
        return;
    };
    if let Err(e) = store.record_user(user).await {
        tracing::warn!(store = store.name(), user_id = user.id, "failed to save user: {e}");
    }
    if let Err(e) = store.record_action(user.id, VOICE_MESSAGE_ACTION).await {
        tracing::warn!(store = store.name(), user_id = user.id, "failed to save action: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_voice_job_from_voice_update() {
        let job = VoiceJob::from_update(update(
            r#"{
                "update_id": 3,
                "message": {
                    "message_id": 44,
                    "from": {"id": 9, "is_bot": false, "first_name": "Kim"},
                    "chat": {"id": -55, "type": "group"},
                    "date": 1700000000,
                    "voice": {"file_id": "f", "file_unique_id": "u", "duration": 2}
                }
            }"#,
        ))
        .unwrap();
        assert_eq!(job.update_id, 3);
        assert_eq!(job.chat_id, -55);
        assert_eq!(job.message_id, 44);
        assert_eq!(job.voice.file_id, "f");
        assert_eq!(job.sender.unwrap().id, 9);
    }

    #[test]
    fn test_voice_job_skips_text_and_empty_updates() {
        assert!(VoiceJob::from_update(update(r#"{"update_id": 1}"#)).is_none());
        assert!(VoiceJob::from_update(update(
            r#"{
                "update_id": 2,
                "message": {
                    "message_id": 1,
                    "chat": {"id": 1, "type": "private"},
                    "date": 1700000000,
                    "text": "hello"
                }
            }"#,
        ))
        .is_none());
    }

    #[test]
    fn test_voice_job_without_sender() {
        let job = VoiceJob::from_update(update(
            r#"{
                "update_id": 4,
                "message": {
                    "message_id": 2,
                    "chat": {"id": -100, "type": "channel"},
                    "date": 1700000000,
                    "voice": {"file_id": "g", "file_unique_id": "v", "duration": 1}
                }
            }"#,
        ))
        .unwrap();
        assert!(job.sender.is_none());
    }
}
