use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;
use voxnote_audio::{AudioFetcher, AudioNormalizer};
use voxnote_core::{
    extract, AppConfig, DecodeError, PipelineError, RecognitionError, RecognitionMode,
    ReplyFormatter, TargetSpec, VoiceRef,
};
use voxnote_engine::RecognitionBackend;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub target: TargetSpec,
    pub mode: RecognitionMode,
    pub recognition_timeout: Duration,
    pub ffmpeg_path: PathBuf,
    pub formatter: ReplyFormatter,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            target: config.audio.target_spec(),
            mode: config.recognition.mode,
            recognition_timeout: config.recognition.timeout(),
            ffmpeg_path: config.audio.ffmpeg_path.clone(),
            formatter: ReplyFormatter::new(&config.reply),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target: TargetSpec {
                sample_rate_hz: 16000,
                channels: 1,
                max_duration_ms: Some(5000),
            },
            mode: RecognitionMode::FreeText,
            recognition_timeout: Duration::from_secs(60),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            formatter: ReplyFormatter::default(),
        }
    }
}

/// Turns one voice reference into one reply.
///
/// Stages run strictly in order: fetch, normalize, recognize, extract,
/// format. Runs share nothing but the backend handle, so a `Pipeline` can be
/// put behind an `Arc` and driven from many tasks at once.
pub struct Pipeline {
    fetcher: Arc<dyn AudioFetcher>,
    normalizer: AudioNormalizer,
    backend: Arc<dyn RecognitionBackend>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn AudioFetcher>,
        backend: Arc<dyn RecognitionBackend>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            normalizer: AudioNormalizer::new(options.ffmpeg_path.clone()),
            backend,
            options,
        }
    }

    pub fn formatter(&self) -> &ReplyFormatter {
        &self.options.formatter
    }

    /// Run the pipeline and always produce reply text.
    ///
    /// Stage failures are logged and turned into the generic failure reply.
    pub async fn run(&self, voice: &VoiceRef) -> String {
        let run_id = Uuid::new_v4();
        match self.execute(run_id, voice).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    run_id = %run_id,
                    file_id = %voice.file_id,
                    "voice pipeline failed: {e}"
                );
                self.options.formatter.failure().to_string()
            }
        }
    }

    /// Same as [`run`](Self::run) but hands the stage error back to the caller.
    pub async fn try_run(&self, voice: &VoiceRef) -> Result<String, PipelineError> {
        self.execute(Uuid::new_v4(), voice).await
    }

    async fn execute(&self, run_id: Uuid, voice: &VoiceRef) -> Result<String, PipelineError> {
        let started = Instant::now();

        let note = self.fetcher.fetch(voice).await?;
        tracing::debug!(
            run_id = %run_id,
            fetcher = self.fetcher.name(),
            bytes = note.byte_len(),
            format = ?note.format(),
            "voice note fetched"
        );

        // decoding, resampling and ffmpeg are all blocking work
        let normalizer = self.normalizer.clone();
        let target = self.options.target;
        let audio = tokio::task::spawn_blocking(move || {
            let normalized = normalizer.normalize(&note, &target);
            // the transient artifact goes away here whether or not decoding worked
            drop(note);
            normalized
        })
        .await
        .map_err(|e| DecodeError::Malformed(format!("normalize task: {e}")))??;

        let timeout = self.options.recognition_timeout;
        // on expiry the recognize future is dropped, which cancels the backend's worker
        let result = tokio::time::timeout(timeout, self.backend.recognize(&audio))
            .await
            .map_err(|_| RecognitionError::Timeout(timeout))??;

        let content = extract(&result, self.options.mode);
        tracing::info!(
            run_id = %run_id,
            engine = self.backend.name(),
            audio_secs = audio.duration().as_secs_f32(),
            segments = result.segments.len(),
            empty = content.is_empty(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "voice note recognized"
        );

        Ok(self.options.formatter.format(&content))
    }
}
