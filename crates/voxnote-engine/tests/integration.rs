use std::sync::Arc;
use voxnote_core::{extract, AudioBuffer, RecognitionMode, RecognitionResult};
use voxnote_engine::{
    drive_stream, CancelFlag, PluginRegistry, RecognitionBackend, StreamingDecoder,
};

fn silence(frames: usize) -> AudioBuffer {
    AudioBuffer {
        samples: vec![0.0; frames],
        sample_rate: 16000,
        channels: 1,
    }
}

#[tokio::test]
async fn test_shared_backend_serves_concurrent_calls() {
    let registry = PluginRegistry::new();
    let config: toml::Value = toml::from_str(r#"segments = ["hello", "world"]"#).unwrap();
    let backend: Arc<dyn RecognitionBackend> = registry.load("null", config).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let backend = Arc::clone(&backend);
        handles.push(tokio::spawn(async move {
            backend.recognize(&silence(1600 * (i + 1))).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(
            extract(&result, RecognitionMode::FreeText).value(),
            "hello world"
        );
    }
}

/// Emits the number of non-silent samples seen so far at each boundary.
struct EnergyDecoder {
    loud: usize,
}

impl StreamingDecoder for EnergyDecoder {
    fn accept(&mut self, chunk: &[i16]) -> Result<Option<String>, voxnote_core::RecognitionError> {
        let loud = chunk.iter().filter(|s| s.unsigned_abs() > 1000).count();
        self.loud += loud;
        if loud == 0 && self.loud > 0 {
            let text = self.loud.to_string();
            self.loud = 0;
            return Ok(Some(text));
        }
        Ok(None)
    }

    fn flush(&mut self) -> Result<Option<String>, voxnote_core::RecognitionError> {
        Ok((self.loud > 0).then(|| self.loud.to_string()))
    }
}

#[test]
fn test_streaming_driver_with_normalized_buffer() {
    // 4000 loud, 4000 silent, 2000 loud
    let mut samples = vec![0.5f32; 4000];
    samples.extend(vec![0.0f32; 4000]);
    samples.extend(vec![-0.5f32; 2000]);
    let buffer = AudioBuffer {
        samples,
        sample_rate: 16000,
        channels: 1,
    };

    let mut decoder = EnergyDecoder { loud: 0 };
    let result = drive_stream(&mut decoder, &buffer.to_pcm16(), 4000, &CancelFlag::new()).unwrap();
    assert_eq!(result, RecognitionResult::from_texts(["4000", "2000"]));
    assert_eq!(
        extract(&result, RecognitionMode::DigitsOnly).value(),
        "40002000"
    );
}
