use async_trait::async_trait;
use futures::{stream, StreamExt};
use hound::{SampleFormat, WavSpec, WavWriter};
use readaloud_backend::domain::synthesis::AudioFormat;
use readaloud_backend::infrastructure::repositories::{
    AudioFrameStream, SpeechEngine, SpeechEngineError,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SAMPLE_RATE: u32 = 16_000;
pub const SAMPLES_PER_CHUNK: usize = 160;

#[derive(Clone, Copy)]
pub enum MockBehavior {
    /// Every chunk produces audio
    Succeed,
    /// Streams open but never yield, so every chunk times out
    Hang,
    /// Chunks containing the text are rejected, the rest succeed
    FailWhenContains(&'static str),
}

/// Speech engine producing short WAV clips. Each clip holds one constant
/// sample derived from the first letter of the chunk, so the assembled file
/// shows which chunks were kept and in which order.
pub struct MockSpeechEngine {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockSpeechEngine {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn tone_for(text: &str) -> i16 {
    text.bytes().next().unwrap_or(0) as i16 * 10
}

pub fn wav_clip(value: i16) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..SAMPLES_PER_CHUNK {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[async_trait]
impl SpeechEngine for MockSpeechEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn output_format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    async fn open_stream(
        &self,
        text: &str,
        _voice: &str,
    ) -> Result<AudioFrameStream, SpeechEngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Hang => Ok(stream::pending().boxed()),
            MockBehavior::FailWhenContains(needle) if text.contains(needle) => Err(
                SpeechEngineError::Request("mock engine rejected chunk".to_string()),
            ),
            MockBehavior::Succeed | MockBehavior::FailWhenContains(_) => {
                // Deliver the clip in two frames like a real stream
                let clip = wav_clip(tone_for(text));
                let (head, tail) = clip.split_at(clip.len() / 2);
                let frames = vec![Ok(head.to_vec()), Ok(tail.to_vec())];
                Ok(stream::iter(frames).boxed())
            }
        }
    }
}
