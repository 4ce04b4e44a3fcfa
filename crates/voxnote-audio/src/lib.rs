pub mod fetch;
pub mod normalize;

pub use fetch::{format_tag, AudioFetcher, LocalFileFetcher, VoiceNote};
pub use normalize::{conform, decode_with_symphonia, AudioNormalizer, DecodedAudio};
