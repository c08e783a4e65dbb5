use anyhow::Result;
use murmur_core::{FrequencyAnalyser, mean_energy};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// The local audio source shared by every peer connection.
///
/// A capture layer feeds it twice: raw PCM for level analysis and encoded
/// Opus samples for the outbound track.
#[derive(Clone)]
pub struct Microphone {
    track: Arc<TrackLocalStaticSample>,
    analyser: Arc<Mutex<FrequencyAnalyser>>,
    enabled: Arc<AtomicBool>,
}

impl Microphone {
    pub fn new() -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            },
            "audio".to_owned(),
            "murmur".to_owned(),
        ));

        Self {
            track,
            analyser: Arc::new(Mutex::new(FrequencyAnalyser::default())),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// A disabled microphone sends nothing and reads as silence.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.analyser.lock().reset();
        }
    }

    pub fn push_pcm(&self, pcm: &[f32]) {
        if !self.is_enabled() {
            return;
        }
        self.analyser.lock().push_samples(pcm);
    }

    /// Forwards an encoded sample to every connection. Returns false when
    /// the microphone is muted and the sample was dropped.
    pub async fn write_sample(&self, sample: &Sample) -> Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }
        self.track.write_sample(sample).await?;
        Ok(true)
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.analyser.lock().frequency_bin_count()
    }

    pub fn byte_frequency_data(&self, out: &mut [u8]) {
        if !self.is_enabled() {
            out.fill(0);
            return;
        }
        self.analyser.lock().byte_frequency_data(out);
    }

    /// Mean byte magnitude of the current spectrum.
    pub fn level(&self, scratch: &mut Vec<u8>) -> f64 {
        scratch.resize(self.frequency_bin_count(), 0);
        self.byte_frequency_data(scratch);
        mean_energy(scratch)
    }
}

impl Default for Microphone {
    fn default() -> Self {
        Self::new()
    }
}
