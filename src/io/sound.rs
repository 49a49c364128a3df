//! Alert tone playback with fallback to the system default tone

use crate::io::channels::{ChannelResult, SoundPlayer};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Request to start a tone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToneRequest {
    pub tone: String,
    /// Tone the output may use itself if `tone` cannot be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Low-level playback primitive. `start` returns once playback is started.
pub trait ToneOutput: Send + Sync {
    fn start(&self, request: &ToneRequest) -> ChannelResult<()>;
}

pub struct FallbackSoundPlayer<O> {
    output: O,
    preferred: Option<String>,
    fallback: String,
}

impl<O: ToneOutput> FallbackSoundPlayer<O> {
    pub fn new(output: O, preferred: Option<String>, fallback: String) -> Self {
        Self { output, preferred, fallback }
    }

    fn first_request(&self) -> ToneRequest {
        match &self.preferred {
            Some(tone) if *tone != self.fallback => {
                ToneRequest { tone: tone.clone(), fallback: Some(self.fallback.clone()) }
            }
            _ => ToneRequest { tone: self.fallback.clone(), fallback: None },
        }
    }
}

impl<O: ToneOutput> SoundPlayer for FallbackSoundPlayer<O> {
    /// Tone failures fall back and are then swallowed; transport failures are returned
    fn play(&self) -> ChannelResult<()> {
        let request = self.first_request();
        let first_error = match self.output.start(&request) {
            Ok(()) => {
                debug!(tone = %request.tone, "alert_tone_started");
                return Ok(());
            }
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => e,
        };

        if request.fallback.is_none() {
            error!(tone = %request.tone, error = %first_error, "alert_tone_failed");
            return Ok(());
        }

        warn!(tone = %request.tone, error = %first_error, "alert_tone_falling_back");
        let fallback = ToneRequest { tone: self.fallback.clone(), fallback: None };
        match self.output.start(&fallback) {
            Ok(()) => debug!(tone = %fallback.tone, "fallback_tone_started"),
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => error!(tone = %fallback.tone, error = %e, "fallback_tone_failed"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::channels::ChannelError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fails any tone listed in `broken`
    #[derive(Clone, Default)]
    struct ScriptedOutput {
        started: Arc<Mutex<Vec<ToneRequest>>>,
        broken: Vec<&'static str>,
    }

    impl ToneOutput for ScriptedOutput {
        fn start(&self, request: &ToneRequest) -> ChannelResult<()> {
            self.started.lock().push(request.clone());
            if self.broken.contains(&request.tone.as_str()) {
                return Err(ChannelError::ToneUnresolved(request.tone.clone()));
            }
            Ok(())
        }
    }

    fn player(output: &ScriptedOutput) -> FallbackSoundPlayer<ScriptedOutput> {
        FallbackSoundPlayer::new(
            output.clone(),
            Some("alert_sound".to_string()),
            "system_default".to_string(),
        )
    }

    #[test]
    fn test_preferred_tone_plays() {
        let output = ScriptedOutput::default();
        player(&output).play().unwrap();

        let started = output.started.lock();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].tone, "alert_sound");
        assert_eq!(started[0].fallback.as_deref(), Some("system_default"));
    }

    #[test]
    fn test_falls_back_when_preferred_fails() {
        let output = ScriptedOutput { broken: vec!["alert_sound"], ..Default::default() };
        player(&output).play().unwrap();

        let started = output.started.lock();
        assert_eq!(started.len(), 2);
        assert_eq!(started[1].tone, "system_default");
        assert_eq!(started[1].fallback, None);
    }

    #[test]
    fn test_second_failure_is_swallowed() {
        let output =
            ScriptedOutput { broken: vec!["alert_sound", "system_default"], ..Default::default() };
        assert!(player(&output).play().is_ok());
        assert_eq!(output.started.lock().len(), 2);
    }

    #[test]
    fn test_no_preferred_tone_uses_fallback_once() {
        let output = ScriptedOutput { broken: vec!["system_default"], ..Default::default() };
        let player = FallbackSoundPlayer::new(output.clone(), None, "system_default".to_string());
        assert!(player.play().is_ok());
        assert_eq!(output.started.lock().len(), 1);
    }

    /// Fails every start with a transport error
    struct ClosedOutput {
        attempts: Arc<Mutex<u32>>,
        error: ChannelError,
    }

    impl ToneOutput for ClosedOutput {
        fn start(&self, _: &ToneRequest) -> ChannelResult<()> {
            *self.attempts.lock() += 1;
            Err(self.error.clone())
        }
    }

    #[test]
    fn test_transport_failure_is_returned_without_fallback() {
        for error in [ChannelError::QueueFull, ChannelError::TransportClosed] {
            let attempts = Arc::new(Mutex::new(0));
            let output = ClosedOutput { attempts: attempts.clone(), error: error.clone() };
            let player = FallbackSoundPlayer::new(
                output,
                Some("alert_sound".to_string()),
                "system_default".to_string(),
            );

            assert_eq!(player.play(), Err(error));
            assert_eq!(*attempts.lock(), 1);
        }
    }
}
