// src/hardware/speech.rs - Speech playback
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::ActuatorError;

#[async_trait]
pub trait SpeechPlayer: Send + Sync {
    /// Speak `text`, returning once playback has finished.
    async fn speak(&self, text: &str) -> Result<(), ActuatorError>;
}

/// Runs an external text-to-speech program with the text as its last argument.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl SpeechPlayer for CommandSpeech {
    async fn speak(&self, text: &str) -> Result<(), ActuatorError> {
        tracing::debug!("Speaking via {}: {:?}", self.program, text);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| ActuatorError::Speech(format!("failed to start {}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(ActuatorError::Speech(format!("{} exited with {}", self.program, status)))
        }
    }
}

/// Records spoken text; playback takes a fixed time.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSpeech {
    spoken: Arc<Mutex<Vec<String>>>,
    playback: Duration,
}

impl SimulatedSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playback(playback: Duration) -> Self {
        Self {
            playback,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechPlayer for SimulatedSpeech {
    async fn speak(&self, text: &str) -> Result<(), ActuatorError> {
        tracing::info!("(speech) {}", text);
        tokio::time::sleep(self.playback).await;
        self.spoken
            .lock()
            .map_err(|_| ActuatorError::Poisoned("speech"))?
            .push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_a_speech_error() {
        let speech = CommandSpeech::new("/nonexistent/tts-program", Vec::new());
        let err = speech.speak("hello").await.unwrap_err();
        assert!(matches!(err, ActuatorError::Speech(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_speech_waits_for_playback() {
        let speech = SimulatedSpeech::with_playback(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        speech.speak("hello there").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(speech.spoken(), vec!["hello there".to_string()]);
    }
}
