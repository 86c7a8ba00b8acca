use tracing::info;

use crate::models::PlayingEpisode;

/// The single "currently playing" slot.  A new `play` always replaces the
/// current entry; there is no queue and no history.
#[derive(Debug, Default)]
pub struct PlaybackSlot {
    current: Option<PlayingEpisode>,
    /// Monotonic revision, bumped on every change.
    rev: u64,
}

impl PlaybackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, episode: PlayingEpisode) {
        info!("playback: {:?}", episode.title);
        self.current = Some(episode);
        self.rev += 1;
    }

    /// Clear the slot, returning what was playing.
    pub fn stop(&mut self) -> Option<PlayingEpisode> {
        let previous = self.current.take();
        if previous.is_some() {
            self.rev += 1;
        }
        previous
    }

    pub fn current(&self) -> Option<&PlayingEpisode> {
        self.current.as_ref()
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn dispose(mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str) -> PlayingEpisode {
        PlayingEpisode {
            title: title.to_string(),
            file: format!("https://cdn.example/{}.mp3", title),
        }
    }

    #[test]
    fn play_preempts_current() {
        let mut slot = PlaybackSlot::new();
        slot.play(track("one"));
        slot.play(track("two"));
        assert_eq!(slot.current().map(|p| p.title.as_str()), Some("two"));
        assert_eq!(slot.rev(), 2);
    }

    #[test]
    fn stop_clears_and_returns_previous() {
        let mut slot = PlaybackSlot::new();
        slot.play(track("one"));
        assert_eq!(slot.stop(), Some(track("one")));
        assert!(slot.current().is_none());
        assert_eq!(slot.stop(), None);
        assert_eq!(slot.rev(), 2);
    }
}
