use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use feruca::Collator;
use serde::{Deserialize, Serialize};

pub type ShowId = String;
pub type EpisodeId = String;

/// Lightweight show summary used for the catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowPreview {
    pub id: ShowId,
    pub title: String,
    pub seasons_count: u32,
    pub updated_at: DateTime<Utc>,
    pub genre_ids: BTreeSet<i64>,
}

/// Full show record, fetched on demand.  Shares only its id with the preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetail {
    pub id: ShowId,
    pub title: String,
    pub description: String,
    pub seasons: Vec<Season>,
}

impl ShowDetail {
    pub fn season(&self, season_id: &str) -> Option<&Season> {
        self.seasons.iter().find(|s| s.id == season_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    pub title: String,
    pub image: String,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub title: String,
    /// Media URL handed to the audio device.
    pub file: String,
}

/// Snapshot of an episode plus the show/season titles it was favourited
/// from.  Never refreshed after it is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteEntry {
    pub id: EpisodeId,
    pub title: String,
    pub file: String,
    pub show_title: String,
    pub season_title: String,
    pub added_at: DateTime<Utc>,
}

/// The one episode whose audio is currently active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayingEpisode {
    pub title: String,
    pub file: String,
}

impl From<&Episode> for PlayingEpisode {
    fn from(episode: &Episode) -> Self {
        Self {
            title: episode.title.clone(),
            file: episode.file.clone(),
        }
    }
}

impl From<&FavouriteEntry> for PlayingEpisode {
    fn from(entry: &FavouriteEntry) -> Self {
        Self {
            title: entry.title.clone(),
            file: entry.file.clone(),
        }
    }
}

/// Locale-aware title ordering (UCA with the CLDR root tailoring), so
/// "Émile" sorts with the E's and "apple" before "Banana".
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    Collator::default().collate(a, b)
}

/// Sort previews by title, ascending.  `sort_by` is stable, so identical
/// titles keep the order the catalog returned them in.
pub fn sort_previews(previews: &mut [ShowPreview]) {
    let mut collator = Collator::default();
    previews.sort_by(|a, b| collator.collate(a.title.as_str(), b.title.as_str()));
}
