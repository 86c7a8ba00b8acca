//! JSON shapes returned by the catalog service.
//!
//! Kept apart from the domain model so the service's quirks (numeric or
//! string ids, seasons keyed by number, episodes without ids) stay here.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{Episode, Season, ShowDetail, ShowPreview};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WirePreview {
    id: WireId,
    title: String,
    #[serde(default, alias = "seasonsCount")]
    seasons: u32,
    #[serde(alias = "updatedAt")]
    updated: DateTime<Utc>,
    #[serde(default, alias = "genreIds")]
    genres: Vec<i64>,
}

impl From<WirePreview> for ShowPreview {
    fn from(w: WirePreview) -> Self {
        ShowPreview {
            id: w.id.into_string(),
            title: w.title,
            seasons_count: w.seasons,
            updated_at: w.updated,
            genre_ids: w.genres.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireDetail {
    id: WireId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    seasons: Vec<WireSeason>,
}

#[derive(Debug, Deserialize)]
struct WireSeason {
    id: Option<WireId>,
    season: Option<WireId>,
    title: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    episodes: Vec<WireEpisode>,
}

#[derive(Debug, Deserialize)]
struct WireEpisode {
    id: Option<WireId>,
    episode: Option<WireId>,
    title: String,
    file: String,
}

impl From<WireDetail> for ShowDetail {
    fn from(w: WireDetail) -> Self {
        let show_id = w.id.into_string();
        let seasons = w
            .seasons
            .into_iter()
            .enumerate()
            .map(|(season_idx, s)| {
                let season_id = s
                    .id
                    .or(s.season)
                    .map(WireId::into_string)
                    .unwrap_or_else(|| (season_idx + 1).to_string());
                let episodes = s
                    .episodes
                    .into_iter()
                    .enumerate()
                    .map(|(episode_idx, e)| {
                        // The service numbers episodes per season; make the id
                        // unique across shows when it doesn't send one.
                        let id = match e.id {
                            Some(id) => id.into_string(),
                            None => {
                                let number = e
                                    .episode
                                    .map(WireId::into_string)
                                    .unwrap_or_else(|| (episode_idx + 1).to_string());
                                format!("{}-{}-{}", show_id, season_id, number)
                            }
                        };
                        Episode {
                            id,
                            title: e.title,
                            file: e.file,
                        }
                    })
                    .collect();
                Season {
                    id: season_id,
                    title: s.title,
                    image: s.image,
                    episodes,
                }
            })
            .collect();

        ShowDetail {
            id: show_id,
            title: w.title,
            description: w.description,
            seasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_from_live_shape() {
        let json = r#"{
            "id": "10716",
            "title": "Something Was Wrong",
            "description": "An award-winning series",
            "seasons": 14,
            "image": "https://content.production.cdn.art19.com/img.jpeg",
            "genres": [1, 2],
            "updated": "2022-11-03T07:00:00.000Z"
        }"#;
        let preview: ShowPreview = serde_json::from_str::<WirePreview>(json).unwrap().into();
        assert_eq!(preview.id, "10716");
        assert_eq!(preview.seasons_count, 14);
        assert_eq!(preview.genre_ids.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(preview.updated_at.to_rfc3339(), "2022-11-03T07:00:00+00:00");
    }

    #[test]
    fn preview_accepts_numeric_id_and_camel_case_aliases() {
        let json = r#"{"id": 2, "title": "Zeta", "seasonsCount": 3,
                       "updatedAt": "2023-01-01T00:00:00Z", "genreIds": [9]}"#;
        let preview: ShowPreview = serde_json::from_str::<WirePreview>(json).unwrap().into();
        assert_eq!(preview.id, "2");
        assert_eq!(preview.seasons_count, 3);
        assert!(preview.genre_ids.contains(&9));
    }

    #[test]
    fn out_of_table_genre_ids_do_not_fail_the_list() {
        let json = r#"[
            {"id": "1", "title": "Alpha", "seasons": 1, "genres": [1], "updated": "2023-01-01T00:00:00Z"},
            {"id": "2", "title": "Beta", "seasons": 1, "genres": [300, -4], "updated": "2023-01-01T00:00:00Z"}
        ]"#;
        let previews: Vec<ShowPreview> = serde_json::from_str::<Vec<WirePreview>>(json)
            .unwrap()
            .into_iter()
            .map(ShowPreview::from)
            .collect();
        assert_eq!(previews.len(), 2);
        let labels: Vec<&str> = previews[1]
            .genre_ids
            .iter()
            .map(|&g| crate::genres::genre_label(g))
            .collect();
        assert_eq!(labels, vec!["Unknown", "Unknown"]);
    }

    #[test]
    fn detail_synthesizes_episode_ids() {
        let json = r#"{
            "id": "10716",
            "title": "Show",
            "description": "About",
            "seasons": [
                {"season": 1, "title": "Season 1", "image": "img1", "episodes": [
                    {"title": "Pilot", "episode": 1, "file": "f1"},
                    {"title": "Second", "episode": 2, "file": "f2"}
                ]},
                {"id": "s2", "title": "Season 2", "episodes": [
                    {"id": 77, "title": "Explicit", "file": "f3"}
                ]}
            ]
        }"#;
        let detail: ShowDetail = serde_json::from_str::<WireDetail>(json).unwrap().into();
        assert_eq!(detail.seasons.len(), 2);
        assert_eq!(detail.seasons[0].id, "1");
        assert_eq!(detail.seasons[0].episodes[0].id, "10716-1-1");
        assert_eq!(detail.seasons[0].episodes[1].id, "10716-1-2");
        assert_eq!(detail.seasons[1].id, "s2");
        assert_eq!(detail.seasons[1].image, "");
        assert_eq!(detail.seasons[1].episodes[0].id, "77");
    }
}
