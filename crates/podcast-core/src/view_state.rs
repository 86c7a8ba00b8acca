//! View-state machine — decides which view is active and how user intents
//! and catalog responses move between views.
//!
//! The machine does no network I/O.  Each step returns a list of `Effect`s
//! for the host to carry out (run a fetch, start/stop the audio device, show
//! a notice).  Catalog results come back through `on_catalog_event`.
//!
//! ```text
//!  Previews ──select_show──▶ (fetch) ──▶ ShowDetail ──select_season──▶ Season
//!     ▲  │                                  │  ▲                         │
//!     │  └──view_favourites──▶ Favourites   │  └──────back_to_seasons────┘
//!     └──────────back_to_previews───────────┘
//! ```
//!
//! Every detail request carries a `RequestTag`; only the response to the
//! most recent request is applied, so a slow earlier response can never
//! overwrite a newer one.

use tracing::{debug, info, warn};

use crate::catalog::{CatalogEvent, Fetch, FetchKind, RequestTag};
use crate::error::Error;
use crate::favourites::FavouritesStore;
use crate::models::{
    sort_previews, Episode, EpisodeId, FavouriteEntry, PlayingEpisode, Season, ShowDetail, ShowId,
    ShowPreview,
};
use crate::playback::PlaybackSlot;

/// The active view.  Exactly one at a time; each carries what it renders.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Previews,
    ShowDetail(ShowDetail),
    /// `show` is kept so going back to the season list needs no re-fetch and
    /// favourites can record the show title.
    Season { show: ShowDetail, season: Season },
    Favourites,
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Previews => "previews",
            View::ShowDetail(_) => "show-detail",
            View::Season { .. } => "season",
            View::Favourites => "favourites",
        }
    }
}

/// State of the preview list fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(Error),
}

/// Everything the user can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SelectShow(ShowId),
    ViewFavourites,
    /// Season id within the currently shown show.
    SelectSeason(String),
    BackToPreviews,
    BackToSeasons,
    ToggleFavourite(Episode),
    PlayEpisode(Episode),
    RemoveFavourite(EpisodeId),
    PlayFavourite(FavouriteEntry),
    StopPlayback,
    RetryPreviews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the user; the host decides how to show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Work for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(Fetch),
    StartAudio(PlayingEpisode),
    StopAudio,
    Notify(Notice),
}

pub struct ViewStateMachine {
    view: View,
    previews: Vec<ShowPreview>,
    previews_status: LoadStatus,
    previews_request: Option<RequestTag>,
    /// The detail request whose response we still want.
    detail_request: Option<(RequestTag, ShowId)>,
    last_error: Option<Error>,
    next_tag: u64,
    favourites: FavouritesStore,
    playback: PlaybackSlot,
}

impl ViewStateMachine {
    pub fn new(favourites: FavouritesStore, playback: PlaybackSlot) -> Self {
        Self {
            view: View::Previews,
            previews: Vec::new(),
            previews_status: LoadStatus::Loading,
            previews_request: None,
            detail_request: None,
            last_error: None,
            next_tag: 0,
            favourites,
            playback,
        }
    }

    /// Kick off the initial preview load.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![self.fetch_previews()]
    }

    pub fn handle(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::SelectShow(show_id) if self.view == View::Previews => {
                let tag = self.next_tag();
                info!("view-state: loading show {} ({:?})", show_id, tag);
                self.detail_request = Some((tag, show_id.clone()));
                self.last_error = None;
                vec![Effect::Fetch(Fetch {
                    tag,
                    kind: FetchKind::ShowDetail(show_id),
                })]
            }

            Intent::ViewFavourites if self.view == View::Previews => {
                if let Some((tag, show_id)) = self.detail_request.take() {
                    debug!("view-state: abandoning show {} ({:?})", show_id, tag);
                }
                self.view = View::Favourites;
                Vec::new()
            }

            Intent::RetryPreviews
                if self.view == View::Previews && !self.is_loading_previews() =>
            {
                vec![self.fetch_previews()]
            }

            Intent::BackToPreviews
                if matches!(self.view, View::ShowDetail(_) | View::Favourites) =>
            {
                self.view = View::Previews;
                Vec::new()
            }

            Intent::SelectSeason(season_id) => {
                let View::ShowDetail(show) = &self.view else {
                    return self.ignore(Intent::SelectSeason(season_id));
                };
                let Some(season) = show.season(&season_id).cloned() else {
                    warn!("view-state: show {} has no season {}", show.id, season_id);
                    return Vec::new();
                };
                let show = show.clone();
                self.view = View::Season { show, season };
                Vec::new()
            }

            Intent::BackToSeasons => {
                let View::Season { show, .. } = &self.view else {
                    return self.ignore(Intent::BackToSeasons);
                };
                self.view = View::ShowDetail(show.clone());
                Vec::new()
            }

            Intent::ToggleFavourite(episode) => {
                let View::Season { show, season } = &self.view else {
                    return self.ignore(Intent::ToggleFavourite(episode));
                };
                let Some(episode) = season_episode(season, &episode) else {
                    return Vec::new();
                };
                let effect = if self.favourites.is_favourite(&episode.id) {
                    let result = self.favourites.remove(&episode.id).map(|_| ());
                    favourite_notice(result, format!("removed {}", episode.title))
                } else {
                    let result = self.favourites.add(episode, &show.title, &season.title);
                    favourite_notice(result, format!("added {}", episode.title))
                };
                vec![effect]
            }

            Intent::PlayEpisode(episode) => {
                let View::Season { season, .. } = &self.view else {
                    return self.ignore(Intent::PlayEpisode(episode));
                };
                let Some(episode) = season_episode(season, &episode) else {
                    return Vec::new();
                };
                let playing = PlayingEpisode::from(episode);
                self.play(playing)
            }

            Intent::RemoveFavourite(id) if self.view == View::Favourites => {
                let Some(title) = self.favourites.get(&id).map(|e| e.title.clone()) else {
                    return Vec::new();
                };
                let result = self.favourites.remove(&id).map(|_| ());
                vec![favourite_notice(result, format!("removed {}", title))]
            }

            Intent::PlayFavourite(entry) if self.view == View::Favourites => {
                self.play(PlayingEpisode::from(&entry))
            }

            Intent::StopPlayback => match self.playback.stop() {
                Some(_) => vec![Effect::StopAudio],
                None => Vec::new(),
            },

            other => self.ignore(other),
        }
    }

    pub fn on_catalog_event(&mut self, event: CatalogEvent) -> Vec<Effect> {
        match event {
            CatalogEvent::PreviewsLoaded { tag, result } => {
                if self.previews_request != Some(tag) {
                    debug!("view-state: discarding stale preview list ({:?})", tag);
                    return Vec::new();
                }
                self.previews_request = None;
                match result {
                    Ok(mut previews) => {
                        sort_previews(&mut previews);
                        info!("view-state: {} previews ready", previews.len());
                        self.previews = previews;
                        self.previews_status = LoadStatus::Ready;
                        self.last_error = None;
                        Vec::new()
                    }
                    Err(e) => {
                        warn!("view-state: preview load failed: {}", e);
                        self.previews_status = LoadStatus::Failed(e.clone());
                        self.last_error = Some(e.clone());
                        vec![Effect::Notify(Notice::new(
                            NoticeLevel::Error,
                            format!("could not load shows: {}", e),
                        ))]
                    }
                }
            }

            CatalogEvent::DetailLoaded {
                tag,
                show_id,
                result,
            } => {
                match &self.detail_request {
                    Some((wanted, _)) if *wanted == tag => {}
                    _ => {
                        debug!("view-state: discarding stale show {} ({:?})", show_id, tag);
                        return Vec::new();
                    }
                }
                self.detail_request = None;
                match result {
                    Ok(detail) => {
                        info!("view-state: showing {:?}", detail.title);
                        self.view = View::ShowDetail(detail);
                        Vec::new()
                    }
                    Err(e) => {
                        warn!("view-state: show {} failed: {}", show_id, e);
                        self.last_error = Some(e.clone());
                        vec![Effect::Notify(Notice::new(
                            NoticeLevel::Error,
                            format!("could not open show: {}", e),
                        ))]
                    }
                }
            }
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Previews sorted by title.  Kept across view changes.
    pub fn previews(&self) -> &[ShowPreview] {
        &self.previews
    }

    pub fn previews_status(&self) -> &LoadStatus {
        &self.previews_status
    }

    pub fn is_loading_previews(&self) -> bool {
        self.previews_status == LoadStatus::Loading
    }

    pub fn is_loading_detail(&self) -> bool {
        self.detail_request.is_some()
    }

    /// Show whose detail is being fetched, if any.
    pub fn pending_show(&self) -> Option<&str> {
        self.detail_request.as_ref().map(|(_, id)| id.as_str())
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn favourites(&self) -> &[FavouriteEntry] {
        self.favourites.list()
    }

    pub fn is_favourite(&self, episode_id: &str) -> bool {
        self.favourites.is_favourite(episode_id)
    }

    pub fn now_playing(&self) -> Option<&PlayingEpisode> {
        self.playback.current()
    }

    pub fn playback_rev(&self) -> u64 {
        self.playback.rev()
    }

    /// Hand the injected services back for disposal.
    pub fn into_parts(self) -> (FavouritesStore, PlaybackSlot) {
        (self.favourites, self.playback)
    }

    fn next_tag(&mut self) -> RequestTag {
        self.next_tag += 1;
        RequestTag(self.next_tag)
    }

    fn fetch_previews(&mut self) -> Effect {
        let tag = self.next_tag();
        info!("view-state: loading previews ({:?})", tag);
        self.previews_status = LoadStatus::Loading;
        self.previews_request = Some(tag);
        Effect::Fetch(Fetch {
            tag,
            kind: FetchKind::Previews,
        })
    }

    fn ignore(&self, intent: Intent) -> Vec<Effect> {
        debug!("view-state: ignoring {:?} in {}", intent, self.view.name());
        Vec::new()
    }

    fn play(&mut self, episode: PlayingEpisode) -> Vec<Effect> {
        self.playback.play(episode.clone());
        vec![Effect::StartAudio(episode)]
    }
}

/// The season's own copy of `episode`, looked up by id.  Titles and the
/// media URL always come from the loaded season, never from the caller.
fn season_episode<'a>(season: &'a Season, episode: &Episode) -> Option<&'a Episode> {
    let found = season.episodes.iter().find(|e| e.id == episode.id);
    if found.is_none() {
        warn!(
            "view-state: episode {} is not in season {}, ignoring",
            episode.id, season.id
        );
    }
    found
}

fn favourite_notice(result: crate::Result<()>, done: String) -> Effect {
    match result {
        Ok(()) => Effect::Notify(Notice::new(NoticeLevel::Success, done)),
        Err(e) => Effect::Notify(Notice::new(
            NoticeLevel::Warning,
            format!("{} (not saved: {})", done, e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn machine() -> ViewStateMachine {
        let favourites = FavouritesStore::init(Box::new(MemoryStore::new()));
        ViewStateMachine::new(favourites, PlaybackSlot::new())
    }

    fn only_fetch(effects: Vec<Effect>) -> Fetch {
        match effects.as_slice() {
            [Effect::Fetch(fetch)] => fetch.clone(),
            other => panic!("expected one fetch, got {:?}", other),
        }
    }

    fn preview(id: &str, title: &str) -> ShowPreview {
        ShowPreview {
            id: id.into(),
            title: title.into(),
            seasons_count: 1,
            updated_at: Utc::now(),
            genre_ids: BTreeSet::new(),
        }
    }

    fn detail(id: &str, title: &str) -> ShowDetail {
        ShowDetail {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            seasons: vec![Season {
                id: "1".into(),
                title: "Season 1".into(),
                image: String::new(),
                episodes: vec![Episode {
                    id: format!("{}-1-1", id),
                    title: "Pilot".into(),
                    file: "https://cdn.example/pilot.mp3".into(),
                }],
            }],
        }
    }

    fn loaded(previews: Vec<ShowPreview>) -> ViewStateMachine {
        let mut m = machine();
        let fetch = only_fetch(m.start());
        m.on_catalog_event(CatalogEvent::PreviewsLoaded {
            tag: fetch.tag,
            result: Ok(previews),
        });
        m
    }

    fn open_show(m: &mut ViewStateMachine, id: &str, title: &str) {
        let fetch = only_fetch(m.handle(Intent::SelectShow(id.into())));
        m.on_catalog_event(CatalogEvent::DetailLoaded {
            tag: fetch.tag,
            show_id: id.into(),
            result: Ok(detail(id, title)),
        });
    }

    #[test]
    fn starts_loading_previews() {
        let mut m = machine();
        assert!(m.is_loading_previews());
        let fetch = only_fetch(m.start());
        assert_eq!(fetch.kind, FetchKind::Previews);
        assert_eq!(m.view(), &View::Previews);
    }

    #[test]
    fn previews_are_sorted_on_arrival() {
        let m = loaded(vec![preview("2", "Zeta"), preview("1", "Alpha")]);
        let titles: Vec<&str> = m.previews().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Zeta"]);
        assert_eq!(m.previews_status(), &LoadStatus::Ready);
    }

    #[test]
    fn preview_failure_is_recorded_and_retryable() {
        let mut m = machine();
        let fetch = only_fetch(m.start());
        let effects = m.on_catalog_event(CatalogEvent::PreviewsLoaded {
            tag: fetch.tag,
            result: Err(Error::Network("offline".into())),
        });
        assert!(matches!(effects.as_slice(), [Effect::Notify(n)] if n.level == NoticeLevel::Error));
        assert_eq!(m.previews_status(), &LoadStatus::Failed(Error::Network("offline".into())));
        assert_eq!(m.last_error(), Some(&Error::Network("offline".into())));

        let retry = only_fetch(m.handle(Intent::RetryPreviews));
        assert_ne!(retry.tag, fetch.tag);
        assert!(m.is_loading_previews());
    }

    #[test]
    fn retry_ignored_while_loading() {
        let mut m = machine();
        m.start();
        assert!(m.handle(Intent::RetryPreviews).is_empty());
    }

    #[test]
    fn select_show_transitions_on_success() {
        let mut m = loaded(vec![preview("1", "Alpha")]);
        let fetch = only_fetch(m.handle(Intent::SelectShow("1".into())));
        assert!(m.is_loading_detail());
        assert_eq!(m.pending_show(), Some("1"));
        assert_eq!(m.view(), &View::Previews);

        m.on_catalog_event(CatalogEvent::DetailLoaded {
            tag: fetch.tag,
            show_id: "1".into(),
            result: Ok(detail("1", "Alpha")),
        });
        assert!(!m.is_loading_detail());
        assert!(matches!(m.view(), View::ShowDetail(d) if d.id == "1"));
    }

    #[test]
    fn select_show_failure_stays_on_previews() {
        let mut m = loaded(vec![preview("1", "Alpha")]);
        let fetch = only_fetch(m.handle(Intent::SelectShow("404".into())));
        let effects = m.on_catalog_event(CatalogEvent::DetailLoaded {
            tag: fetch.tag,
            show_id: "404".into(),
            result: Err(Error::NotFound("404".into())),
        });
        assert_eq!(effects.len(), 1);
        assert_eq!(m.view(), &View::Previews);
        assert!(!m.is_loading_detail());
        assert_eq!(m.last_error(), Some(&Error::NotFound("404".into())));
    }

    #[test]
    fn slow_earlier_response_does_not_overwrite_newer() {
        let mut m = loaded(vec![preview("a", "A"), preview("b", "B")]);
        let fetch_a = only_fetch(m.handle(Intent::SelectShow("a".into())));
        let fetch_b = only_fetch(m.handle(Intent::SelectShow("b".into())));

        m.on_catalog_event(CatalogEvent::DetailLoaded {
            tag: fetch_b.tag,
            show_id: "b".into(),
            result: Ok(detail("b", "B")),
        });
        let effects = m.on_catalog_event(CatalogEvent::DetailLoaded {
            tag: fetch_a.tag,
            show_id: "a".into(),
            result: Ok(detail("a", "A")),
        });
        assert!(effects.is_empty());
        assert!(matches!(m.view(), View::ShowDetail(d) if d.id == "b"));
    }

    #[test]
    fn stale_response_ignored_while_newer_pending() {
        let mut m = loaded(vec![preview("a", "A"), preview("b", "B")]);
        let fetch_a = only_fetch(m.handle(Intent::SelectShow("a".into())));
        let _fetch_b = only_fetch(m.handle(Intent::SelectShow("b".into())));

        m.on_catalog_event(CatalogEvent::DetailLoaded {
            tag: fetch_a.tag,
            show_id: "a".into(),
            result: Ok(detail("a", "A")),
        });
        assert_eq!(m.view(), &View::Previews);
        assert_eq!(m.pending_show(), Some("b"));
    }

    #[test]
    fn leaving_for_favourites_abandons_pending_detail() {
        let mut m = loaded(vec![preview("a", "A")]);
        let fetch = only_fetch(m.handle(Intent::SelectShow("a".into())));
        m.handle(Intent::ViewFavourites);
        m.on_catalog_event(CatalogEvent::DetailLoaded {
            tag: fetch.tag,
            show_id: "a".into(),
            result: Ok(detail("a", "A")),
        });
        assert_eq!(m.view(), &View::Favourites);
    }

    #[test]
    fn season_round_trip_needs_no_fetch() {
        let mut m = loaded(vec![preview("a", "A")]);
        open_show(&mut m, "a", "A");

        assert!(m.handle(Intent::SelectSeason("1".into())).is_empty());
        assert!(matches!(m.view(), View::Season { season, .. } if season.id == "1"));

        assert!(m.handle(Intent::BackToSeasons).is_empty());
        assert!(matches!(m.view(), View::ShowDetail(d) if d.id == "a"));

        m.handle(Intent::BackToPreviews);
        assert_eq!(m.view(), &View::Previews);
        assert_eq!(m.previews().len(), 1);
    }

    #[test]
    fn unknown_season_is_ignored() {
        let mut m = loaded(vec![preview("a", "A")]);
        open_show(&mut m, "a", "A");
        m.handle(Intent::SelectSeason("99".into()));
        assert!(matches!(m.view(), View::ShowDetail(_)));
    }

    #[test]
    fn toggle_favourite_records_provenance() {
        let mut m = loaded(vec![preview("a", "A")]);
        open_show(&mut m, "a", "Show A");
        m.handle(Intent::SelectSeason("1".into()));
        let episode = detail("a", "Show A").seasons[0].episodes[0].clone();

        m.handle(Intent::ToggleFavourite(episode.clone()));
        assert!(m.is_favourite(&episode.id));
        assert_eq!(m.favourites()[0].show_title, "Show A");
        assert_eq!(m.favourites()[0].season_title, "Season 1");

        m.handle(Intent::ToggleFavourite(episode.clone()));
        assert!(!m.is_favourite(&episode.id));
    }

    #[test]
    fn episodes_outside_the_shown_season_are_rejected() {
        let mut m = loaded(vec![preview("a", "A")]);
        open_show(&mut m, "a", "Show A");
        m.handle(Intent::SelectSeason("1".into()));
        let foreign = Episode {
            id: "zzz-9-9".into(),
            title: "Not in this season".into(),
            file: "https://cdn.example/zzz.mp3".into(),
        };

        assert!(m.handle(Intent::ToggleFavourite(foreign.clone())).is_empty());
        assert!(m.favourites().is_empty());
        assert!(m.handle(Intent::PlayEpisode(foreign)).is_empty());
        assert!(m.now_playing().is_none());
    }

    #[test]
    fn season_copy_wins_over_caller_fields() {
        let mut m = loaded(vec![preview("a", "A")]);
        open_show(&mut m, "a", "Show A");
        m.handle(Intent::SelectSeason("1".into()));
        let mut episode = detail("a", "Show A").seasons[0].episodes[0].clone();
        episode.title = "Renamed by caller".into();
        episode.file = "https://elsewhere.example/x.mp3".into();

        m.handle(Intent::ToggleFavourite(episode.clone()));
        assert_eq!(m.favourites()[0].title, "Pilot");
        let effects = m.handle(Intent::PlayEpisode(episode));
        assert!(matches!(
            effects.as_slice(),
            [Effect::StartAudio(p)] if p.file == "https://cdn.example/pilot.mp3"
        ));
    }

    #[test]
    fn playback_survives_view_changes() {
        let mut m = loaded(vec![preview("a", "A")]);
        open_show(&mut m, "a", "A");
        m.handle(Intent::SelectSeason("1".into()));
        let episode = detail("a", "A").seasons[0].episodes[0].clone();

        let effects = m.handle(Intent::PlayEpisode(episode.clone()));
        assert_eq!(effects, vec![Effect::StartAudio(PlayingEpisode::from(&episode))]);

        m.handle(Intent::BackToSeasons);
        m.handle(Intent::BackToPreviews);
        m.handle(Intent::ViewFavourites);
        assert_eq!(m.now_playing().map(|p| p.title.as_str()), Some("Pilot"));
    }

    #[test]
    fn play_favourite_replaces_current_track() {
        let mut m = loaded(vec![preview("a", "A")]);
        open_show(&mut m, "a", "A");
        m.handle(Intent::SelectSeason("1".into()));
        let episode = detail("a", "A").seasons[0].episodes[0].clone();
        m.handle(Intent::ToggleFavourite(episode.clone()));
        m.playback.play(PlayingEpisode {
            title: "Other".into(),
            file: "o".into(),
        });
        assert_eq!(m.now_playing().map(|p| p.title.as_str()), Some("Other"));
        m.handle(Intent::BackToSeasons);
        m.handle(Intent::BackToPreviews);
        m.handle(Intent::ViewFavourites);

        let entry = m.favourites()[0].clone();
        m.handle(Intent::PlayFavourite(entry));
        assert_eq!(m.now_playing().map(|p| p.title.as_str()), Some("Pilot"));

        m.handle(Intent::RemoveFavourite(episode.id.clone()));
        assert!(m.favourites().is_empty());
        assert_eq!(m.now_playing().map(|p| p.title.as_str()), Some("Pilot"));
    }

    #[test]
    fn stop_playback_from_any_view() {
        let mut m = machine();
        assert!(m.handle(Intent::StopPlayback).is_empty());
        m.view = View::Favourites;
        m.playback.play(PlayingEpisode {
            title: "t".into(),
            file: "f".into(),
        });
        assert_eq!(m.handle(Intent::StopPlayback), vec![Effect::StopAudio]);
        assert!(m.now_playing().is_none());
    }

    #[test]
    fn intents_outside_their_view_are_ignored() {
        let mut m = loaded(vec![preview("a", "A")]);
        assert!(m.handle(Intent::BackToSeasons).is_empty());
        assert!(m
            .handle(Intent::PlayEpisode(Episode {
                id: "x".into(),
                title: "x".into(),
                file: "x".into(),
            }))
            .is_empty());
        assert!(m.now_playing().is_none());
        assert_eq!(m.view(), &View::Previews);
    }
}
