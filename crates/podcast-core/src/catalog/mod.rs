//! Remote catalog access.
//!
//! `CatalogClient` is the seam between the view-state machine and the
//! network: the machine only ever emits `Fetch` descriptions, the host runs
//! them against a client and feeds the resulting `CatalogEvent` back.

mod http;
mod wire;

pub use http::HttpCatalog;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ShowDetail, ShowId, ShowPreview};

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// All show previews, in the order the service returns them.
    async fn list_previews(&self) -> Result<Vec<ShowPreview>>;

    /// Full detail for one show.  Never cached: every call re-fetches.
    async fn get_show_detail(&self, id: &str) -> Result<ShowDetail>;
}

/// Identifies one issued request so a late response can be recognised as
/// stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag(pub(crate) u64);

impl RequestTag {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    Previews,
    ShowDetail(ShowId),
}

/// A catalog request the machine wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    pub tag: RequestTag,
    pub kind: FetchKind,
}

impl Fetch {
    pub async fn run(self, client: &dyn CatalogClient) -> CatalogEvent {
        match self.kind {
            FetchKind::Previews => CatalogEvent::PreviewsLoaded {
                tag: self.tag,
                result: client.list_previews().await,
            },
            FetchKind::ShowDetail(show_id) => {
                let result = client.get_show_detail(&show_id).await;
                CatalogEvent::DetailLoaded {
                    tag: self.tag,
                    show_id,
                    result,
                }
            }
        }
    }
}

/// A catalog response delivered back to the machine.
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    PreviewsLoaded {
        tag: RequestTag,
        result: Result<Vec<ShowPreview>>,
    },
    DetailLoaded {
        tag: RequestTag,
        show_id: ShowId,
        result: Result<ShowDetail>,
    },
}
