//! Content resolution service
//!
//! Produces one authoritative item for a `(kind, id)` request, choosing
//! between the persisted document and a live upstream fetch. Fresh fetches
//! are enriched with a best-effort trailer lookup and persisted; failures
//! fall back to the stored document when one exists. Side effects (view
//! counter, watch history, radio click tracking) never block the response.

use crate::error::{ApiError, ApiResult};
use crate::models::ContentResponse;
use crate::repositories::ProfileRepository;
use crate::repositories::content::{ContentRepository, StoredContent};
use chrono::Utc;
use providers::{
    MediaKind, MetadataClient, NormalizedItem, ProviderError, RadioDirectoryClient,
    VideoPlatformClient,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of a resolution: the served value plus how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Served from a fresh document or a successful upstream fetch
    Fresh(T),
    /// Served from a stale fallback after an upstream failure
    Degraded(T, String),
}

impl<T> Resolution<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Fresh(value) => value,
            Self::Degraded(value, _) => value,
        }
    }
}

/// Decide what to serve once the upstream fetch has settled
///
/// A failed fetch falls back to the persisted document when one exists,
/// even an expired one; with no document the classified failure propagates.
fn serve_after_fetch(
    stored: Option<StoredContent>,
    fetched: Result<NormalizedItem, ProviderError>,
) -> Result<Resolution<NormalizedItem>, ProviderError> {
    match fetched {
        Ok(item) => Ok(Resolution::Fresh(item)),
        Err(err) => match stored {
            Some(doc) => Ok(Resolution::Degraded(doc.item, err.to_string())),
            None => Err(err),
        },
    }
}

/// Content resolution service
#[derive(Clone)]
pub struct ContentResolver {
    metadata: Arc<MetadataClient>,
    video: Arc<VideoPlatformClient>,
    radio: Arc<RadioDirectoryClient>,
    content: ContentRepository,
    profile: ProfileRepository,
}

impl ContentResolver {
    pub fn new(
        metadata: Arc<MetadataClient>,
        video: Arc<VideoPlatformClient>,
        radio: Arc<RadioDirectoryClient>,
        content: ContentRepository,
        profile: ProfileRepository,
    ) -> Self {
        Self {
            metadata,
            video,
            radio,
            content,
            profile,
        }
    }

    /// Resolve one `(kind, id)` request
    ///
    /// The kind has already been validated by the route layer; nothing here
    /// is reached for an unsupported kind.
    pub async fn resolve(
        &self,
        kind: MediaKind,
        external_id: &str,
        viewer: Option<Uuid>,
    ) -> ApiResult<ContentResponse> {
        if kind == MediaKind::Radio {
            return self.resolve_radio(external_id, viewer).await;
        }

        let stored = self.content.find(kind, external_id).await?;

        if let Some(doc) = &stored {
            if doc.is_fresh(Utc::now()) {
                self.record_serve(doc.item.clone(), viewer);
                return Ok(respond(Resolution::Fresh(doc.item.clone()), doc.view_count));
            }
        }

        let fetched = match kind {
            MediaKind::Movie => self.metadata.movie_details(external_id).await,
            MediaKind::Tv => self.metadata.tv_details(external_id).await,
            MediaKind::Radio => unreachable!("radio is short-circuited above"),
        };

        let views = stored.as_ref().map(|doc| doc.view_count).unwrap_or(0);
        let resolution = serve_after_fetch(stored, fetched).map_err(ApiError::from)?;

        let resolution = match resolution {
            Resolution::Fresh(mut item) => {
                self.enrich_with_trailer(&mut item).await;
                if let Err(err) = self.content.upsert(&item).await {
                    // the fetched data is in hand; persistence is cache-like
                    warn!(error = %err, "failed to persist resolved content");
                }
                Resolution::Fresh(item)
            }
            degraded => degraded,
        };

        self.record_serve(resolution.value().clone(), viewer);
        Ok(respond(resolution, views))
    }

    /// Radio lookups skip persistence and go straight to the directory
    async fn resolve_radio(
        &self,
        station_id: &str,
        viewer: Option<Uuid>,
    ) -> ApiResult<ContentResponse> {
        let station = self
            .radio
            .station_by_id(station_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::NotFound(format!("unknown radio station: {station_id}")))?;

        // popularity tracking; never blocks the response
        let radio = Arc::clone(&self.radio);
        let id = station_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = radio.click(&id).await {
                warn!(station = %id, error = %err, "radio click tracking failed");
            }
        });

        let item = NormalizedItem::from(station);
        self.record_watch(viewer, &item);
        Ok(respond(Resolution::Fresh(item), 0))
    }

    /// Best-effort trailer enrichment; failures are swallowed and logged
    async fn enrich_with_trailer(&self, item: &mut NormalizedItem) {
        if item.has_trailer() {
            return;
        }

        match self.video.find_trailer(&item.title, item.year).await {
            Ok(Some(trailer)) => item.sources.push(trailer),
            Ok(None) => {}
            Err(err) => {
                info!(title = %item.title, error = %err, "trailer enrichment failed");
            }
        }
    }

    /// View counter plus watch history, fire-and-forget
    fn record_serve(&self, item: NormalizedItem, viewer: Option<Uuid>) {
        let content = self.content.clone();
        let kind = item.kind;
        let external_id = item.external_id.clone();
        tokio::spawn(async move {
            if let Err(err) = content.increment_views(kind, &external_id).await {
                warn!(error = %err, "view counter update failed");
            }
        });

        self.record_watch(viewer, &item);
    }

    fn record_watch(&self, viewer: Option<Uuid>, item: &NormalizedItem) {
        let Some(user_id) = viewer else { return };

        let profile = self.profile.clone();
        let kind = item.kind;
        let external_id = item.external_id.clone();
        let title = item.title.clone();
        tokio::spawn(async move {
            if let Err(err) = profile
                .add_watch_history(user_id, kind, &external_id, &title)
                .await
            {
                warn!(user = %user_id, error = %err, "watch-history append failed");
            }
        });
    }
}

fn respond(resolution: Resolution<NormalizedItem>, views: i64) -> ContentResponse {
    match resolution {
        Resolution::Fresh(item) => ContentResponse {
            item,
            views,
            degraded: false,
            degraded_reason: None,
        },
        Resolution::Degraded(item, reason) => ContentResponse {
            item,
            views,
            degraded: true,
            degraded_reason: Some(reason),
        },
    }
}
