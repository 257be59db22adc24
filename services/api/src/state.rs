//! Application state shared across handlers

use providers::{MetadataClient, RadioDirectoryClient, VideoPlatformClient};
use sqlx::PgPool;
use std::sync::Arc;

use crate::repositories::ProfileRepository;
use crate::repositories::content::ContentRepository;
use crate::resolver::ContentResolver;
use crate::search::SearchService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub content_repository: ContentRepository,
    pub profile_repository: ProfileRepository,
    pub metadata: Arc<MetadataClient>,
    pub video: Arc<VideoPlatformClient>,
    pub radio: Arc<RadioDirectoryClient>,
    pub resolver: ContentResolver,
    pub search: SearchService,
}
