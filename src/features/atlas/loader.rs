use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

pub const LEAFLET_SCRIPT_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
pub const LEAFLET_STYLESHEET_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalAsset {
    Script(String),
    Stylesheet(String),
}

impl ExternalAsset {
    pub fn url(&self) -> &str {
        match self {
            Self::Script(url) | Self::Stylesheet(url) => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to load {url}: {reason}")]
    LoadFailed { url: String, reason: String },
}

/// Host-side hook that puts a `<script>` or `<link>` tag into the page
/// and resolves once the asset has loaded.
#[async_trait]
pub trait AssetInjector: Send + Sync {
    async fn inject(&self, asset: &ExternalAsset) -> Result<(), AssetError>;
}

#[async_trait]
impl<T: AssetInjector + ?Sized> AssetInjector for Arc<T> {
    async fn inject(&self, asset: &ExternalAsset) -> Result<(), AssetError> {
        (**self).inject(asset).await
    }
}

/// Asset URLs already injected into the page.
///
/// Shared by every loader, so remounting the map (which builds a new loader)
/// never injects a tag twice. Holding the lock across a load makes concurrent
/// callers wait for it instead of starting their own.
static INJECTED: Mutex<BTreeSet<String>> = Mutex::const_new(BTreeSet::new());

/// Injects the mapping library's assets at most once per page lifetime.
///
/// Completion is tracked per asset: when the script fails after the
/// stylesheet went in, a retry only injects the script.
pub struct ExternalAssetLoader<I: AssetInjector> {
    injector: I,
    assets: Vec<ExternalAsset>,
}

impl<I: AssetInjector> ExternalAssetLoader<I> {
    pub fn new(injector: I, assets: Vec<ExternalAsset>) -> Self {
        Self { injector, assets }
    }

    /// Leaflet stylesheet and script from the CDN
    pub fn leaflet(injector: I) -> Self {
        Self::new(
            injector,
            vec![
                ExternalAsset::Stylesheet(LEAFLET_STYLESHEET_URL.to_string()),
                ExternalAsset::Script(LEAFLET_SCRIPT_URL.to_string()),
            ],
        )
    }

    pub async fn ensure_loaded(&self) -> Result<(), AssetError> {
        let mut injected = INJECTED.lock().await;

        let mut fresh = 0;
        for asset in &self.assets {
            if injected.contains(asset.url()) {
                continue;
            }
            self.injector.inject(asset).await?;
            injected.insert(asset.url().to_string());
            fresh += 1;
        }

        if fresh > 0 {
            info!("Loaded {} external map assets", fresh);
        }
        Ok(())
    }

    pub async fn is_loaded(&self) -> bool {
        let injected = INJECTED.lock().await;
        self.assets.iter().all(|asset| injected.contains(asset.url()))
    }
}
