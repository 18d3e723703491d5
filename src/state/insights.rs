use log::{debug, warn};
use puck_api::feeds::{GameInsights, InsightRequest};

/// Best-effort game summary. Any failure, or an empty answer, hides the
/// panel rather than surfacing an error.
pub async fn resolve_insights(writer: &dyn GameInsights, request: &InsightRequest) -> Option<String> {
    match writer.insights(request).await {
        Ok(text) if text.trim().is_empty() => {
            debug!("empty insights for {} @ {}", request.away, request.home);
            None
        }
        Ok(text) => Some(text),
        Err(err) => {
            warn!("insights for {} @ {} failed: {err}", request.away, request.home);
            None
        }
    }
}
