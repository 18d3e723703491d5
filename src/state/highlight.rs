use log::{debug, warn};
use puck_api::feeds::VideoLookup;
use puck_api::{GameSummary, VideoRef};

/// Best-effort highlight lookup for a finished game. Never fails: anything
/// other than a found video resolves to `None`.
pub async fn resolve_highlight(lookup: &dyn VideoLookup, game: &GameSummary) -> Option<VideoRef> {
    if !game.state.is_finished() {
        return None;
    }
    match lookup
        .find_highlight(&game.away.name, &game.home.name, game.start_time)
        .await
    {
        Ok(Some(video)) => {
            debug!("highlight for game {}: {}", game.id, video.video_id);
            Some(video)
        }
        Ok(None) => {
            debug!("no highlight yet for game {}", game.id);
            None
        }
        Err(err) => {
            warn!("highlight lookup for game {} failed: {err}", game.id);
            None
        }
    }
}
