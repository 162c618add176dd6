use crate::infrastructure::{CliError, Result};
use instant::Instant;
use std::path::Path;
use taleforge_core::{parse_action_response, GameView};
use taleforge_p2p::{GameSession, MemoryNetwork, SessionConfig};

/// Feed a recorded backend response through a host and `guests` guests and
/// return the host's final view.
pub fn replay_file(path: &Path, guests: usize, max_ticks: usize) -> Result<GameView> {
    if !path.exists() {
        return Err(CliError::replay_not_found(path.to_path_buf()));
    }
    let body = std::fs::read(path)?;

    let events = parse_action_response(&body)
        .map_err(|e| CliError::invalid_response(path.to_path_buf(), e))?;
    tracing::info!("Replaying {} events from {}", events.len(), path.display());

    let config = SessionConfig::default();
    let network = MemoryNetwork::new();
    let view = || GameView::new(config.turn_time_limit);

    let mut host = GameSession::host(network.join(), view(), config.clone())?;
    let mut others: Vec<_> = (0..guests)
        .map(|_| GameSession::guest(network.join(), view(), config.clone()))
        .collect();

    host.submit_events(events)?;

    let mut now = Instant::now();
    for _ in 0..max_ticks {
        let elapsed = config.poll_interval();
        host.poll_at(now);
        host.sink_mut().tick(elapsed);
        for guest in others.iter_mut() {
            guest.poll_at(now);
            guest.sink_mut().tick(elapsed);
        }
        now += elapsed;

        if host.queue().is_empty()
            && host.is_caught_up()
            && others.iter().all(|g| g.is_caught_up())
        {
            for (i, guest) in others.iter().enumerate() {
                if guest.sink().story_texts() != host.sink().story_texts() {
                    return Err(CliError::Diverged(format!("guest {} story differs", i + 1)));
                }
            }
            return Ok(host.sink().clone());
        }
    }

    Err(CliError::NotSettled(max_ticks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "taleforge-replay-{}-{}.json",
            name,
            std::process::id()
        ));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_replay_applies_batch() {
        let path = write_temp(
            "ok",
            r#"{"events":[
                {"type":"story","text":"Rain falls on the square."},
                {"type":"dice_roll","target_values":[2,6]},
                {"type":"change_turn","new_player":"Bob","turn_points_remaining":2}
            ]}"#,
        );

        let view = replay_file(&path, 2, 5_000).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(view.story_texts(), vec!["Rain falls on the square."]);
        assert_eq!(view.last_roll_total(), Some(8));
        assert_eq!(view.turn().unwrap().current_player, "Bob");
    }

    #[test]
    fn test_replay_rejects_malformed_response() {
        let path = write_temp("bad", r#"{"events":[{"type":"teleport"}]}"#);

        let result = replay_file(&path, 0, 100);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(CliError::InvalidResponse { .. })));
    }

    #[test]
    fn test_replay_missing_file() {
        let result = replay_file(Path::new("/nonexistent/taleforge.json"), 0, 100);
        assert!(matches!(result, Err(CliError::ReplayFileNotFound { .. })));
    }
}
