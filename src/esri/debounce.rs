use std::time::{Duration, Instant};

use serde::Deserialize;

use super::query::WgsBoundingBox;

/// Quiet period after the last map move before the service is queried again.
pub const MOVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// A recorded map move: the new viewport and the time passed since the previous move.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ViewportMove {
    #[serde(flatten)]
    pub bounds: WgsBoundingBox,
    #[serde(default = "default_move_delay_ms")]
    pub after_ms: u64,
}

fn default_move_delay_ms() -> u64 {
    MOVE_DEBOUNCE.as_millis() as u64
}

/// Collapses bursts of map move events into a single query. Time is passed in by the caller.
#[derive(Debug)]
pub struct MoveDebouncer {
    delay: Duration,
    pending: Option<(Instant, WgsBoundingBox)>,
}

impl Default for MoveDebouncer {
    fn default() -> Self {
        Self::new(MOVE_DEBOUNCE)
    }
}

impl MoveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a move to `bbox`, restarting the quiet period.
    pub fn on_move(&mut self, bbox: WgsBoundingBox, now: Instant) {
        self.pending = Some((now, bbox));
    }

    /// The bounds to query once the quiet period has passed. Each move is handed out once.
    pub fn poll(&mut self, now: Instant) -> Option<WgsBoundingBox> {
        let quiet = self.pending.as_ref().map_or(false, |(moved_at, _)| {
            now.saturating_duration_since(*moved_at) >= self.delay
        });
        if quiet {
            self.pending.take().map(|(_, bbox)| bbox)
        } else {
            None
        }
    }

    /// Time left until `poll` yields, if a move is pending.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(moved_at, _)| self.delay.saturating_sub(now.saturating_duration_since(*moved_at)))
    }
}

/// Replay map moves through a debouncer and return the viewports the map came to rest on.
pub fn settled_viewports(moves: &[ViewportMove]) -> Vec<WgsBoundingBox> {
    let mut debouncer = MoveDebouncer::default();
    let mut now = Instant::now();
    let mut settled = Vec::new();
    for map_move in moves {
        now += Duration::from_millis(map_move.after_ms);
        settled.extend(debouncer.poll(now));
        debouncer.on_move(map_move.bounds.clone(), now);
    }
    if let Some(remaining) = debouncer.remaining(now) {
        settled.extend(debouncer.poll(now + remaining));
    }
    settled
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::esri::query::WgsBoundingBox;

    use super::{settled_viewports, MoveDebouncer, ViewportMove};

    fn bbox(left_lon: f64) -> WgsBoundingBox {
        WgsBoundingBox {
            left_lon,
            right_lon: left_lon + 1.0,
            bottom_lat: 0.0,
            top_lat: 1.0,
        }
    }

    #[test]
    fn test_only_last_move_is_queried() {
        let start = Instant::now();
        let mut debouncer = MoveDebouncer::default();
        debouncer.on_move(bbox(0.0), start);
        debouncer.on_move(bbox(1.0), start + Duration::from_millis(300));

        assert_eq!(debouncer.poll(start + Duration::from_millis(600)), None);
        assert_eq!(
            debouncer.remaining(start + Duration::from_millis(600)),
            Some(Duration::from_millis(200))
        );
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(800)),
            Some(bbox(1.0))
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(2000)), None);
        assert_eq!(debouncer.remaining(start), None);
    }

    #[test]
    fn test_settled_viewports() {
        let map_move = |left_lon: f64, after_ms: u64| ViewportMove {
            bounds: bbox(left_lon),
            after_ms,
        };
        // A drag through 1.0 and 2.0 ends on 3.0, the map rests on 0.0 and 3.0 only.
        let moves = vec![
            map_move(0.0, 0),
            map_move(1.0, 600),
            map_move(2.0, 100),
            map_move(3.0, 100),
        ];
        assert_eq!(settled_viewports(&moves), vec![bbox(0.0), bbox(3.0)]);
        assert!(settled_viewports(&[]).is_empty());
    }
}
