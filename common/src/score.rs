use crate::engine::Event;

/// Turns engine events into points. Each resolution step in a chain is
/// worth its matched pieces times the step number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    pub score: u64,
    /// Current step of the running chain, 0 when the board is settled.
    pub combo: u32,
    pub best_combo: u32,
    pub points_per_cell: u32,
}

impl ScoreBoard {
    pub fn new(points_per_cell: u32) -> Self {
        ScoreBoard {
            points_per_cell,
            ..Self::default()
        }
    }

    /// Points awarded for this event.
    pub fn apply(&mut self, event: &Event) -> u64 {
        match *event {
            Event::Matched { cells, chain } => {
                self.combo = chain;
                self.best_combo = self.best_combo.max(chain);
                let points = cells as u64 * self.points_per_cell as u64 * chain as u64;
                self.score += points;
                points
            }
            Event::ChainEnded { .. } => {
                self.combo = 0;
                0
            }
            _ => 0,
        }
    }

    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) -> u64 {
        events.into_iter().map(|event| self.apply(event)).sum()
    }

    pub fn reset(&mut self) {
        *self = ScoreBoard::new(self.points_per_cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_multiplies_points() {
        let mut score = ScoreBoard::new(10);
        let events = [
            Event::Matched { cells: 3, chain: 1 },
            Event::Matched { cells: 4, chain: 2 },
        ];
        assert_eq!(score.apply_all(&events), 30 + 80);
        assert_eq!(score.combo, 2);

        score.apply(&Event::ChainEnded { steps: 2 });
        assert_eq!(score.combo, 0);
        assert_eq!(score.best_combo, 2);
        assert_eq!(score.score, 110);
    }

    #[test]
    fn test_other_events_score_nothing() {
        let mut score = ScoreBoard::new(10);
        assert_eq!(score.apply(&Event::Deselected), 0);
        score.apply(&Event::Matched { cells: 3, chain: 1 });
        score.reset();
        assert_eq!(score, ScoreBoard::new(10));
    }
}
