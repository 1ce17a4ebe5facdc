use crate::score::Score;
use serde::{Deserialize, Serialize};

/// A named resource consumed by a [`crate::Record`] (e.g. `Cores`, `Memory`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    name: String,
    amount: u64,
    #[serde(default)]
    scores: Vec<Score>,
}

impl Component {
    pub fn new(name: impl Into<String>, amount: u64) -> Self {
        Self {
            name: name.into(),
            amount,
            scores: Vec::new(),
        }
    }

    pub fn with_score(mut self, score: Score) -> Self {
        self.scores.push(score);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    /// First score with this name, if any. Consumers that look up by name
    /// take the first match, per the spec's component-lookup invariant.
    pub fn score(&self, name: &str) -> Option<&Score> {
        self.scores.iter().find(|s| s.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_score_appends_in_order() {
        let c = Component::new("comp-1", 10)
            .with_score(Score::new("HEPSPEC", 1.0).unwrap())
            .with_score(Score::new("SI2K", 2.0).unwrap());
        assert_eq!(c.scores().len(), 2);
        assert_eq!(c.scores()[0].name(), "HEPSPEC");
        assert_eq!(c.scores()[1].name(), "SI2K");
    }

    #[test]
    fn score_lookup_takes_first_match() {
        let c = Component::new("comp-1", 10)
            .with_score(Score::new("HEPSPEC", 1.0).unwrap())
            .with_score(Score::new("HEPSPEC", 2.0).unwrap());
        assert_eq!(c.score("HEPSPEC").unwrap().value(), 1.0);
    }
}
