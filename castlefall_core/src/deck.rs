use log::debug;
use rand::{seq::SliceRandom, Rng};

/// Words still to be dealt from one list. Words don't repeat until the list
/// runs out, then the whole list is reshuffled.
#[derive(Debug, Default, Clone)]
pub struct WordDeck {
    left: Vec<String>,
}

impl WordDeck {
    pub fn new() -> Self {
        WordDeck::default()
    }

    pub fn remaining(&self) -> usize {
        self.left.len()
    }

    /// Takes `count` words, or all of `source` if it is shorter than that.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        source: &[String],
        count: usize,
        rng: &mut R,
    ) -> Vec<String> {
        if self.left.len() < count {
            debug!("(re)shuffling {} words to draw {}", source.len(), count);
            self.left = source.to_vec();
            self.left.shuffle(rng);
        }
        let take = count.min(self.left.len());
        let rest = self.left.split_off(take);
        std::mem::replace(&mut self.left, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn draw_should_not_repeat_words_until_list_is_exhausted() {
        let source = words(10);
        let mut deck = WordDeck::new();
        let mut rng = StdRng::seed_from_u64(7);

        let first = deck.draw(&source, 4, &mut rng);
        let second = deck.draw(&source, 4, &mut rng);

        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 4);
        let seen: HashSet<_> = first.iter().chain(second.iter()).collect();
        assert_eq!(seen.len(), 8);
        assert_eq!(deck.remaining(), 2);
    }

    #[test]
    fn draw_should_reshuffle_when_too_few_words_are_left() {
        let source = words(10);
        let mut deck = WordDeck::new();
        let mut rng = StdRng::seed_from_u64(7);

        deck.draw(&source, 8, &mut rng);
        let drawn = deck.draw(&source, 4, &mut rng);

        assert_eq!(drawn.len(), 4);
        assert_eq!(drawn.iter().unique().count(), 4);
        assert_eq!(deck.remaining(), 6);
    }

    #[test]
    fn draw_should_return_whole_list_when_it_is_shorter_than_count() {
        let source = words(3);
        let mut deck = WordDeck::new();
        let mut rng = StdRng::seed_from_u64(1);

        let drawn = deck.draw(&source, 18, &mut rng);

        assert_eq!(drawn.iter().sorted().collect_vec(), source.iter().collect_vec());
        assert_eq!(deck.remaining(), 0);
    }
}
