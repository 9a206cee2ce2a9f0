use crate::{
    deck::WordDeck,
    error::StartError,
    protocol::{ClientId, RoundDealt, StartRequest},
    wordlist::WordLists,
};
use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use std::{
    collections::{BTreeMap, HashMap},
    time::{Duration, Instant},
};

/// Minimum time between two successful round starts in one room.
pub const START_COOLDOWN: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
pub struct Room {
    members: BTreeMap<String, ClientId>,
    round: u64,
    last_start: Option<Instant>,
    players_in_round: Vec<String>,
    assigned_words: HashMap<String, String>,
    words: Vec<String>,
    decks: HashMap<String, WordDeck>,
}

impl Room {
    pub fn new() -> Self {
        Room::default()
    }

    /// Seats `client` under `name`. Returns the client that held the name before.
    pub fn join(&mut self, name: &str, client: ClientId) -> Option<ClientId> {
        self.members
            .insert(name.to_string(), client)
            .filter(|&previous| previous != client)
    }

    pub fn leave(&mut self, name: &str) -> Option<ClientId> {
        self.members.remove(name)
    }

    /// Removes `name` only if `client` still holds it.
    pub fn leave_client(&mut self, name: &str, client: ClientId) -> bool {
        if self.members.get(name) == Some(&client) {
            self.members.remove(name);
            true
        } else {
            false
        }
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn client_of(&self, name: &str) -> Option<ClientId> {
        self.members.get(name).copied()
    }

    pub fn player_names(&self) -> Vec<String> {
        self.members.keys().cloned().collect_vec()
    }

    pub fn members(&self) -> impl Iterator<Item = (&String, ClientId)> {
        self.members.iter().map(|(name, &client)| (name, client))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn players_in_round(&self) -> &[String] {
        &self.players_in_round
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn assigned_word(&self, name: &str) -> Option<&str> {
        self.assigned_words.get(name).map(String::as_str)
    }

    /// The round's words in a fresh random order, so word position gives
    /// nothing away.
    pub fn words_shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut copy = self.words.clone();
        copy.shuffle(rng);
        copy
    }

    pub fn round_dealt<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> RoundDealt {
        RoundDealt {
            round: self.round,
            players_in_round: self.players_in_round.clone(),
            words: self.words_shuffled(rng),
            word: self.assigned_word(name).map(str::to_string),
        }
    }

    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        request: &StartRequest,
        lists: &WordLists,
        now: Instant,
        rng: &mut R,
    ) -> Result<(), StartError> {
        let requested = request.round();
        if requested != Some(self.round) {
            return Err(StartError::RoundOutOfSync {
                current: self.round,
                requested,
            });
        }
        if let Some(last) = self.last_start {
            if now.saturating_duration_since(last) < START_COOLDOWN {
                return Err(StartError::TooSoon);
            }
        }
        let list_name = request
            .wordlist
            .as_deref()
            .ok_or(StartError::MissingWordList)?;
        let source = lists
            .get(list_name)
            .ok_or_else(|| StartError::UnknownWordList(list_name.to_string()))?;
        if source.len() < 2 {
            return Err(StartError::NotEnoughWords {
                name: list_name.to_string(),
                available: source.len(),
            });
        }

        self.round += 1;
        self.last_start = Some(now);

        let count = request.word_count().max(2);
        let words = self
            .decks
            .entry(list_name.to_string())
            .or_default()
            .draw(source, count, rng);
        let secret = words.choose_multiple(rng, 2).cloned().collect_vec();
        let (first, second) = (&secret[0], &secret[1]);

        let mut seating = self.player_names();
        seating.shuffle(rng);
        let half = seating.len() / 2;
        self.assigned_words = seating
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let word = if i >= half { second } else { first };
                (name, word.clone())
            })
            .collect();
        self.players_in_round = self.player_names();
        self.words = words;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn lists() -> WordLists {
        let mut lists = WordLists::new();
        lists.insert(
            "castles".to_string(),
            (0..30).map(|i| format!("castle{i}")).collect(),
        );
        lists.insert("tiny".to_string(), vec!["only".to_string()]);
        lists
    }

    fn request(round: u64, wordlist: &str) -> StartRequest {
        StartRequest {
            round: Some(serde_json::json!(round)),
            wordlist: Some(wordlist.to_string()),
            wordcount: None,
        }
    }

    fn room_with(names: &[&str]) -> Room {
        let mut room = Room::new();
        for (i, name) in names.iter().enumerate() {
            room.join(name, i as ClientId);
        }
        room
    }

    #[test]
    fn join_should_return_previous_holder_of_the_name() {
        let mut room = Room::new();

        assert_eq!(room.join("ann", 1), None);
        assert_eq!(room.join("ann", 1), None);
        assert_eq!(room.join("ann", 2), Some(1));
        assert_eq!(room.client_of("ann"), Some(2));
    }

    #[test]
    fn leave_client_should_keep_name_taken_over_by_someone_else() {
        let mut room = Room::new();
        room.join("ann", 1);
        room.join("ann", 2);

        assert!(!room.leave_client("ann", 1));
        assert!(room.has_player("ann"));
        assert!(room.leave_client("ann", 2));
        assert!(room.is_empty());
    }

    #[test]
    fn player_names_should_be_sorted() {
        let room = room_with(&["cy", "ann", "bob"]);
        assert_eq!(room.player_names(), vec!["ann", "bob", "cy"]);
    }

    #[test]
    fn start_round_should_split_players_into_two_teams() {
        let mut room = room_with(&["ann", "bob", "cy", "dee", "eve"]);
        let mut rng = StdRng::seed_from_u64(42);

        room.start_round(&request(0, "castles"), &lists(), Instant::now(), &mut rng)
            .unwrap();

        assert_eq!(room.round(), 1);
        assert_eq!(room.words().len(), 18);
        assert_eq!(room.players_in_round(), &["ann", "bob", "cy", "dee", "eve"]);

        let mut teams: HashMap<&str, usize> = HashMap::new();
        for name in room.player_names() {
            let word = room.assigned_word(&name).unwrap();
            assert!(room.words().iter().any(|w| w == word));
            *teams.entry(word).or_default() += 1;
        }
        let mut sizes = teams.values().copied().collect_vec();
        sizes.sort();
        assert_eq!(sizes, vec![2, 3]);
    }

    #[test]
    fn start_round_should_honour_word_count_but_never_less_than_two() {
        let mut room = room_with(&["ann", "bob"]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut req = request(0, "castles");
        req.wordcount = Some(serde_json::json!(1));

        room.start_round(&req, &lists(), Instant::now(), &mut rng)
            .unwrap();

        assert_eq!(room.words().len(), 2);
        let secret: HashSet<_> = room
            .player_names()
            .iter()
            .map(|n| room.assigned_word(n).unwrap().to_string())
            .collect();
        assert_eq!(secret.len(), 2);
    }

    #[test]
    fn start_round_should_refuse_out_of_sync_round() {
        let mut room = room_with(&["ann"]);
        let mut rng = StdRng::seed_from_u64(0);

        let err = room
            .start_round(&request(5, "castles"), &lists(), Instant::now(), &mut rng)
            .unwrap_err();

        assert_eq!(
            err,
            StartError::RoundOutOfSync {
                current: 0,
                requested: Some(5)
            }
        );
        assert_eq!(room.round(), 0);
    }

    #[test]
    fn start_round_should_refuse_a_second_start_within_cooldown() {
        let mut room = room_with(&["ann", "bob"]);
        let mut rng = StdRng::seed_from_u64(0);
        let t0 = Instant::now();

        room.start_round(&request(0, "castles"), &lists(), t0, &mut rng)
            .unwrap();
        let err = room
            .start_round(
                &request(1, "castles"),
                &lists(),
                t0 + Duration::from_millis(500),
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(err, StartError::TooSoon);

        room.start_round(
            &request(1, "castles"),
            &lists(),
            t0 + START_COOLDOWN,
            &mut rng,
        )
        .unwrap();
        assert_eq!(room.round(), 2);
    }

    #[test]
    fn start_round_should_refuse_unknown_or_too_small_lists_without_side_effects() {
        let mut room = room_with(&["ann", "bob"]);
        let mut rng = StdRng::seed_from_u64(0);
        let now = Instant::now();

        assert_eq!(
            room.start_round(&request(0, "nope"), &lists(), now, &mut rng),
            Err(StartError::UnknownWordList("nope".to_string()))
        );
        assert_eq!(
            room.start_round(&request(0, "tiny"), &lists(), now, &mut rng),
            Err(StartError::NotEnoughWords {
                name: "tiny".to_string(),
                available: 1
            })
        );
        let mut missing = request(0, "castles");
        missing.wordlist = None;
        assert_eq!(
            room.start_round(&missing, &lists(), now, &mut rng),
            Err(StartError::MissingWordList)
        );
        assert_eq!(room.round(), 0);

        room.start_round(&request(0, "castles"), &lists(), now, &mut rng)
            .unwrap();
    }

    #[test]
    fn round_dealt_should_give_late_joiner_no_word() {
        let mut room = room_with(&["ann", "bob"]);
        let mut rng = StdRng::seed_from_u64(9);
        room.start_round(&request(0, "castles"), &lists(), Instant::now(), &mut rng)
            .unwrap();
        room.join("cy", 7);

        let dealt = room.round_dealt("cy", &mut rng);

        assert_eq!(dealt.round, 1);
        assert_eq!(dealt.word, None);
        assert_eq!(dealt.players_in_round, vec!["ann", "bob"]);
        assert_eq!(
            dealt.words.iter().sorted().collect_vec(),
            room.words().iter().sorted().collect_vec()
        );
    }
}
