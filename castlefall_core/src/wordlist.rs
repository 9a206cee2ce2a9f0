use crate::error::{Error, Result};
use itertools::Itertools;
use std::{collections::BTreeMap, fs, path::Path};

/// All word lists the server can deal from, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct WordLists {
    lists: BTreeMap<String, Vec<String>>,
}

impl WordLists {
    pub fn new() -> Self {
        WordLists::default()
    }

    /// Loads every file in `dir` as one list. `castles.txt` becomes `castles`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| Error::WordListDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut lists = WordLists::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::WordListDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let contents = fs::read_to_string(&path).map_err(|source| Error::WordListFile {
                path: path.clone(),
                source,
            })?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let key = file_name
                .strip_suffix(".txt")
                .unwrap_or(&file_name)
                .to_string();
            lists.insert(key, parse_words(&contents));
        }
        Ok(lists)
    }

    pub fn insert(&mut self, name: String, words: Vec<String>) {
        self.lists.insert(name, words);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.lists.get(name).map(|words| words.as_slice())
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// `(name, word count)` pairs in name order.
    pub fn summary(&self) -> Vec<(String, usize)> {
        self.lists
            .iter()
            .map(|(name, words)| (name.clone(), words.len()))
            .collect_vec()
    }
}

fn parse_words(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unique()
        .map(str::to_string)
        .collect_vec()
}
