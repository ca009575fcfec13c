//! FavoritesStore - ordered (application path, device id) associations
//!
//! Associations are addressed by 1-based ordinals that always form the
//! contiguous range `1..=len()`. The `app{i}`/`device{i}` key pairs only
//! exist at the persistence boundary.

use std::collections::BTreeMap;
use tracing::{debug, warn};

const APP_KEY_PREFIX: &str = "app";
const DEVICE_KEY_PREFIX: &str = "device";

/// A favorite binding of an executable path to an output device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FavoriteAssociation {
    pub app_path: String,
    pub device_id: String,
}

impl FavoriteAssociation {
    pub fn new(app_path: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            app_path: app_path.into(),
            device_id: device_id.into(),
        }
    }

    fn matches(&self, app_path: &str, device_id: &str) -> bool {
        self.app_path == app_path && self.device_id == device_id
    }
}

/// What normalization had to repair when rebuilding a store from keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Ordinals that had only one of the two keys
    pub incomplete: Vec<usize>,
    /// Ordinals whose pair duplicated an earlier one
    pub duplicates: Vec<usize>,
    /// Keys that are neither `app{i}` nor `device{i}`
    pub unknown_keys: Vec<String>,
    /// Whether the surviving ordinals had to be renumbered
    pub compacted: bool,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.incomplete.is_empty()
            && self.duplicates.is_empty()
            && self.unknown_keys.is_empty()
            && !self.compacted
    }
}

/// Ordered favorites store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesStore {
    entries: Vec<FavoriteAssociation>,
}

impl FavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of associations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of persisted keys, always `2 * len()`
    pub fn key_count(&self) -> usize {
        self.entries.len() * 2
    }

    /// Association at a 1-based ordinal
    pub fn get(&self, ordinal: usize) -> Option<&FavoriteAssociation> {
        ordinal.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Iterate `(ordinal, association)` in store order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FavoriteAssociation)> {
        self.entries.iter().enumerate().map(|(i, a)| (i + 1, a))
    }

    pub fn associations(&self) -> &[FavoriteAssociation] {
        &self.entries
    }

    pub fn contains(&self, app_path: &str, device_id: &str) -> bool {
        self.entries.iter().any(|a| a.matches(app_path, device_id))
    }

    /// Ordinals currently bound to `app_path`
    pub fn ordinals_for_path(&self, app_path: &str) -> Vec<usize> {
        self.iter()
            .filter(|(_, a)| a.app_path == app_path)
            .map(|(ordinal, _)| ordinal)
            .collect()
    }

    /// Append an association unless the exact pair is already stored.
    ///
    /// Returns the new ordinal, or `None` when the pair was a duplicate.
    pub fn add(&mut self, app_path: &str, device_id: &str) -> Option<usize> {
        if self.contains(app_path, device_id) {
            debug!(app_path, device_id, "Favorite already stored");
            return None;
        }
        self.entries.push(FavoriteAssociation::new(app_path, device_id));
        debug!(app_path, device_id, ordinal = self.len(), "Favorite added");
        Some(self.len())
    }

    /// Remove the association at `ordinal`, shifting every later one down.
    pub fn remove_at(&mut self, ordinal: usize) -> Option<FavoriteAssociation> {
        if ordinal == 0 || ordinal > self.entries.len() {
            warn!(ordinal, len = self.len(), "Favorite ordinal out of range");
            return None;
        }
        let removed = self.entries.remove(ordinal - 1);
        debug!(ordinal, app_path = %removed.app_path, "Favorite removed");
        Some(removed)
    }

    /// Remove a batch of ordinals that were all read before the first removal.
    ///
    /// Ordinals are applied from the highest down so earlier removals never
    /// shift a later target. Returns how many were removed.
    pub fn remove_many(&mut self, ordinals: &[usize]) -> usize {
        let mut sorted = ordinals.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        sorted
            .into_iter()
            .filter(|&ordinal| self.remove_at(ordinal).is_some())
            .count()
    }

    /// Remove every association for `app_path`. Returns how many were removed.
    pub fn remove_all_for_path(&mut self, app_path: &str) -> usize {
        let mut removed = 0;
        let mut ordinal = 1;
        while ordinal <= self.len() {
            if self.entries[ordinal - 1].app_path == app_path {
                self.remove_at(ordinal);
                removed += 1;
                // the next association slid into this ordinal
                continue;
            }
            ordinal += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        debug!(len = self.len(), "Favorites cleared");
        self.entries.clear();
    }

    /// Encode as `app{i}`/`device{i}` pairs in ordinal order
    pub fn to_key_values(&self) -> Vec<(String, String)> {
        self.iter()
            .flat_map(|(ordinal, a)| {
                [
                    (format!("{APP_KEY_PREFIX}{ordinal}"), a.app_path.clone()),
                    (format!("{DEVICE_KEY_PREFIX}{ordinal}"), a.device_id.clone()),
                ]
            })
            .collect()
    }

    /// Rebuild a store from persisted keys, repairing whatever is broken.
    ///
    /// Pairs are taken in ordinal order; an ordinal missing either key is
    /// dropped, duplicate pairs keep their first occurrence, and the
    /// survivors are renumbered to `1..=N`.
    pub fn from_key_values<I, K, V>(pairs: I) -> (Self, LoadReport)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut slots: BTreeMap<usize, (Option<String>, Option<String>)> = BTreeMap::new();
        let mut report = LoadReport::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            match parse_key(key) {
                Some((KeyKind::App, ordinal)) => {
                    slots.entry(ordinal).or_default().0 = Some(value.into())
                }
                Some((KeyKind::Device, ordinal)) => {
                    slots.entry(ordinal).or_default().1 = Some(value.into())
                }
                None => report.unknown_keys.push(key.to_string()),
            }
        }

        let mut store = Self::new();
        let mut expected = 1;
        for (ordinal, slot) in slots {
            match slot {
                (Some(app_path), Some(device_id)) => {
                    if store.add(&app_path, &device_id).is_none() {
                        report.duplicates.push(ordinal);
                        report.compacted = true;
                        continue;
                    }
                    if ordinal != expected {
                        report.compacted = true;
                    }
                    expected += 1;
                }
                _ => {
                    report.incomplete.push(ordinal);
                    report.compacted = true;
                }
            }
        }

        (store, report)
    }
}

enum KeyKind {
    App,
    Device,
}

fn parse_key(key: &str) -> Option<(KeyKind, usize)> {
    let (kind, digits) = if let Some(rest) = key.strip_prefix(DEVICE_KEY_PREFIX) {
        (KeyKind::Device, rest)
    } else if let Some(rest) = key.strip_prefix(APP_KEY_PREFIX) {
        (KeyKind::App, rest)
    } else {
        return None;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<usize>() {
        Ok(ordinal) if ordinal >= 1 => Some((kind, ordinal)),
        _ => None,
    }
}
