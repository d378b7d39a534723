//! Multi-level key tree resolution
//!
//! Resolves hierarchical key spaces (e.g. continent → country → city) when
//! only a prefix of the levels is known. Expansion is lazy:
//!
//! - zero known levels: root keys only, without children
//! - `k` known levels: the chain root → level-`k` key, each being the single
//!   key matching its known value, with the level-`k` key's immediate
//!   children attached and nothing deeper
//!
//! Each level is resolved through a [`KeyLevelSource`]. A failing level aborts
//! the walk; partial trees are never returned.

use crate::key::{first_duplicate_id, MetadataKey};
use async_trait::async_trait;

/// Produces the keys of one level given the ids of the levels above it
#[async_trait]
pub trait KeyLevelSource: Send + Sync {
    /// Error raised by a failing level
    type Error: std::error::Error + Send + Sync + 'static;

    /// Keys at level `prefix.len()`, in resolver order
    async fn keys_at(&self, prefix: &[String]) -> Result<Vec<MetadataKey>, Self::Error>;
}

/// Known values of a partial key, one slot per level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialKey(Vec<Option<String>>);

impl PartialKey {
    /// Build from per-level slots, most significant first
    #[inline]
    #[must_use]
    pub fn new(levels: Vec<Option<String>>) -> Self {
        Self(levels)
    }

    /// Nothing known
    #[inline]
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Known prefix
    ///
    /// # Errors
    /// Returns `Gap` if an unknown level is followed by a known one
    pub fn known_prefix<E>(&self) -> Result<Vec<&str>, KeyTreeError<E>>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let known = self.0.iter().take_while(|slot| slot.is_some()).count();
        if let Some(offset) = self.0[known..].iter().position(Option::is_some) {
            return Err(KeyTreeError::Gap {
                level: known + offset,
            });
        }
        Ok(self.0[..known].iter().flatten().map(String::as_str).collect())
    }
}

/// Key tree resolution failures
#[derive(Debug, thiserror::Error)]
pub enum KeyTreeError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Unknown level followed by a known one
    #[error("partial key has a gap: level {level} is known but an upper level is not")]
    Gap { level: usize },

    /// More known values than the tree has levels
    #[error("partial key has {known} levels but the key tree only has {levels}")]
    TooManyLevels { known: usize, levels: usize },

    /// Two sibling keys share an id
    #[error("duplicate key id '{id}' at level {level}")]
    DuplicateKey { level: usize, id: String },

    /// Known value matches more than one sibling, ignoring case
    #[error("key '{value}' at level '{part}' matches several keys")]
    AmbiguousKey { part: String, value: String },

    /// Known value does not exist at its level
    #[error("no key '{value}' at level '{part}'")]
    UnknownKey { part: String, value: String },

    /// Resolving a level failed
    #[error("resolving level {level} failed: {source}")]
    Level {
        level: usize,
        #[source]
        source: E,
    },
}

/// Walks a key tree with `parts.len()` levels
#[derive(Debug)]
pub struct KeyTreeResolver<'a, S> {
    parts: &'a [String],
    source: &'a S,
}

impl<'a, S: KeyLevelSource> KeyTreeResolver<'a, S> {
    /// Create resolver over named levels
    #[inline]
    #[must_use]
    pub fn new(parts: &'a [String], source: &'a S) -> Self {
        Self { parts, source }
    }

    /// Resolve the tree for a partial key
    ///
    /// # Errors
    /// Returns the first level failure or contract violation
    pub async fn resolve(
        &self,
        partial: &PartialKey,
    ) -> Result<Vec<MetadataKey>, KeyTreeError<S::Error>> {
        let known = partial.known_prefix::<S::Error>()?;
        if known.len() > self.parts.len() {
            return Err(KeyTreeError::TooManyLevels {
                known: known.len(),
                levels: self.parts.len(),
            });
        }

        if known.is_empty() {
            return self.level(&[]).await;
        }

        // Walk down the known prefix, keeping only the matching key per level
        let mut prefix: Vec<String> = Vec::with_capacity(known.len());
        let mut chain: Vec<MetadataKey> = Vec::with_capacity(known.len());
        for (level, value) in known.iter().enumerate() {
            let mut matches = self
                .level(&prefix)
                .await?
                .into_iter()
                .filter(|key| key.id().eq_ignore_ascii_case(value));
            let matched = matches.next().ok_or_else(|| KeyTreeError::UnknownKey {
                part: self.parts[level].clone(),
                value: (*value).to_string(),
            })?;
            if matches.next().is_some() {
                return Err(KeyTreeError::AmbiguousKey {
                    part: self.parts[level].clone(),
                    value: (*value).to_string(),
                });
            }
            prefix.push(matched.id().to_string());
            chain.push(matched);
        }

        if prefix.len() < self.parts.len() {
            let children = self.level(&prefix).await?;
            if let Some(last) = chain.last_mut() {
                last.set_children(children);
            }
        }

        let mut node = chain.pop();
        while let Some(mut parent) = chain.pop() {
            parent.set_children(node.into_iter().collect());
            node = Some(parent);
        }
        Ok(node.into_iter().collect())
    }

    async fn level(&self, prefix: &[String]) -> Result<Vec<MetadataKey>, KeyTreeError<S::Error>> {
        let level = prefix.len();
        let mut keys = self
            .source
            .keys_at(prefix)
            .await
            .map_err(|source| KeyTreeError::Level { level, source })?;

        if let Some(id) = first_duplicate_id(&keys) {
            return Err(KeyTreeError::DuplicateKey {
                level,
                id: id.to_string(),
            });
        }

        let part = self.parts.get(level).map_or("", String::as_str);
        for key in &mut keys {
            key.clear_children();
            key.set_part_name_if_empty(part);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("level unavailable")]
    struct Unavailable;

    /// Static tree keyed by the joined prefix
    #[derive(Default)]
    struct StaticTree {
        levels: HashMap<String, Vec<MetadataKey>>,
        failing_prefix: Option<String>,
        calls: AtomicUsize,
    }

    impl StaticTree {
        fn locations() -> Self {
            let mut levels = HashMap::new();
            levels.insert(
                String::new(),
                vec![MetadataKey::new("AMERICA"), MetadataKey::new("EUROPE")],
            );
            levels.insert(
                "AMERICA".to_string(),
                vec![
                    MetadataKey::new("USA").with_display_name("United States"),
                    MetadataKey::new("ARGENTINA"),
                ],
            );
            levels.insert(
                "AMERICA/USA".to_string(),
                vec![MetadataKey::new("SFO"), MetadataKey::new("NYC")],
            );
            Self {
                levels,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl KeyLevelSource for StaticTree {
        type Error = Unavailable;

        async fn keys_at(&self, prefix: &[String]) -> Result<Vec<MetadataKey>, Unavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let joined = prefix.join("/");
            if self.failing_prefix.as_deref() == Some(joined.as_str()) {
                return Err(Unavailable);
            }
            Ok(self.levels.get(&joined).cloned().unwrap_or_default())
        }
    }

    fn parts() -> Vec<String> {
        vec!["continent".into(), "country".into(), "city".into()]
    }

    fn partial(values: &[Option<&str>]) -> PartialKey {
        PartialKey::new(values.iter().map(|v| v.map(str::to_string)).collect())
    }

    #[tokio::test]
    async fn zero_known_levels_returns_roots_only() {
        let tree = StaticTree::locations();
        let parts = parts();
        let keys = KeyTreeResolver::new(&parts, &tree)
            .resolve(&PartialKey::unknown())
            .await
            .unwrap();

        let ids: Vec<&str> = keys.iter().map(MetadataKey::id).collect();
        assert_eq!(ids, vec!["AMERICA", "EUROPE"]);
        assert!(keys.iter().all(|k| !k.has_children()));
        assert!(keys.iter().all(|k| k.part_name() == "continent"));
        assert_eq!(tree.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_level_known_expands_one_level() {
        let tree = StaticTree::locations();
        let parts = parts();
        let keys = KeyTreeResolver::new(&parts, &tree)
            .resolve(&partial(&[Some("America"), None, None]))
            .await
            .unwrap();

        assert_eq!(keys.len(), 1);
        let continent = &keys[0];
        assert_eq!(continent.id(), "AMERICA");
        assert_eq!(continent.part_name(), "continent");

        let countries: Vec<(&str, &str)> = continent
            .children()
            .iter()
            .map(|c| (c.id(), c.display_name()))
            .collect();
        assert_eq!(countries, vec![("USA", "United States"), ("ARGENTINA", "ARGENTINA")]);
        assert!(continent.children().iter().all(|c| c.part_name() == "country"));
        assert!(continent.children().iter().all(|c| !c.has_children()));
    }

    #[tokio::test]
    async fn two_known_levels_build_a_chain() {
        let tree = StaticTree::locations();
        let parts = parts();
        let keys = KeyTreeResolver::new(&parts, &tree)
            .resolve(&partial(&[Some("AMERICA"), Some("usa"), None]))
            .await
            .unwrap();

        let usa = keys[0].child("USA").expect("country resolved");
        assert_eq!(keys[0].children().len(), 1);
        let cities: Vec<&str> = usa.children().iter().map(MetadataKey::id).collect();
        assert_eq!(cities, vec!["SFO", "NYC"]);
    }

    #[tokio::test]
    async fn fully_known_key_has_no_deeper_level() {
        let tree = StaticTree::locations();
        let parts = parts();
        let keys = KeyTreeResolver::new(&parts, &tree)
            .resolve(&partial(&[Some("AMERICA"), Some("USA"), Some("SFO")]))
            .await
            .unwrap();

        let sfo = keys[0].child("USA").and_then(|usa| usa.child("SFO")).unwrap();
        assert!(!sfo.has_children());
        assert_eq!(tree.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn case_insensitive_collision_is_ambiguous() {
        let mut tree = StaticTree::locations();
        tree.levels.insert(
            "AMERICA".to_string(),
            vec![MetadataKey::new("USA"), MetadataKey::new("usa")],
        );
        let parts = parts();
        let resolver = KeyTreeResolver::new(&parts, &tree);

        let err = resolver
            .resolve(&partial(&[Some("AMERICA"), Some("Usa"), None]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KeyTreeError::AmbiguousKey { ref part, ref value } if part == "country" && value == "Usa"
        ));

        // Siblings differing only in case are fine while nothing selects among them
        let keys = resolver
            .resolve(&partial(&[Some("AMERICA"), None, None]))
            .await
            .unwrap();
        assert_eq!(keys[0].children().len(), 2);
    }

    #[tokio::test]
    async fn gap_is_rejected_before_resolving() {
        let tree = StaticTree::locations();
        let parts = parts();
        let err = KeyTreeResolver::new(&parts, &tree)
            .resolve(&partial(&[Some("AMERICA"), None, Some("SFO")]))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyTreeError::Gap { level: 2 }));
        assert_eq!(tree.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_value_is_reported_with_its_part() {
        let tree = StaticTree::locations();
        let parts = parts();
        let err = KeyTreeResolver::new(&parts, &tree)
            .resolve(&partial(&[Some("ASIA"), None, None]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KeyTreeError::UnknownKey { ref part, ref value } if part == "continent" && value == "ASIA"
        ));
    }

    #[tokio::test]
    async fn failing_level_aborts_the_walk() {
        let mut tree = StaticTree::locations();
        tree.failing_prefix = Some("AMERICA".to_string());
        let parts = parts();
        let err = KeyTreeResolver::new(&parts, &tree)
            .resolve(&partial(&[Some("AMERICA"), None, None]))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyTreeError::Level { level: 1, .. }));
    }

    #[tokio::test]
    async fn too_many_levels_is_rejected() {
        let tree = StaticTree::locations();
        let parts = vec!["continent".to_string()];
        let err = KeyTreeResolver::new(&parts, &tree)
            .resolve(&partial(&[Some("AMERICA"), Some("USA")]))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyTreeError::TooManyLevels { known: 2, levels: 1 }));
    }

    proptest! {
        #[test]
        fn prop_duplicate_siblings_always_fail(
            ids in proptest::collection::vec("[A-Z]{1,3}", 1..8),
            dup in 0..8usize,
        ) {
            let dup_id = ids[dup % ids.len()].clone();
            let mut roots: Vec<MetadataKey> = ids.iter().map(MetadataKey::new).collect();
            roots.push(MetadataKey::new(dup_id));

            let mut tree = StaticTree::default();
            tree.levels.insert(String::new(), roots);
            let parts = vec!["root".to_string()];

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let result = runtime.block_on(
                KeyTreeResolver::new(&parts, &tree).resolve(&PartialKey::unknown()),
            );
            let is_duplicate = matches!(result, Err(KeyTreeError::DuplicateKey { level: 0, .. }));
            prop_assert!(is_duplicate);
        }

        #[test]
        fn prop_gapped_prefixes_are_rejected(
            known in 0..3usize,
            tail in proptest::collection::vec(proptest::bool::ANY, 1..4),
        ) {
            let mut slots: Vec<Option<String>> = (0..known).map(|i| Some(format!("v{i}"))).collect();
            slots.push(None);
            slots.extend(tail.iter().map(|k| k.then(|| "x".to_string())));
            let has_gap = tail.iter().any(|k| *k);

            let partial = PartialKey::new(slots);
            let result = partial.known_prefix::<Unavailable>();
            prop_assert_eq!(result.is_err(), has_gap);
        }
    }
}
