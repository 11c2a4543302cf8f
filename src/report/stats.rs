use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar aggregate. `Undefined` stands in for a mean or rate taken over
/// zero eligible records; it serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stat {
    Value(f64),
    Undefined,
}

impl Stat {
    pub fn value(self) -> Option<f64> {
        match self {
            Stat::Value(v) => Some(v),
            Stat::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Stat::Undefined)
    }

    pub fn ratio(part: u64, whole: u64) -> Stat {
        if whole == 0 {
            Stat::Undefined
        } else {
            Stat::Value(part as f64 / whole as f64)
        }
    }

    /// Defined values ascending, `Undefined` after all of them.
    pub fn ascending(a: &Stat, b: &Stat) -> Ordering {
        match (a, b) {
            (Stat::Value(x), Stat::Value(y)) => x.total_cmp(y),
            (Stat::Value(_), Stat::Undefined) => Ordering::Less,
            (Stat::Undefined, Stat::Value(_)) => Ordering::Greater,
            (Stat::Undefined, Stat::Undefined) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Value(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            Stat::Undefined => f.write_str("n/a"),
        }
    }
}

/// Running sum/count pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn push_opt(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.push(v);
        }
    }

    pub fn stat(&self) -> Stat {
        if self.count == 0 {
            Stat::Undefined
        } else {
            Stat::Value(self.sum / self.count as f64)
        }
    }
}

impl FromIterator<Option<f64>> for Mean {
    fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
        let mut mean = Mean::default();
        for value in iter {
            mean.push_opt(value);
        }
        mean
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> GroupEntry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// Counts per key, in ascending key order. `None` keys are skipped.
pub fn count_by<K, I>(keys: I) -> Vec<GroupEntry<K, u64>>
where
    K: Ord,
    I: IntoIterator<Item = Option<K>>,
{
    let mut counts: BTreeMap<K, u64> = BTreeMap::new();
    for key in keys.into_iter().flatten() {
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(k, n)| GroupEntry::new(k, n))
        .collect()
}

/// Counts per key, largest first; equal counts keep ascending key order.
pub fn count_by_desc<K, I>(keys: I) -> Vec<GroupEntry<K, u64>>
where
    K: Ord,
    I: IntoIterator<Item = Option<K>>,
{
    let mut entries = count_by(keys);
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries
}

/// Mean value per key, smallest mean first. A group whose values are all
/// missing reports `Undefined` and sorts last.
pub fn mean_by<K, I>(pairs: I) -> Vec<GroupEntry<K, Stat>>
where
    K: Ord,
    I: IntoIterator<Item = (Option<K>, Option<f64>)>,
{
    let mut groups: BTreeMap<K, Mean> = BTreeMap::new();
    for (key, value) in pairs {
        if let Some(key) = key {
            groups.entry(key).or_default().push_opt(value);
        }
    }

    let mut entries: Vec<_> = groups
        .into_iter()
        .map(|(k, m)| GroupEntry::new(k, m.stat()))
        .collect();
    entries.sort_by(|a, b| Stat::ascending(&a.value, &b.value));
    entries
}
