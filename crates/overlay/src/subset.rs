//! Attribute subsetting.

use crate::features::FeatureSet;

/// Features whose attribute `name` equals `value`.
pub fn filter_by_attribute(set: &FeatureSet, name: &str, value: &str) -> FeatureSet {
    let features = set
        .iter()
        .filter(|f| f.attribute(name).map_or(false, |v| v.matches(value)))
        .cloned()
        .collect();
    FeatureSet::with_features(set.crs(), features)
}

/// One subset per requested value plus everything that matched none.
#[derive(Debug, Clone)]
pub struct Partition {
    pub subsets: Vec<(String, FeatureSet)>,
    pub remainder: FeatureSet,
}

impl Partition {
    pub fn get(&self, value: &str) -> Option<&FeatureSet> {
        self.subsets
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, set)| set)
    }

    /// Total features across subsets and remainder.
    pub fn total(&self) -> usize {
        self.subsets.iter().map(|(_, s)| s.len()).sum::<usize>() + self.remainder.len()
    }
}

/// Split a set by the values of one attribute.
///
/// Each feature lands in the subset of the first value it matches, or in the
/// remainder, so every feature appears exactly once.
pub fn partition_by_attribute(set: &FeatureSet, name: &str, values: &[&str]) -> Partition {
    let mut subsets: Vec<(String, FeatureSet)> = values
        .iter()
        .map(|v| (v.to_string(), FeatureSet::new(set.crs())))
        .collect();
    let mut remainder = FeatureSet::new(set.crs());

    for feature in set.iter() {
        let slot = feature
            .attribute(name)
            .and_then(|attr| values.iter().position(|v| attr.matches(v)));
        match slot {
            Some(k) => subsets[k].1.push(feature.clone()),
            None => remainder.push(feature.clone()),
        }
    }

    Partition { subsets, remainder }
}
