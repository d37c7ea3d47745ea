//! Band grouping: partition pointings by filter, preserving source order.

use crate::model::PointingRecord;

/// Pointings partitioned by band.
///
/// Groups appear in the order their band was first seen, and each group
/// keeps the relative input order of its records. No group is ever empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandGroups {
    groups: Vec<(String, Vec<PointingRecord>)>,
}

impl BandGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn bands(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(band, _)| band.as_str())
    }

    pub fn get(&self, band: &str) -> Option<&[PointingRecord]> {
        self.groups
            .iter()
            .find(|(b, _)| b == band)
            .map(|(_, records)| records.as_slice())
    }
}

impl IntoIterator for BandGroups {
    type Item = (String, Vec<PointingRecord>);
    type IntoIter = std::vec::IntoIter<(String, Vec<PointingRecord>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Group records by exact band string.
///
/// Empty or unrecognized bands form their own group; rejecting them is the
/// caller's policy, not the grouper's.
pub fn group_by_band(records: impl IntoIterator<Item = PointingRecord>) -> BandGroups {
    let mut groups: Vec<(String, Vec<PointingRecord>)> = Vec::new();

    for record in records {
        match groups.iter_mut().find(|(band, _)| *band == record.band) {
            Some((_, members)) => members.push(record),
            None => groups.push((record.band.clone(), vec![record])),
        }
    }

    BandGroups { groups }
}
