use std::slice::Iter;

/// Represent a range of time, from a start to an end, generally in seconds
#[derive(Clone, Debug, PartialEq)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Returns the start time of the range
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Returns the end time of the range
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Returns `true` if `pos` is inside that range, both bounds included.
    pub fn contains(&self, pos: f64) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Abstracts non-contiguous chronological ranges of time, generally expressed in seconds.
///
/// Ranges are kept sorted and never overlap nor touch each other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeRanges {
    ranges: Vec<TimeRange>,
}

impl TimeRanges {
    /// Create a new empty `TimeRanges` object
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `TimeRanges` from a flat list of `[start, end, start, end, ...]` values, which is
    /// how buffered ranges are communicated by the JavaScript-side.
    ///
    /// A trailing odd value and ranges whose end is before their start are ignored.
    pub fn from_flat(flat: &[f64]) -> Self {
        let mut ranges = Self::new();
        for pair in flat.chunks_exact(2) {
            ranges.add(pair[0], pair[1]);
        }
        ranges
    }

    /// Add a range of time to that `TimeRanges` object, merging it with the ranges that are
    /// already there.
    pub fn add(&mut self, start: f64, end: f64) {
        if !(start <= end) {
            return;
        }
        let first_touching = self.ranges.iter().position(|r| r.end >= start);
        let first_touching = match first_touching {
            None => {
                self.ranges.push(TimeRange { start, end });
                return;
            }
            Some(idx) => idx,
        };
        if end < self.ranges[first_touching].start {
            self.ranges
                .insert(first_touching, TimeRange { start, end });
            return;
        }

        let mut last_touching = first_touching;
        while last_touching + 1 < self.ranges.len() && self.ranges[last_touching + 1].start <= end
        {
            last_touching += 1;
        }
        let merged = TimeRange {
            start: start.min(self.ranges[first_touching].start),
            end: end.max(self.ranges[last_touching].end),
        };
        self.ranges.drain(first_touching + 1..=last_touching);
        self.ranges[first_touching] = merged;
    }

    /// Returns the number of non-contiguous ranges in this `TimeRanges` object
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the starting time of the range whose index is given in argument.
    ///
    /// Returns `None` if the given index is superior or equal to the number of actual ranges.
    pub fn start(&self, idx: usize) -> Option<f64> {
        self.ranges.get(idx).map(|r| r.start)
    }

    /// Returns the ending time of the range whose index is given in argument.
    ///
    /// Returns `None` if the given index is superior or equal to the number of actual ranges.
    pub fn end(&self, idx: usize) -> Option<f64> {
        self.ranges.get(idx).map(|r| r.end)
    }

    /// Returns the range containing the given position.
    ///
    /// Returns `None` if no range in this `TimeRanges` object contains it.
    pub fn range_for(&self, pos: f64) -> Option<&TimeRange> {
        self.ranges.iter().find(|r| r.contains(pos))
    }

    /// Amount of contiguous data, in seconds, buffered after `pos`.
    ///
    /// `0.` when `pos` is not in a buffered range.
    pub fn buffer_ahead(&self, pos: f64) -> f64 {
        match self.range_for(pos) {
            Some(range) => (range.end - pos).max(0.),
            None => 0.,
        }
    }
}

impl<'a> IntoIterator for &'a TimeRanges {
    type Item = &'a TimeRange;
    type IntoIter = Iter<'a, TimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
