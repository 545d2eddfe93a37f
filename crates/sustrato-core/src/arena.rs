//! Flat per-(channel, section) state storage.
//!
//! Every multi-channel processor in this crate keeps its per-channel (and,
//! for filters, per-section) records in one contiguous `Vec`, indexed as
//! `channel * sections + section`. The arena is sized once in `prepare` and
//! never reallocates afterwards, so the process path stays allocation-free and
//! a channel's whole cascade sits in adjacent memory.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Contiguous storage of fixed-size records for `channels × sections` slots.
///
/// Out-of-range indices panic with a descriptive message. An arena that has
/// never been prepared has zero channels, so any access before `prepare`
/// fails the same way.
#[derive(Debug, Default)]
pub struct SectionArena<R> {
    records: Vec<R>,
    channels: usize,
    sections: usize,
}

impl<R: Clone + Default> SectionArena<R> {
    /// Creates an empty, unprepared arena.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            channels: 0,
            sections: 0,
        }
    }

    /// Reallocates for `channels × sections` default-initialized records.
    ///
    /// This is the only allocating operation.
    pub fn prepare(&mut self, channels: usize, sections: usize) {
        self.records.clear();
        self.records.resize(channels * sections, R::default());
        self.channels = channels;
        self.sections = sections;
    }

    /// Resets every record to its default value without reallocating.
    pub fn fill_default(&mut self) {
        self.records.fill(R::default());
    }
}

impl<R> SectionArena<R> {
    /// Number of prepared channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of prepared sections per channel.
    #[inline]
    pub fn sections(&self) -> usize {
        self.sections
    }

    /// Returns true if `prepare` has not been called (or was called with zero channels).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record for one (channel, section) pair.
    #[inline]
    #[track_caller]
    pub fn get(&self, channel: usize, section: usize) -> &R {
        let index = self.index(channel, section);
        &self.records[index]
    }

    /// Mutable record for one (channel, section) pair.
    #[inline]
    #[track_caller]
    pub fn get_mut(&mut self, channel: usize, section: usize) -> &mut R {
        let index = self.index(channel, section);
        &mut self.records[index]
    }

    /// All sections of one channel, in cascade order.
    #[inline]
    #[track_caller]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [R] {
        check_channel(channel, self.channels);
        let start = channel * self.sections;
        &mut self.records[start..start + self.sections]
    }

    /// Iterator over every record, channel-major.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, R> {
        self.records.iter_mut()
    }

    /// Iterator over one section's record in every channel.
    #[track_caller]
    pub fn section_mut(&mut self, section: usize) -> impl Iterator<Item = &mut R> {
        check_section(section, self.sections);
        self.records.iter_mut().skip(section).step_by(self.sections.max(1))
    }

    #[inline]
    #[track_caller]
    fn index(&self, channel: usize, section: usize) -> usize {
        check_channel(channel, self.channels);
        check_section(section, self.sections);
        channel * self.sections + section
    }
}

/// Panics unless `channel < channels`.
#[inline]
#[track_caller]
pub fn check_channel(channel: usize, channels: usize) {
    assert!(
        channel < channels,
        "channel index {channel} out of range ({channels} prepared; was prepare() called?)"
    );
}

/// Panics unless `section < sections`.
#[inline]
#[track_caller]
pub fn check_section(section: usize, sections: usize) {
    assert!(
        section < sections,
        "section index {section} out of range (prepared for {sections} section(s))"
    );
}
