//! In-memory track repository
//!
//! [`Library`] is the ordered collection of tracks plus the single
//! authoritative active id. Insertion order defines next/previous, and both
//! wrap around at the ends.

use crate::error::{LibraryError, Result};
use crate::models::{Track, TrackRecord};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    tracks: Vec<Track>,
    active_id: Option<String>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from tracks, keeping the first occurrence of any
    /// duplicated id. No track is active.
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut library = Self::new();
        for track in tracks {
            if library.contains(&track.id) {
                warn!(track_id = %track.id, "Dropping duplicate track id");
                continue;
            }
            library.tracks.push(track);
        }
        library
    }

    /// Build a library from persisted records.
    ///
    /// Duplicate ids keep their first occurrence. The first surviving record
    /// flagged active becomes the active track; any further flags are ignored.
    pub fn from_records(records: impl IntoIterator<Item = TrackRecord>) -> Self {
        let mut library = Self::new();
        for TrackRecord { track, active } in records {
            if library.contains(&track.id) {
                warn!(track_id = %track.id, "Dropping duplicate track id");
                continue;
            }
            if active {
                if library.active_id.is_none() {
                    library.active_id = Some(track.id.clone());
                } else {
                    warn!(track_id = %track.id, "Ignoring extra active flag");
                }
            }
            library.tracks.push(track);
        }
        library
    }

    /// Add a track at the end.
    ///
    /// # Errors
    ///
    /// [`LibraryError::DuplicateId`] if a track with the same id exists,
    /// [`LibraryError::InvalidInput`] if the track fails validation.
    pub fn append(&mut self, track: Track) -> Result<()> {
        track.validate().map_err(|message| LibraryError::InvalidInput {
            field: "track".to_string(),
            message,
        })?;

        if self.contains(&track.id) {
            return Err(LibraryError::DuplicateId(track.id));
        }

        debug!(track_id = %track.id, position = self.tracks.len(), "Track appended");
        self.tracks.push(track);
        Ok(())
    }

    /// Remove a track and return it. Removing the active track clears the
    /// active marker.
    pub fn remove(&mut self, id: &str) -> Result<Track> {
        let index = self.find_index(id)?;
        let track = self.tracks.remove(index);

        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }

        debug!(track_id = %id, "Track removed");
        Ok(track)
    }

    /// Make `id` the single active track.
    pub fn set_active(&mut self, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(LibraryError::track_not_found(id));
        }
        self.active_id = Some(id.to_string());
        Ok(())
    }

    pub fn clear_active(&mut self) {
        self.active_id = None;
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Track> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Position of `id` in insertion order.
    ///
    /// # Errors
    ///
    /// [`LibraryError::EmptyLibrary`] when there are no tracks,
    /// [`LibraryError::NotFound`] for an unknown id.
    pub fn find_index(&self, id: &str) -> Result<usize> {
        if self.tracks.is_empty() {
            return Err(LibraryError::EmptyLibrary);
        }
        self.tracks
            .iter()
            .position(|track| track.id == id)
            .ok_or_else(|| LibraryError::track_not_found(id))
    }

    /// The track after `id`, wrapping to the first.
    pub fn next(&self, id: &str) -> Result<&Track> {
        let index = self.find_index(id)?;
        Ok(&self.tracks[(index + 1) % self.tracks.len()])
    }

    /// The track before `id`, wrapping to the last.
    pub fn previous(&self, id: &str) -> Result<&Track> {
        let index = self.find_index(id)?;
        let len = self.tracks.len();
        Ok(&self.tracks[(index + len - 1) % len])
    }

    /// Ordered snapshot with the derived `active` flag.
    pub fn all(&self) -> Vec<TrackRecord> {
        self.tracks
            .iter()
            .map(|track| {
                let active = self.active_id.as_deref() == Some(track.id.as_str());
                TrackRecord::new(track.clone(), active)
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracks.iter().any(|track| track.id == id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(id, id, "Unknown Artist", "cover", format!("data:audio/mpeg;base64,{id}"))
    }

    fn library(ids: &[&str]) -> Library {
        let mut library = Library::new();
        for id in ids {
            library.append(track(id)).unwrap();
        }
        library
    }

    #[test]
    fn test_append_rejects_duplicates() {
        let mut library = library(&["a"]);
        let err = library.append(track("a")).unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateId(id) if id == "a"));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_append_validates() {
        let mut library = Library::new();
        let mut bad = track("a");
        bad.audio.clear();
        assert!(matches!(
            library.append(bad),
            Err(LibraryError::InvalidInput { .. })
        ));
        assert!(library.is_empty());
    }

    #[test]
    fn test_set_active_marks_exactly_one() {
        let mut library = library(&["a", "b", "c"]);
        library.set_active("a").unwrap();
        library.set_active("b").unwrap();

        let active: Vec<_> = library
            .all()
            .into_iter()
            .filter(|record| record.active)
            .map(|record| record.track.id)
            .collect();
        assert_eq!(active, vec!["b".to_string()]);
        assert_eq!(library.active().map(|t| t.id.as_str()), Some("b"));
    }

    #[test]
    fn test_set_active_unknown_id() {
        let mut library = library(&["a"]);
        library.set_active("a").unwrap();
        assert!(matches!(
            library.set_active("zzz"),
            Err(LibraryError::NotFound { .. })
        ));
        assert_eq!(library.active_id(), Some("a"));
    }

    #[test]
    fn test_next_previous_wrap() {
        let library = library(&["a", "b", "c"]);

        assert_eq!(library.next("c").unwrap().id, "a");
        assert_eq!(library.previous("a").unwrap().id, "c");

        for id in ["a", "b", "c"] {
            let next = library.next(id).unwrap().id.clone();
            assert_eq!(library.previous(&next).unwrap().id, id);
            let previous = library.previous(id).unwrap().id.clone();
            assert_eq!(library.next(&previous).unwrap().id, id);
        }
    }

    #[test]
    fn test_single_track_is_its_own_neighbour() {
        let library = library(&["only"]);
        assert_eq!(library.next("only").unwrap().id, "only");
        assert_eq!(library.previous("only").unwrap().id, "only");
    }

    #[test]
    fn test_navigation_errors() {
        let empty = Library::new();
        assert!(matches!(empty.find_index("a"), Err(LibraryError::EmptyLibrary)));
        assert!(matches!(empty.next("a"), Err(LibraryError::EmptyLibrary)));

        let library = library(&["a"]);
        assert!(matches!(
            library.previous("b"),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_active_clears_marker() {
        let mut library = library(&["a", "b"]);
        library.set_active("b").unwrap();

        let removed = library.remove("b").unwrap();
        assert_eq!(removed.id, "b");
        assert!(library.active_id().is_none());
        assert_eq!(library.len(), 1);

        assert!(matches!(
            library.remove("b"),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_from_records_dedupes_and_keeps_first_active() {
        let records = vec![
            TrackRecord::new(track("a"), false),
            TrackRecord::new(track("b"), true),
            TrackRecord::new(track("a"), true),
            TrackRecord::new(track("c"), true),
        ];

        let library = Library::from_records(records);

        let ids: Vec<_> = library.tracks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(library.active_id(), Some("b"));
    }

    #[test]
    fn test_from_tracks_has_no_active() {
        let library = Library::from_tracks(vec![track("a"), track("a"), track("b")]);
        assert_eq!(library.len(), 2);
        assert!(library.active_id().is_none());
        assert_eq!(library.first().map(|t| t.id.as_str()), Some("a"));
    }
}
