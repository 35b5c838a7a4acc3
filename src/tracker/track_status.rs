/// Track status enumeration for the tracking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackStatus {
    /// Newly spawned track, not yet confirmed
    #[default]
    Tentative,
    /// Supported by a detection this frame
    Tracked,
    /// Alive but without a supporting detection
    Lost,
}
