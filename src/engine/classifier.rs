//! Pure box-state classification.

use crate::types::{BoxRecord, BoxState};

/// Classify a freshly fetched box detail record.
///
/// The remote owns all of this state; classification is derived and must be
/// recomputed from a fresh detail fetch after every mutating action, since
/// mutating a box invalidates earlier snapshots. Checks run in fixed order
/// so a box that is both opened and ready still classifies as `Opened`.
pub fn classify(detail: &BoxRecord) -> BoxState {
    if !detail.active {
        return BoxState::Inactive;
    }
    if detail.opened {
        return BoxState::Opened;
    }
    if detail.is_ready {
        return BoxState::ReadyToClaim;
    }
    if detail.start_time.is_some() {
        return BoxState::Mining;
    }
    if detail.start_time.is_none() && !detail.is_ready && !detail.opened && detail.active {
        return BoxState::Startable;
    }
    BoxState::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn base_box() -> BoxRecord {
        BoxRecord {
            id: "box1".to_string(),
            name: "Test Box".to_string(),
            active: true,
            start_time: None,
            is_ready: false,
            opened: false,
            ready_at: None,
            mission_url: None,
        }
    }

    #[test]
    fn test_inactive_wins_regardless_of_other_fields() {
        let mut detail = base_box();
        detail.active = false;
        detail.is_ready = true;
        detail.opened = true;
        detail.start_time = Some(Utc::now());
        assert_eq!(classify(&detail), BoxState::Inactive);
    }

    #[test]
    fn test_opened_is_terminal() {
        let mut detail = base_box();
        detail.opened = true;
        assert_eq!(classify(&detail), BoxState::Opened);

        // opened beats ready and mining
        detail.is_ready = true;
        detail.start_time = Some(Utc::now());
        assert_eq!(classify(&detail), BoxState::Opened);
    }

    #[test]
    fn test_ready_to_claim() {
        let mut detail = base_box();
        detail.is_ready = true;
        detail.start_time = Some(Utc::now());
        assert_eq!(classify(&detail), BoxState::ReadyToClaim);

        // ready does not require a start time on the wire
        detail.start_time = None;
        assert_eq!(classify(&detail), BoxState::ReadyToClaim);
    }

    #[test]
    fn test_mining() {
        let mut detail = base_box();
        detail.start_time = Some(Utc::now());
        assert_eq!(classify(&detail), BoxState::Mining);
    }

    #[test]
    fn test_startable() {
        let detail = base_box();
        assert_eq!(classify(&detail), BoxState::Startable);
    }
}
