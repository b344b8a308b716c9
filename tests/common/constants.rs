//! Shared constants for end-to-end tests
//!
//! When test data changes (song ids, users, timestamps), update only this file.

// ============================================================================
// Songs
// ============================================================================

/// Artist ID for "Casual"
pub const CASUAL_ARTIST_ID: &str = "ARD7TVE1187B99BFB1";

pub const CASUAL_ARTIST_NAME: &str = "Casual";

/// Song ID for "I Didn't Mean To" by Casual
pub const CASUAL_SONG_ID: &str = "SOMZWCG12A8C13C480";

pub const CASUAL_SONG_TITLE: &str = "I Didn't Mean To";

pub const CASUAL_SONG_DURATION: f64 = 218.93179;

/// Artist ID for "Line Renaud"
pub const RENAUD_ARTIST_ID: &str = "ARJIE2Y1187B994AB7";

/// Song ID for "Der Kleine Dompfaff" by Line Renaud
pub const RENAUD_SONG_ID: &str = "SOUPIRU12A6D4FA1E1";

// ============================================================================
// Activity
// ============================================================================

pub const USER_ID: i64 = 73;

pub const OTHER_USER_ID: i64 = 15;

/// 2018-11-01 20:57:10.796 UTC
pub const PLAY_TS: i64 = 1541105830796;

pub const PLAY_START_TIME: &str = "2018-11-01 20:57:10.796";

pub const SESSION_ID: i64 = 518;
