pub mod espn;
pub mod provider;
pub mod snapshot;

pub use espn::EspnFeed;
pub use provider::ScoreFeed;
pub use snapshot::{CompletionStatus, GameSnapshot, RosterPlayer, ScoreboardEvent};
