//! Data models for rinkside entities.
//!
//! Records mirror the backend tables one-to-one; `New*` structs are the
//! insert payloads (no server-assigned columns).
//!
//! - `Coach`, `Team`: organization structure
//! - `Player`: shared player profiles with contact and parent info
//! - `Tryout`, `TryoutRegistration`: selection events
//! - `RegularSeason`, `RegularSeasonPlayer`, `Game`: rosters and schedule
//! - `EvaluationCriteria`, `PlayerEvaluation`, `EvaluationScore`: scouting
//! - `Camp`, `CampRegistration`: off-season camps
//! - `PlayerPost`, `PostComment`, `PostLike`: the player feed
//! - `WaitingListEntry`: pre-launch signups

pub mod camp;
pub mod coach;
pub mod evaluation;
pub mod feed;
pub mod player;
pub mod season;
pub mod team;
pub mod tryout;
pub mod waiting_list;

pub use camp::{Camp, CampRegistration, CampStatus, NewCamp, NewCampRegistration};
pub use coach::{Coach, NewCoach};
pub use evaluation::{
    EvaluationCriteria, EvaluationScore, NewEvaluationCriteria, NewEvaluationScore,
    NewPlayerEvaluation, PlayerEvaluation,
};
pub use feed::{NewPostComment, NewPostLike, NewPlayerPost, PlayerPost, PostComment, PostLike};
pub use player::{Handedness, NewPlayer, Player, PlayerSortColumn, Position};
pub use season::{
    Game, GameStatus, NewGame, NewRegularSeason, NewRegularSeasonPlayer, RegularSeason,
    RegularSeasonPlayer, SeasonPlayerStatus, SeasonStatus,
};
pub use team::{NewTeam, Team};
pub use tryout::{NewTryout, NewTryoutRegistration, RegistrationStatus, Tryout, TryoutRegistration, TryoutStatus};
pub use waiting_list::{NewWaitingListEntry, WaitingListEntry, WaitingListRole};
