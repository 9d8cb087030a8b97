//! Per-tournament single-writer service.
//!
//! Each tournament's bracket is owned by a [`TournamentActor`] running in its
//! own Tokio task. Every mutation and read goes through the actor's mpsc
//! inbox, so result reports for one bracket are applied strictly one after
//! another while different tournaments proceed in parallel.
//!
//! ## Example
//!
//! ```no_run
//! use bracket_engine::{Format, Participant, TournamentConfig, TournamentManager};
//!
//! # async fn demo() -> Result<(), bracket_engine::TournamentError> {
//! let manager = TournamentManager::new();
//! let roster = vec![Participant::new("a", "Ada"), Participant::new("b", "Bo")];
//! let id = manager
//!     .create_tournament(TournamentConfig::new("Finals", Format::SingleElimination), &roster)
//!     .await?;
//! let handle = manager.handle(id).await?;
//! handle.report_result(1, [3, 1]).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::{TournamentActor, TournamentHandle};
pub use manager::TournamentManager;
pub use messages::{
    BracketNotification, TournamentError, TournamentId, TournamentMessage, TournamentResult,
    TournamentSummary,
};
