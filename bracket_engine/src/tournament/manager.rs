//! Tournament manager for spawning and tracking tournament actors.

use log::info;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{
    actor::{TournamentActor, TournamentHandle},
    messages::{TournamentError, TournamentId, TournamentResult, TournamentSummary},
};
use crate::{bracket::Participant, config::TournamentConfig, pairing::generate_with_scoring};

/// Registry of running tournaments
#[derive(Clone)]
pub struct TournamentManager {
    /// Active tournament handles
    tournaments: Arc<RwLock<HashMap<TournamentId, TournamentHandle>>>,

    /// Next tournament ID
    next_tournament_id: Arc<RwLock<TournamentId>>,
}

impl TournamentManager {
    pub fn new() -> Self {
        Self {
            tournaments: Arc::new(RwLock::new(HashMap::new())),
            next_tournament_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Generate a bracket for `participants` and spawn its actor.
    ///
    /// Generation errors are returned before any ID is consumed.
    pub async fn create_tournament(
        &self,
        config: TournamentConfig,
        participants: &[Participant],
    ) -> TournamentResult<TournamentId> {
        let bracket =
            generate_with_scoring(participants, config.format, &config.options, &config.standings)?;

        let mut next_id = self.next_tournament_id.write().await;
        let tournament_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let name = config.name.clone();
        let (actor, handle) = TournamentActor::new(tournament_id, config, bracket);

        let mut tournaments = self.tournaments.write().await;
        tournaments.insert(tournament_id, handle);
        drop(tournaments);

        tokio::spawn(async move {
            actor.run().await;
        });

        info!("Created tournament {} '{}'", tournament_id, name);

        Ok(tournament_id)
    }

    pub async fn get_tournament(&self, tournament_id: TournamentId) -> Option<TournamentHandle> {
        let tournaments = self.tournaments.read().await;
        tournaments.get(&tournament_id).cloned()
    }

    /// Like [`Self::get_tournament`], failing with `NotFound`
    pub async fn handle(&self, tournament_id: TournamentId) -> TournamentResult<TournamentHandle> {
        self.get_tournament(tournament_id)
            .await
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    /// Summaries of every running tournament, in ID order
    pub async fn list_tournaments(&self) -> Vec<TournamentSummary> {
        let handles: Vec<TournamentHandle> = {
            let tournaments = self.tournaments.read().await;
            tournaments.values().cloned().collect()
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            // A tournament closing mid-listing is simply skipped
            if let Ok(summary) = handle.summary().await {
                summaries.push(summary);
            }
        }
        summaries.sort_by_key(|s| s.id);
        summaries
    }

    /// Stop a tournament's actor and forget it
    pub async fn close_tournament(&self, tournament_id: TournamentId) -> TournamentResult<()> {
        let handle = self
            .tournaments
            .write()
            .await
            .remove(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        match handle.close().await {
            Ok(()) | Err(TournamentError::Closed(_)) => {}
            Err(err) => return Err(err),
        }

        info!("Closed tournament {}", tournament_id);
        Ok(())
    }

    pub async fn active_tournament_count(&self) -> usize {
        let tournaments = self.tournaments.read().await;
        tournaments.len()
    }
}

impl Default for TournamentManager {
    fn default() -> Self {
        Self::new()
    }
}
