//! Tournament actor: the single writer of one bracket.

use log::{debug, info, warn};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

use super::messages::{
    BracketNotification, TournamentError, TournamentId, TournamentMessage, TournamentResult,
    TournamentSummary,
};
use crate::{
    bracket::{Bracket, MatchId, MatchUpdate, RoundStatus},
    config::TournamentConfig,
    errors::{BracketError, BracketResult},
    pairing::Format,
    standings::StandingRow,
};

/// Inbox capacity of a tournament actor
const INBOX_CAPACITY: usize = 100;

/// Tournament actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TournamentHandle {
    sender: mpsc::Sender<TournamentMessage>,
    tournament_id: TournamentId,
}

impl TournamentHandle {
    pub fn new(sender: mpsc::Sender<TournamentMessage>, tournament_id: TournamentId) -> Self {
        Self {
            sender,
            tournament_id,
        }
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Send a message to the tournament
    pub async fn send(&self, message: TournamentMessage) -> TournamentResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TournamentError::Closed(self.tournament_id))
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> TournamentMessage,
    ) -> TournamentResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(message(tx)).await?;
        rx.await
            .map_err(|_| TournamentError::Closed(self.tournament_id))
    }

    pub async fn report_result(
        &self,
        match_id: MatchId,
        scores: [i64; 2],
    ) -> TournamentResult<MatchUpdate> {
        let update = self
            .request(|response| TournamentMessage::ReportResult {
                match_id,
                scores,
                response,
            })
            .await??;
        Ok(update)
    }

    pub async fn start_match(&self, match_id: MatchId) -> TournamentResult<bool> {
        let started = self
            .request(|response| TournamentMessage::StartMatch { match_id, response })
            .await??;
        Ok(started)
    }

    pub async fn pair_next_round(&self) -> TournamentResult<Vec<MatchId>> {
        let ids = self
            .request(|response| TournamentMessage::PairNextRound { response })
            .await??;
        Ok(ids)
    }

    pub async fn bracket(&self) -> TournamentResult<Bracket> {
        self.request(|response| TournamentMessage::GetBracket { response })
            .await
    }

    pub async fn standings(&self) -> TournamentResult<Vec<StandingRow>> {
        self.request(|response| TournamentMessage::GetStandings { response })
            .await
    }

    pub async fn summary(&self) -> TournamentResult<TournamentSummary> {
        self.request(|response| TournamentMessage::GetSummary { response })
            .await
    }

    /// Register for notifications. Returns the receiving end.
    pub async fn subscribe(
        &self,
        subscriber_id: i64,
        capacity: usize,
    ) -> TournamentResult<mpsc::Receiver<BracketNotification>> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        self.send(TournamentMessage::Subscribe {
            subscriber_id,
            sender,
        })
        .await?;
        Ok(receiver)
    }

    pub async fn unsubscribe(&self, subscriber_id: i64) -> TournamentResult<()> {
        self.send(TournamentMessage::Unsubscribe { subscriber_id })
            .await
    }

    pub async fn close(&self) -> TournamentResult<()> {
        self.request(|response| TournamentMessage::Close { response })
            .await
    }
}

/// Actor owning one tournament's bracket.
///
/// Messages are handled one at a time, so every read sees a bracket with
/// propagation either fully applied or not started.
pub struct TournamentActor {
    id: TournamentId,
    config: TournamentConfig,
    bracket: Bracket,
    inbox: mpsc::Receiver<TournamentMessage>,
    subscribers: HashMap<i64, mpsc::Sender<BracketNotification>>,
    is_closed: bool,
}

impl TournamentActor {
    /// Create an actor for an already generated bracket
    pub fn new(
        id: TournamentId,
        config: TournamentConfig,
        bracket: Bracket,
    ) -> (Self, TournamentHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let actor = Self {
            id,
            config,
            bracket,
            inbox,
            subscribers: HashMap::new(),
            is_closed: false,
        };
        (actor, TournamentHandle::new(sender, id))
    }

    /// Run the actor event loop until closed or every handle is dropped
    pub async fn run(mut self) {
        info!("Tournament {} '{}' starting", self.id, self.config.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
        }

        info!("Tournament {} '{}' stopped", self.id, self.config.name);
    }

    fn handle_message(&mut self, message: TournamentMessage) {
        match message {
            TournamentMessage::ReportResult {
                match_id,
                scores,
                response,
            } => {
                let result = self.handle_report(match_id, scores);
                let _ = response.send(result);
            }

            TournamentMessage::StartMatch { match_id, response } => {
                let _ = response.send(self.bracket.start_match(match_id));
            }

            TournamentMessage::PairNextRound { response } => {
                let result = self.handle_pair_next_round();
                let _ = response.send(result);
            }

            TournamentMessage::GetBracket { response } => {
                let _ = response.send(self.bracket.clone());
            }

            TournamentMessage::GetStandings { response } => {
                let _ = response.send(self.bracket.standings());
            }

            TournamentMessage::GetSummary { response } => {
                let _ = response.send(self.summary());
            }

            TournamentMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                self.subscribers.insert(subscriber_id, sender);
                debug!(
                    "Subscriber {} subscribed to tournament {}",
                    subscriber_id, self.id
                );
            }

            TournamentMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                debug!(
                    "Subscriber {} unsubscribed from tournament {}",
                    subscriber_id, self.id
                );
            }

            TournamentMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    fn handle_report(&mut self, match_id: MatchId, scores: [i64; 2]) -> BracketResult<MatchUpdate> {
        let update = self.bracket.report_result(match_id, scores)?;

        self.notify(BracketNotification::MatchesCompleted {
            tournament_id: self.id,
            changed: update.changed.clone(),
            completed: update.completed.clone(),
        });

        if self.config.auto_advance_rounds && self.swiss_round_finished() {
            match self.handle_pair_next_round() {
                Ok(_) | Err(BracketError::RoundsExhausted { .. }) => {}
                Err(err) => warn!("Tournament {}: could not pair next round: {}", self.id, err),
            }
        }

        if self.bracket.is_complete() {
            self.notify(BracketNotification::TournamentComplete {
                tournament_id: self.id,
                champion: self.bracket.champion().cloned(),
            });
            info!("Tournament {} '{}' complete", self.id, self.config.name);
        }

        Ok(update)
    }

    fn handle_pair_next_round(&mut self) -> BracketResult<Vec<MatchId>> {
        let matches = self.bracket.pair_next_round()?;
        let round = self.bracket.rounds().len() as u32;
        self.notify(BracketNotification::RoundPaired {
            tournament_id: self.id,
            round,
            matches: matches.clone(),
        });
        Ok(matches)
    }

    fn swiss_round_finished(&self) -> bool {
        self.bracket.format() == Format::Swiss
            && self
                .bracket
                .rounds()
                .last()
                .is_some_and(|round| self.bracket.round_status(round) == RoundStatus::Completed)
    }

    fn summary(&self) -> TournamentSummary {
        TournamentSummary {
            id: self.id,
            name: self.config.name.clone(),
            format: self.bracket.format(),
            participant_count: self.bracket.participants().len(),
            rounds: self.bracket.rounds().len(),
            completed_matches: self
                .bracket
                .playable_matches()
                .filter(|m| m.is_completed())
                .count(),
            playable_matches: self.bracket.playable_matches().count(),
            is_complete: self.bracket.is_complete(),
        }
    }

    /// Broadcast a notification to all subscribers
    fn notify(&mut self, notification: BracketNotification) {
        self.subscribers.retain(|subscriber_id, sender| {
            match sender.try_send(notification.clone()) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        "Subscriber {} channel full, dropping notification",
                        subscriber_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Subscriber {} disconnected, removing", subscriber_id);
                    false
                }
            }
        });
    }
}
