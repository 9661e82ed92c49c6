//! Two-click move entry.
//!
//! The first click picks a piece of the side to move, the second picks a
//! destination. Clicking another own piece instead of a destination moves the
//! selection there, so a player never needs a separate cancel gesture. Pawn
//! moves onto the last rank stop in `AwaitingPromotion` until a piece kind is
//! chosen or the chooser is dismissed.

use chess_core::{ChessMove, Position, RulesEngine, Role, Square};
use tracing::{debug, warn};

use crate::highlight::{compute_highlights, Highlights};
use crate::store::PositionStore;
use crate::turn_gate::InputRejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    OriginSelected(Square),
    AwaitingPromotion { from: Square, to: Square },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Discarded before reaching the state machine.
    Rejected(InputRejection),
    /// Nothing to act on; state unchanged (still Idle, or awaiting promotion).
    Ignored,
    Selected(Square),
    /// A non-destination, non-own cell cleared the selection.
    Deselected,
    PromotionPending { from: Square, to: Square },
    Committed { mv: ChessMove, san: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    Committed { mv: ChessMove, san: String },
    /// The rules engine refused the promotion; the selection is cleared anyway.
    Rejected(ChessMove),
    /// The chooser was dismissed.
    Cancelled,
    NotPending,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    state: SelectionState,
    highlights: Highlights,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    /// True between the first click and the end of the move (or promotion).
    pub fn is_mid_flow(&self) -> bool {
        self.state != SelectionState::Idle
    }

    pub fn pending_promotion(&self) -> Option<(Square, Square)> {
        match self.state {
            SelectionState::AwaitingPromotion { from, to } => Some((from, to)),
            _ => None,
        }
    }

    pub fn click<R: RulesEngine + ?Sized>(
        &mut self,
        rules: &R,
        store: &mut PositionStore,
        cell: Square,
    ) -> ClickOutcome {
        match self.state {
            SelectionState::Idle => {
                if self.try_select(rules, store.position(), cell) {
                    ClickOutcome::Selected(cell)
                } else {
                    self.clear();
                    ClickOutcome::Ignored
                }
            }
            SelectionState::OriginSelected(origin) => self.click_destination(rules, store, origin, cell),
            SelectionState::AwaitingPromotion { from, to } => {
                debug!(%from, %to, %cell, "Click ignored while a promotion is pending");
                ClickOutcome::Ignored
            }
        }
    }

    fn click_destination<R: RulesEngine + ?Sized>(
        &mut self,
        rules: &R,
        store: &mut PositionStore,
        origin: Square,
        cell: Square,
    ) -> ClickOutcome {
        let position = store.position();
        if !rules.legal_destinations(position, origin).contains(&cell) {
            return self.reselect(rules, position, cell);
        }

        if rules.requires_promotion(position, origin, cell) {
            self.highlights.clear();
            self.state = SelectionState::AwaitingPromotion {
                from: origin,
                to: cell,
            };
            debug!(from = %origin, to = %cell, "Promotion pending");
            return ClickOutcome::PromotionPending {
                from: origin,
                to: cell,
            };
        }

        let mv = rules.complete_promotion(position, ChessMove::new(origin, cell));
        match store.submit(rules, mv) {
            Ok(entry) => {
                let san = entry.san.clone();
                self.clear();
                ClickOutcome::Committed { mv, san }
            }
            Err(err) => {
                warn!(%err, "Highlighted destination rejected by the rules engine");
                self.reselect(rules, store.position(), cell)
            }
        }
    }

    /// Supply (or decline, with `None`) the promotion piece for the pending move.
    pub fn choose_promotion<R: RulesEngine + ?Sized>(
        &mut self,
        rules: &R,
        store: &mut PositionStore,
        choice: Option<Role>,
    ) -> PromotionOutcome {
        let Some((from, to)) = self.pending_promotion() else {
            return PromotionOutcome::NotPending;
        };
        self.clear();

        let Some(role) = choice else {
            debug!(%from, %to, "Promotion cancelled");
            return PromotionOutcome::Cancelled;
        };

        let mv = ChessMove::new(from, to).with_promotion(role);
        match store.submit(rules, mv) {
            Ok(entry) => PromotionOutcome::Committed {
                mv,
                san: entry.san.clone(),
            },
            Err(err) => {
                warn!(%err, "Promotion rejected by the rules engine");
                PromotionOutcome::Rejected(mv)
            }
        }
    }

    /// Back to Idle from any state.
    pub fn reset(&mut self) {
        self.clear();
    }

    fn reselect<R: RulesEngine + ?Sized>(
        &mut self,
        rules: &R,
        position: &Position,
        cell: Square,
    ) -> ClickOutcome {
        if self.try_select(rules, position, cell) {
            ClickOutcome::Selected(cell)
        } else {
            self.clear();
            ClickOutcome::Deselected
        }
    }

    fn try_select<R: RulesEngine + ?Sized>(
        &mut self,
        rules: &R,
        position: &Position,
        cell: Square,
    ) -> bool {
        let own = rules
            .piece_at(position, cell)
            .is_some_and(|piece| piece.color == rules.side_to_move(position));
        if own {
            self.state = SelectionState::OriginSelected(cell);
            self.highlights = compute_highlights(rules, position, Some(cell));
        }
        own
    }

    fn clear(&mut self) {
        self.state = SelectionState::Idle;
        self.highlights.clear();
    }
}
