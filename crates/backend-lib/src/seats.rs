//! Fixed-size seat table.
//!
//! Seats `1..=N` are created once and never removed. Occupancy changes on
//! join and disconnect; votes change only while a session is active.
use chamber_common::{Role, Seat, SeatNumber, Tally, User, Vote};

use crate::error::AppError;
use crate::session::SessionState;

#[derive(Debug, Clone)]
pub struct SeatTable {
    seats: Vec<Seat>,
}

impl SeatTable {
    pub fn new(count: u32) -> Self {
        Self {
            seats: (1..=count).map(Seat::vacant).collect(),
        }
    }

    fn index(&self, number: SeatNumber) -> Result<usize, AppError> {
        let idx = (number as usize)
            .checked_sub(1)
            .filter(|idx| *idx < self.seats.len())
            .ok_or(AppError::SeatNotFound(number))?;
        Ok(idx)
    }

    pub fn get(&self, number: SeatNumber) -> Result<&Seat, AppError> {
        self.index(number).map(|idx| &self.seats[idx])
    }

    /// Check that `user` could take seat `number` without changing anything
    pub fn check_assign(&self, number: SeatNumber, user: &User) -> Result<(), AppError> {
        let seat = self.get(number)?;
        match &seat.occupant_user_id {
            Some(occupant) if occupant != &user.id => Err(AppError::SeatOccupied(number)),
            _ => Ok(()),
        }
    }

    /// Seat `user` at `number`. Re-assigning the same user is a no-op.
    pub fn assign(&mut self, number: SeatNumber, user: &User) -> Result<(), AppError> {
        self.check_assign(number, user)?;
        let idx = self.index(number)?;
        let seat = &mut self.seats[idx];
        if !seat.is_occupied_by(&user.id) {
            seat.occupant_user_id = Some(user.id.clone());
            seat.occupant_name = Some(user.name.clone());
            seat.vote = None;
        }
        Ok(())
    }

    pub fn vacate(&mut self, number: SeatNumber) -> Result<(), AppError> {
        let idx = self.index(number)?;
        self.seats[idx] = Seat::vacant(number);
        Ok(())
    }

    /// Vacate whichever seat `user_id` occupies, returning its number
    pub fn vacate_by_user(&mut self, user_id: &str) -> Option<SeatNumber> {
        let seat = self.seats.iter_mut().find(|s| s.is_occupied_by(user_id))?;
        let number = seat.number;
        *seat = Seat::vacant(number);
        Some(number)
    }

    pub fn seat_of(&self, user_id: &str) -> Option<SeatNumber> {
        self.seats
            .iter()
            .find(|s| s.is_occupied_by(user_id))
            .map(|s| s.number)
    }

    /// Record `vote` for seat `number` on behalf of `user`.
    ///
    /// Checked in order: session active, caller is a deputy, seat exists,
    /// seat belongs to the caller. Last write wins.
    pub fn set_vote(
        &mut self,
        number: SeatNumber,
        vote: Vote,
        user: &User,
        session: &SessionState,
    ) -> Result<(), AppError> {
        if !session.is_active() {
            return Err(AppError::SessionInactive);
        }
        if user.role != Role::Deputy {
            return Err(AppError::Unauthorized);
        }
        let idx = self.index(number)?;
        let seat = &mut self.seats[idx];
        if !seat.is_occupied_by(&user.id) {
            return Err(AppError::Unauthorized);
        }
        seat.vote = Some(vote);
        Ok(())
    }

    pub fn reset_votes(&mut self) {
        for seat in &mut self.seats {
            seat.vote = None;
        }
    }

    pub fn tally(&self) -> Tally {
        self.seats
            .iter()
            .filter(|s| !s.is_vacant())
            .fold(Tally::default(), |mut tally, seat| {
                match seat.vote {
                    Some(Vote::Favor) => tally.favor += 1,
                    Some(Vote::Against) => tally.against += 1,
                    Some(Vote::Abstain) => tally.abstain += 1,
                    None => tally.pending += 1,
                }
                tally
            })
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}
