//! Gold piles and payouts
//!
//! The amount in a pile is not fixed when it is placed; it is decided at
//! pickup time from whatever gold is left, plus a little random jitter.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::grid::{Grid, GOLD, ROOM};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldEconomy {
    total: u32,
    remaining_gold: u32,
    remaining_piles: u32,
}

impl GoldEconomy {
    pub fn new(total: u32, piles: u32) -> Self {
        Self {
            total,
            remaining_gold: total,
            remaining_piles: piles,
        }
    }

    /// Starts a fresh economy with a pile count drawn uniformly from
    /// `[min_piles, max_piles)`.
    pub fn initialize<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let piles = rng.gen_range(config.min_piles..config.max_piles);
        Self::new(config.gold_total, piles)
    }

    pub fn remaining_gold(&self) -> u32 {
        self.remaining_gold
    }

    pub fn remaining_piles(&self) -> u32 {
        self.remaining_piles
    }

    /// Claims one pile and returns its value.
    ///
    /// The last pile holds everything that is left. Any other pile is worth
    /// an even share of the remaining gold plus 0 to 2 extra, at least 1 and
    /// never more than what remains.
    pub fn payout<R: Rng>(&mut self, rng: &mut R) -> u32 {
        let amount = if self.remaining_piles <= 1 {
            self.remaining_gold
        } else {
            let share = self.remaining_gold / self.remaining_piles + rng.gen_range(0..=2);
            share.max(1).min(self.remaining_gold)
        };

        self.remaining_gold -= amount;
        self.remaining_piles = self.remaining_piles.saturating_sub(1);
        debug!(
            "Pile paid {} gold, {} of {} gold in {} piles left",
            amount, self.remaining_gold, self.total, self.remaining_piles
        );
        amount
    }

    /// Drops every remaining pile onto a distinct, randomly chosen room cell
    /// of the live map.
    pub fn scatter_piles<R: Rng>(
        &self,
        grid: &Grid,
        live: &mut [char],
        rng: &mut R,
    ) -> Result<(), GameError> {
        let needed = self.remaining_piles as usize;
        let rooms = grid.positions_of(live, ROOM);
        if rooms.len() < needed {
            return Err(GameError::NotEnoughRoom {
                needed,
                available: rooms.len(),
            });
        }

        for &(x, y) in rooms.choose_multiple(rng, needed) {
            grid.put(live, x, y, GOLD);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MapSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_initialize_draws_pile_count_in_range() {
        let config = GameConfig::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let economy = GoldEconomy::initialize(&config, &mut rng);
            assert_eq!(economy.remaining_gold(), 250);
            assert!((10..20).contains(&economy.remaining_piles()));
        }
    }

    #[test]
    fn test_last_pile_pays_everything() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut economy = GoldEconomy {
            total: 250,
            remaining_gold: 37,
            remaining_piles: 1,
        };

        assert_eq!(economy.payout(&mut rng), 37);
        assert_eq!(economy.remaining_gold(), 0);
        assert_eq!(economy.remaining_piles(), 0);
    }

    #[test]
    fn test_payout_is_share_plus_jitter() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut economy = GoldEconomy::new(250, 10);

            let amount = economy.payout(&mut rng);
            assert!((25..=27).contains(&amount), "payout {} out of range", amount);
            assert_eq!(economy.remaining_gold(), 250 - amount);
            assert_eq!(economy.remaining_piles(), 9);
        }
    }

    #[test]
    fn test_payout_is_at_least_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut economy = GoldEconomy {
            total: 250,
            remaining_gold: 5,
            remaining_piles: 10,
        };
        assert!(economy.payout(&mut rng) >= 1);
    }

    #[test]
    fn test_payout_never_exceeds_remaining() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut economy = GoldEconomy {
                total: 250,
                remaining_gold: 2,
                remaining_piles: 2,
            };
            let amount = economy.payout(&mut rng);
            assert!(amount <= 2);
            assert_eq!(economy.remaining_gold(), 2 - amount);
        }
    }

    #[test]
    fn test_whole_economy_drains_to_zero() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut economy = GoldEconomy::new(250, 15);
        let mut paid = 0;
        while economy.remaining_piles() > 0 && economy.remaining_gold() > 0 {
            paid += economy.payout(&mut rng);
        }
        assert_eq!(paid, 250);
        assert_eq!(economy.remaining_gold(), 0);
    }

    #[test]
    fn test_scatter_places_distinct_piles_on_room_cells() {
        let source = MapSource::parse("+-----+\n|.....|\n|.....|\n+-----+\n").unwrap();
        let mut live = source.terrain.clone();
        let mut rng = StdRng::seed_from_u64(5);
        let economy = GoldEconomy::new(250, 6);

        economy.scatter_piles(&source.grid, &mut live, &mut rng).unwrap();

        let piles = source.grid.positions_of(&live, GOLD);
        assert_eq!(piles.len(), 6);
        for (x, y) in piles {
            assert_eq!(source.grid.get(&source.terrain, x, y), Ok(ROOM));
        }
    }

    #[test]
    fn test_scatter_fails_without_enough_room() {
        let source = MapSource::parse("+--+\n|..|\n+--+\n").unwrap();
        let mut live = source.terrain.clone();
        let mut rng = StdRng::seed_from_u64(5);
        let economy = GoldEconomy::new(250, 3);

        let result = economy.scatter_piles(&source.grid, &mut live, &mut rng);
        assert!(matches!(
            result,
            Err(GameError::NotEnoughRoom {
                needed: 3,
                available: 2
            })
        ));
        assert_eq!(live, source.terrain);
    }
}
