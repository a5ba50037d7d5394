//! XP awarding: turns a round's finisher/DNF list into XP, coin, and level
//! results.

use crate::types::XpValues;
use serde::{Deserialize, Serialize};

#[cfg(feature = "server")]
use crate::persistence::PersistenceStore;

// ---------------------------------------------------------------------------
// Round outcome input
// ---------------------------------------------------------------------------

/// Per-player outcome snapshot at round end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub player: String,
    pub finished: bool,
    pub time_ms: Option<u64>,
    pub new_pb: bool,
    /// 1-indexed rank among finishers by ascending time; 0 = DNF.
    pub placement: usize,
}

/// The XP total and its human-readable reasons, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpBreakdown {
    pub amount: u64,
    pub reasons: Vec<String>,
}

/// Final award after routing through the progression store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpAward {
    pub player: String,
    pub amount: u64,
    pub reasons: Vec<String>,
    pub new_level: u64,
    pub leveled: bool,
    pub coins_awarded: u64,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

pub struct ProgressionCalculator {
    xp: XpValues,
}

impl ProgressionCalculator {
    pub fn new(xp: XpValues) -> Self {
        Self { xp }
    }

    /// Pure award computation for one result. Finishers accumulate finish,
    /// placement (top 3 only) and PB bonuses in that order; DNF gets only the
    /// flat DNF bonus. Reasons mirror the amounts in award order.
    pub fn breakdown(&self, result: &RoundResult) -> XpBreakdown {
        let mut amount = 0;
        let mut reasons = Vec::new();

        if result.finished {
            amount += self.xp.finish;
            reasons.push(format!("Finish: +{}", self.xp.finish));

            let placement_bonus = match result.placement {
                1 => Some(("1st Place", self.xp.top1)),
                2 => Some(("2nd Place", self.xp.top2)),
                3 => Some(("3rd Place", self.xp.top3)),
                _ => None,
            };
            if let Some((label, bonus)) = placement_bonus {
                amount += bonus;
                reasons.push(format!("{}: +{}", label, bonus));
            }

            if result.new_pb {
                amount += self.xp.new_pb;
                reasons.push(format!("New PB: +{}", self.xp.new_pb));
            }
        } else {
            amount += self.xp.dnf;
            reasons.push(format!("DNF: +{}", self.xp.dnf));
        }

        XpBreakdown { amount, reasons }
    }

    /// Award a whole round: compute each breakdown and route the totals
    /// through the progression store for level/coin results. Output is
    /// order-preserving, one award per input result.
    #[cfg(feature = "server")]
    pub async fn award_round(
        &self,
        results: &[RoundResult],
        store: &mut PersistenceStore,
    ) -> Vec<XpAward> {
        let mut awards = Vec::with_capacity(results.len());

        for result in results {
            let XpBreakdown { amount, reasons } = self.breakdown(result);
            let gain = store.add_xp(&result.player, amount).await;

            awards.push(XpAward {
                player: result.player.clone(),
                amount,
                reasons,
                new_level: gain.new_level,
                leveled: gain.leveled,
                coins_awarded: gain.coins_awarded,
            });
        }

        awards
    }
}
