use rand::Rng;
use rand::seq::index;

use crate::agents::{Firm, Household};

// === RESULT ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaborMarketResult {
    pub active_firms: usize,
    /// Jobs on offer after rationing to the population size.
    pub jobs: usize,
    pub employed: usize,
}

// === JOB COUNT ===

/// Number of positions the active firms open this tick.
///
/// Each active firm offers `floor(hiring_rate * households)` jobs. The total is
/// rationed to `[1, households]`, and is 0 only when no firm is active.
pub fn total_jobs(firms: &[Firm], households: usize) -> usize {
    let mut active = 0usize;
    let mut offered = 0usize;
    for firm in firms.iter().filter(|f| f.alive) {
        active += 1;
        offered += (firm.hiring_rate * households as f64).floor() as usize;
    }
    if active == 0 || households == 0 {
        return 0;
    }
    offered.clamp(1, households)
}

// === CLEARING ===

/// Match households to jobs for one tick.
///
/// Employment is a fresh lottery every tick: exactly `total_jobs` households are
/// drawn uniformly without replacement. Each one is paid a wage picked uniformly
/// from the active firms' offers; everyone else gets the safety net.
///
/// Draw order: one index sample, then one wage pick per employed household in
/// ascending household order. Nothing is drawn when no firm is active.
pub fn clear_labor_market<R: Rng>(
    households: &mut [Household],
    firms: &[Firm],
    safety_net: f64,
    rng: &mut R,
) -> LaborMarketResult {
    let wage_offers: Vec<f64> = firms.iter().filter(|f| f.alive).map(|f| f.wage_offer).collect();
    let jobs = total_jobs(firms, households.len());

    if wage_offers.is_empty() || jobs == 0 {
        for household in households.iter_mut() {
            household.employed = false;
            household.income = safety_net;
        }
        return LaborMarketResult {
            active_firms: wage_offers.len(),
            jobs: 0,
            employed: 0,
        };
    }

    let mut hired = vec![false; households.len()];
    for idx in index::sample(rng, households.len(), jobs).iter() {
        hired[idx] = true;
    }

    let mut employed = 0;
    for (household, is_hired) in households.iter_mut().zip(hired) {
        household.employed = is_hired;
        if is_hired {
            household.income = wage_offers[rng.random_range(0..wage_offers.len())];
            employed += 1;
        } else {
            household.income = safety_net;
        }
    }

    LaborMarketResult {
        active_firms: wage_offers.len(),
        jobs,
        employed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FirmId, HouseholdId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn households(n: u32) -> Vec<Household> {
        (0..n).map(|i| Household::new(HouseholdId::new(i))).collect()
    }

    fn firm(id: u32, hiring_rate: f64, wage_offer: f64) -> Firm {
        let mut f = Firm::new(FirmId::new(id));
        f.hiring_rate = hiring_rate;
        f.wage_offer = wage_offer;
        f
    }

    #[test]
    fn job_count_sums_and_rations() {
        let firms = vec![firm(0, 0.1, 1.0), firm(1, 0.15, 1.0)];
        // floor(10) + floor(15)
        assert_eq!(total_jobs(&firms, 100), 25);

        let firms = vec![firm(0, 0.5, 1.0), firm(1, 0.5, 1.0), firm(2, 0.5, 1.0)];
        assert_eq!(total_jobs(&firms, 100), 100);

        // floor(0.05 * 3) == 0 but at least one job is always offered
        let firms = vec![firm(0, 0.05, 1.0)];
        assert_eq!(total_jobs(&firms, 3), 1);
    }

    #[test]
    fn inactive_firms_offer_nothing() {
        let mut dead = firm(0, 0.5, 9.0);
        dead.alive = false;
        assert_eq!(total_jobs(&[dead.clone()], 100), 0);

        let firms = vec![dead, firm(1, 0.1, 1.0)];
        assert_eq!(total_jobs(&firms, 100), 10);
    }

    #[test]
    fn lottery_employs_exactly_the_job_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let firms = vec![firm(0, 0.125, 1.1), firm(1, 0.2, 0.9)];
        let mut hh = households(50);

        let result = clear_labor_market(&mut hh, &firms, 0.5, &mut rng);
        assert_eq!(result.jobs, 6 + 10);
        assert_eq!(result.employed, 16);
        assert_eq!(hh.iter().filter(|h| h.employed).count(), 16);

        for h in &hh {
            if h.employed {
                assert!(h.income == 1.1 || h.income == 0.9, "wage {}", h.income);
            } else {
                assert_eq!(h.income, 0.5);
            }
        }
    }

    #[test]
    fn no_active_firms_means_everyone_on_safety_net() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut dead = firm(0, 0.3, 2.0);
        dead.alive = false;
        let mut hh = households(20);

        let result = clear_labor_market(&mut hh, &[dead], 0.7, &mut rng);
        assert_eq!(result, LaborMarketResult::default());
        assert!(hh.iter().all(|h| !h.employed && h.income == 0.7));
    }

    #[test]
    fn employment_is_redrawn_each_tick() {
        let mut rng = StdRng::seed_from_u64(3);
        let firms = vec![firm(0, 0.25, 1.0)];
        let mut hh = households(40);

        clear_labor_market(&mut hh, &firms, 0.5, &mut rng);
        let first: Vec<bool> = hh.iter().map(|h| h.employed).collect();

        let mut changed = false;
        for _ in 0..10 {
            clear_labor_market(&mut hh, &firms, 0.5, &mut rng);
            assert_eq!(hh.iter().filter(|h| h.employed).count(), 10);
            let now: Vec<bool> = hh.iter().map(|h| h.employed).collect();
            changed |= now != first;
        }
        assert!(changed, "lottery should reshuffle employment");
    }

    #[test]
    fn single_household_gets_the_job() {
        let mut rng = StdRng::seed_from_u64(9);
        let firms = vec![firm(0, 0.05, 1.3)];
        let mut hh = households(1);

        let result = clear_labor_market(&mut hh, &firms, 0.5, &mut rng);
        assert_eq!(result.employed, 1);
        assert!(hh[0].employed);
        assert_eq!(hh[0].income, 1.3);
    }
}
