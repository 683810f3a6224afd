/// Scoring rules: star thresholds and star tiers.
///
/// Pure functions over move counts, no board access, so the renderer and
/// the engine share one definition.

/// Move-count ceilings for the 3-star and 2-star tiers.
///
/// Absent or unreadable thresholds default to `i32::MAX` for both, which
/// makes three stars reachable for any finite move count.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StarThresholds {
    pub three_star_max: i32,
    pub two_star_max: i32,
}

impl StarThresholds {
    pub const UNATTAINABLE: StarThresholds = StarThresholds {
        three_star_max: i32::MAX,
        two_star_max: i32::MAX,
    };

    pub fn new(three_star_max: i32, two_star_max: i32) -> Self {
        StarThresholds { three_star_max, two_star_max }
    }

    /// Are the tiers ordered the usual way (three-star ceiling first)?
    pub fn is_ordered(&self) -> bool {
        self.three_star_max <= self.two_star_max
    }

    /// Star tier for a won level. Never returns 0.
    pub fn stars_for(&self, moves: u32) -> u8 {
        let m = i64::from(moves);
        if m <= i64::from(self.three_star_max) {
            3
        } else if m <= i64::from(self.two_star_max) {
            2
        } else {
            1
        }
    }

    /// The "skip level" offer kicks in once the player has used more than
    /// twice the 2-star budget.
    pub fn skip_offered_after(&self, moves: u32) -> bool {
        i64::from(moves) > i64::from(self.two_star_max).saturating_mul(2)
    }
}

impl Default for StarThresholds {
    fn default() -> Self {
        StarThresholds::UNATTAINABLE
    }
}

/// Stars recorded for a skipped or abandoned level.
pub const SKIP_STARS: u8 = 0;

/// Highest tier a single level can award.
pub const MAX_STARS: u8 = 3;

/// Win rule: every goal covered, and there is at least one goal.
/// Extra boxes off the goals do not matter.
pub fn is_solved(boxes_on_goals: usize, goal_count: usize) -> bool {
    goal_count > 0 && boxes_on_goals == goal_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_thresholds() {
        let t = StarThresholds::new(3, 5);
        assert_eq!(t.stars_for(0), 3);
        assert_eq!(t.stars_for(3), 3);
        assert_eq!(t.stars_for(4), 2);
        assert_eq!(t.stars_for(5), 2);
        assert_eq!(t.stars_for(6), 1);
        assert_eq!(t.stars_for(u32::MAX), 1);
    }

    #[test]
    fn default_thresholds_always_give_three_stars() {
        let t = StarThresholds::default();
        assert_eq!(t.stars_for(10_000), 3);
        assert_eq!(t.stars_for(i32::MAX as u32), 3);
    }

    #[test]
    fn negative_ceilings_are_never_met() {
        let t = StarThresholds::new(-1, 2);
        assert_eq!(t.stars_for(0), 2);
        assert_eq!(t.stars_for(3), 1);
    }

    #[test]
    fn skip_offer_is_twice_the_two_star_budget() {
        let t = StarThresholds::new(3, 5);
        assert!(!t.skip_offered_after(10));
        assert!(t.skip_offered_after(11));
        assert!(!StarThresholds::default().skip_offered_after(i32::MAX as u32));
    }

    #[test]
    fn zero_goals_never_solve() {
        assert!(!is_solved(0, 0));
        assert!(is_solved(2, 2));
        assert!(!is_solved(1, 2));
    }
}
