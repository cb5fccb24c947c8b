// =============================================================================
// StudyQuest Engine - Level Table
// =============================================================================
// Static lookup mapping total XP to a level number, title and level-up coin
// reward. Read-only at runtime; thresholds are strictly increasing.
// =============================================================================

use serde::Serialize;

/// One row of the static level table.
#[derive(Debug, Clone, Copy)]
pub struct LevelDefinition {
    /// Level number, unique and ascending
    pub level: i64,
    /// Total XP required to hold this level
    pub xp_required: i64,
    /// Display title
    pub title: &'static str,
    /// Coins credited when this level is reached
    pub reward_coins: i64,
}

/// Seed level data. Level 1 starts at 0 XP; level 2 at 100 XP.
pub const LEVEL_TABLE: &[LevelDefinition] = &[
    LevelDefinition { level: 1, xp_required: 0, title: "Novice", reward_coins: 0 },
    LevelDefinition { level: 2, xp_required: 100, title: "Apprentice", reward_coins: 25 },
    LevelDefinition { level: 3, xp_required: 250, title: "Dedicated", reward_coins: 25 },
    LevelDefinition { level: 4, xp_required: 450, title: "Scholar", reward_coins: 50 },
    LevelDefinition { level: 5, xp_required: 700, title: "Honor Student", reward_coins: 50 },
    LevelDefinition { level: 6, xp_required: 1000, title: "Expert", reward_coins: 75 },
    LevelDefinition { level: 7, xp_required: 1400, title: "Sage", reward_coins: 75 },
    LevelDefinition { level: 8, xp_required: 1900, title: "Master", reward_coins: 100 },
    LevelDefinition { level: 9, xp_required: 2500, title: "Grandmaster", reward_coins: 100 },
    LevelDefinition { level: 10, xp_required: 3200, title: "Legend", reward_coins: 150 },
];

/// Synthetic threshold step past the last defined level, so progress
/// displays stay well-defined at any XP total.
pub const EXTRAPOLATION_STEP: i64 = 1000;

/// Level progress projection for a given XP total.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: i64,
    pub title: &'static str,
    /// XP accumulated past the current level's threshold
    pub current_level_xp: i64,
    /// XP still needed to reach the next level
    pub xp_to_next_level: i64,
    /// Progress within the current level, 0-100
    pub percent: i64,
}

/// Resolve the level for a total XP amount.
///
/// Returns the highest defined level whose threshold is <= `total_xp`.
/// Past the last defined level, levels continue every
/// [`EXTRAPOLATION_STEP`] XP with the last defined title.
pub fn level_of(total_xp: i64) -> LevelProgress {
    let total_xp = total_xp.max(0);
    let last = LEVEL_TABLE.last().expect("level table is non-empty");

    let (level, title, floor, ceiling) = if total_xp >= last.xp_required {
        // Extrapolate beyond the table
        let steps = (total_xp - last.xp_required) / EXTRAPOLATION_STEP;
        let floor = last.xp_required + steps * EXTRAPOLATION_STEP;
        (last.level + steps, last.title, floor, floor + EXTRAPOLATION_STEP)
    } else {
        let idx = LEVEL_TABLE
            .iter()
            .rposition(|def| def.xp_required <= total_xp)
            .expect("level 1 threshold is 0");
        let def = &LEVEL_TABLE[idx];
        (def.level, def.title, def.xp_required, LEVEL_TABLE[idx + 1].xp_required)
    };

    let span = ceiling - floor;
    let current_level_xp = total_xp - floor;
    LevelProgress {
        level,
        title,
        current_level_xp,
        xp_to_next_level: ceiling - total_xp,
        percent: (current_level_xp * 100 / span).clamp(0, 100),
    }
}

/// Coins awarded for crossing from `old_level` (exclusive) to `new_level`
/// (inclusive). Levels past the table pay the last defined level's reward.
pub fn coins_for_level_ups(old_level: i64, new_level: i64) -> i64 {
    let last = LEVEL_TABLE.last().expect("level table is non-empty");
    (old_level + 1..=new_level)
        .map(|level| {
            LEVEL_TABLE
                .iter()
                .find(|def| def.level == level)
                .map(|def| def.reward_coins)
                .unwrap_or(last.reward_coins)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_strictly_increasing() {
        for pair in LEVEL_TABLE.windows(2) {
            assert!(pair[0].xp_required < pair[1].xp_required);
            assert_eq!(pair[0].level + 1, pair[1].level);
        }
    }

    #[test]
    fn test_level_of_threshold_is_exact() {
        for def in LEVEL_TABLE {
            let progress = level_of(def.xp_required);
            assert_eq!(progress.level, def.level);
            assert_eq!(progress.current_level_xp, 0);
        }
    }

    #[test]
    fn test_level_of_monotonic() {
        let mut prev = 0;
        for xp in (0..6000).step_by(7) {
            let level = level_of(xp).level;
            assert!(level >= prev, "level regressed at xp={}", xp);
            prev = level;
        }
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_of(0).level, 1);
        assert_eq!(level_of(50).level, 1);
        assert_eq!(level_of(99).level, 1);
        assert_eq!(level_of(100).level, 2);
        assert_eq!(level_of(110).level, 2);
        assert_eq!(level_of(249).level, 2);
        assert_eq!(level_of(250).level, 3);
    }

    #[test]
    fn test_extrapolation_past_table() {
        let last = LEVEL_TABLE.last().unwrap();
        assert_eq!(level_of(last.xp_required).level, last.level);
        assert_eq!(level_of(last.xp_required + 999).level, last.level);
        assert_eq!(level_of(last.xp_required + 1000).level, last.level + 1);
        assert_eq!(level_of(last.xp_required + 2500).level, last.level + 2);

        // Progress stays well-defined
        let progress = level_of(last.xp_required + 1500);
        assert_eq!(progress.current_level_xp, 500);
        assert_eq!(progress.xp_to_next_level, 500);
        assert_eq!(progress.percent, 50);
    }

    #[test]
    fn test_percent_bounds() {
        for xp in (0..8000).step_by(13) {
            let percent = level_of(xp).percent;
            assert!((0..=100).contains(&percent));
        }
    }

    #[test]
    fn test_progress_serializes_for_profile_views() {
        let json = serde_json::to_value(level_of(150)).unwrap();
        assert_eq!(json["level"], 2);
        assert_eq!(json["title"], "Apprentice");
        assert_eq!(json["current_level_xp"], 50);
        assert_eq!(json["xp_to_next_level"], 100);
        assert_eq!(json["percent"], 33);
    }

    #[test]
    fn test_coins_for_level_ups() {
        // 1 -> 2 pays level 2's reward
        assert_eq!(coins_for_level_ups(1, 2), 25);
        // 1 -> 3 pays levels 2 and 3
        assert_eq!(coins_for_level_ups(1, 3), 50);
        // No level-up, no coins
        assert_eq!(coins_for_level_ups(4, 4), 0);
        // Past the table pays the last defined reward per level
        assert_eq!(coins_for_level_ups(10, 12), 300);
    }
}
