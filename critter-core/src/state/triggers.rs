//! Transition trigger evaluation

use alloc::collections::BTreeMap;
use alloc::string::String;

use rand::{Rng, RngCore};

use crate::character::{Transition, Trigger};

/// Pick the first transition whose trigger holds
///
/// `elapsed_us` is the time since the current state was entered, `tapped`
/// whether a tap arrived since the previous evaluation. `delays` caches the
/// rolled deadline of each random transition, keyed by target.
pub fn evaluate<'t, R: RngCore>(
    transitions: &'t [Transition],
    elapsed_us: i64,
    tapped: bool,
    delays: &mut BTreeMap<String, i64>,
    rng: &mut R,
) -> Option<&'t Transition> {
    transitions.iter().find(|transition| match transition.trigger {
        Trigger::ElapsedTime { duration_us } => elapsed_us >= duration_us,
        Trigger::Clicked => tapped,
        Trigger::Random {
            start_us,
            end_us,
            chance_mod,
        } => random_fires(
            &transition.target,
            elapsed_us,
            (start_us, end_us),
            chance_mod,
            delays,
            rng,
        ),
    })
}

fn random_fires<R: RngCore>(
    target: &str,
    elapsed_us: i64,
    (start_us, end_us): (i64, i64),
    chance_mod: u32,
    delays: &mut BTreeMap<String, i64>,
    rng: &mut R,
) -> bool {
    let deadline = match delays.get(target) {
        Some(deadline) => *deadline,
        None => {
            let deadline = elapsed_us.saturating_add(roll_delay(rng, start_us, end_us));
            delays.insert(target.into(), deadline);
            deadline
        }
    };
    if elapsed_us <= deadline {
        return false;
    }

    delays.remove(target);
    chance_mod == 0 || rng.gen_range(0..chance_mod) == 0
}

/// Delay in `[start, end]`; an inverted range collapses to `start`
fn roll_delay<R: RngCore>(rng: &mut R, start_us: i64, end_us: i64) -> i64 {
    if end_us <= start_us {
        start_us
    } else {
        rng.gen_range(start_us..=end_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn to(target: &str, trigger: Trigger) -> Transition {
        Transition {
            target: target.into(),
            trigger,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn targets(found: Option<&Transition>) -> Option<&str> {
        found.map(|t| t.target.as_str())
    }

    #[test]
    fn test_elapsed_fires_at_duration() {
        let transitions = vec![to("sleep", Trigger::ElapsedTime { duration_us: 1000 })];
        let mut delays = BTreeMap::new();
        let mut rng = rng();

        assert_eq!(evaluate(&transitions, 999, false, &mut delays, &mut rng), None);
        assert_eq!(
            targets(evaluate(&transitions, 1000, false, &mut delays, &mut rng)),
            Some("sleep")
        );
    }

    #[test]
    fn test_clicked_needs_tap() {
        let transitions = vec![to("purr", Trigger::Clicked)];
        let mut delays = BTreeMap::new();
        let mut rng = rng();

        for elapsed in [0, 1_000, 1_000_000_000] {
            assert_eq!(
                evaluate(&transitions, elapsed, false, &mut delays, &mut rng),
                None
            );
        }
        assert_eq!(
            targets(evaluate(&transitions, 0, true, &mut delays, &mut rng)),
            Some("purr")
        );
    }

    #[test]
    fn test_first_match_wins() {
        let transitions = vec![
            to("first", Trigger::ElapsedTime { duration_us: 10 }),
            to("second", Trigger::Clicked),
        ];
        let mut delays = BTreeMap::new();
        let mut rng = rng();
        assert_eq!(
            targets(evaluate(&transitions, 50, true, &mut delays, &mut rng)),
            Some("first")
        );
        assert_eq!(
            targets(evaluate(&transitions, 5, true, &mut delays, &mut rng)),
            Some("second")
        );
    }

    #[test]
    fn test_random_mod_zero_always_fires_after_delay() {
        let transitions = vec![to(
            "hop",
            Trigger::Random {
                start_us: 100,
                end_us: 200,
                chance_mod: 0,
            },
        )];
        let mut delays = BTreeMap::new();
        let mut rng = rng();

        assert_eq!(evaluate(&transitions, 0, false, &mut delays, &mut rng), None);
        let deadline = delays["hop"];
        assert!((100..=200).contains(&deadline));

        // Not yet past the cached deadline
        assert_eq!(
            evaluate(&transitions, deadline, false, &mut delays, &mut rng),
            None
        );
        assert_eq!(
            targets(evaluate(&transitions, deadline + 1, false, &mut delays, &mut rng)),
            Some("hop")
        );
        assert!(delays.is_empty());
    }

    #[test]
    fn test_random_mod_one_always_fires() {
        let transitions = vec![to(
            "hop",
            Trigger::Random {
                start_us: 0,
                end_us: 0,
                chance_mod: 1,
            },
        )];
        let mut rng = rng();
        for _ in 0..50 {
            let mut delays = BTreeMap::new();
            assert_eq!(evaluate(&transitions, 0, false, &mut delays, &mut rng), None);
            assert!(evaluate(&transitions, 1, false, &mut delays, &mut rng).is_some());
        }
    }

    #[test]
    fn test_random_mod_n_fires_about_one_in_n() {
        let transitions = vec![to(
            "hop",
            Trigger::Random {
                start_us: 0,
                end_us: 0,
                chance_mod: 4,
            },
        )];
        let mut rng = rng();
        let mut fired = 0;
        for _ in 0..4000 {
            let mut delays = BTreeMap::new();
            evaluate(&transitions, 0, false, &mut delays, &mut rng);
            if evaluate(&transitions, 1, false, &mut delays, &mut rng).is_some() {
                fired += 1;
            }
            // A miss clears the cache so the next roll starts over
            assert!(delays.is_empty());
        }
        assert!((800..1200).contains(&fired), "fired {} times", fired);
    }

    #[test]
    fn test_random_inverted_range_uses_start() {
        let mut rng = rng();
        let rolls: Vec<_> = (0..10).map(|_| roll_delay(&mut rng, 500, 100)).collect();
        assert!(rolls.iter().all(|&d| d == 500));
    }
}
