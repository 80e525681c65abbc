use cov_check::{
    config::Thresholds,
    policy::{classify, Outcome},
};

fn cards(yellow_card: u64, red_card: u64) -> Thresholds {
    Thresholds {
        yellow_card,
        red_card,
    }
}

#[test]
fn boundaries() {
    let t = cards(10, 20);
    assert_eq!(classify(Some(0), &t), Outcome::Success);
    assert_eq!(classify(Some(1), &t), Outcome::GreenCard);
    assert_eq!(classify(Some(10), &t), Outcome::GreenCard);
    assert_eq!(classify(Some(11), &t), Outcome::YellowCard);
    assert_eq!(classify(Some(20), &t), Outcome::YellowCard);
    assert_eq!(classify(Some(21), &t), Outcome::RedCard);
}

#[test]
fn absent_count_is_skip() {
    for (y, r) in [(0, 0), (10, 20), (5, 5), (0, 100)] {
        assert_eq!(classify(None, &cards(y, r)), Outcome::Skip);
    }
}

#[test]
fn every_count_gets_a_card() {
    for (y, r) in [(0, 0), (0, 3), (2, 2), (3, 9)] {
        let t = cards(y, r);
        for o in 0..=r + 3 {
            let outcome = classify(Some(o), &t);
            let expected = if o == 0 {
                Outcome::Success
            } else if o <= y {
                Outcome::GreenCard
            } else if o <= r {
                Outcome::YellowCard
            } else {
                Outcome::RedCard
            };
            assert_eq!(outcome, expected, "o={o} y={y} r={r}");
        }
    }
}

#[test]
fn red_card_escalates_to_critical() {
    assert_eq!(Outcome::RedCard.escalated(true), Outcome::Critical);
    assert_eq!(Outcome::RedCard.escalated(false), Outcome::RedCard);
    assert_eq!(Outcome::YellowCard.escalated(true), Outcome::YellowCard);
}
