use chrono::Utc;
use shared::domain::{ChoiceId, SlideId, UserId, VoteId};

use super::*;
use crate::tally::{AggregateTally, ChoiceTally, Vote};

fn vote(choice_id: ChoiceId) -> Vote {
    Vote {
        vote_id: VoteId::generate(),
        choice_id,
        voter_id: UserId(1),
        cast_at: Utc::now(),
    }
}

fn tally() -> AggregateTally {
    AggregateTally {
        slide_id: SlideId(5),
        question: "Ship it?".to_string(),
        choices: vec![
            ChoiceTally {
                choice_id: ChoiceId(1),
                content: "Yes".to_string(),
                votes: vec![vote(ChoiceId(1)), vote(ChoiceId(1))],
            },
            ChoiceTally {
                choice_id: ChoiceId(2),
                content: "No".to_string(),
                votes: vec![vote(ChoiceId(2))],
            },
        ],
    }
}

#[test]
fn empty_projection_is_well_defined() {
    let projection = ChartProjection::empty();
    assert!(projection.question.is_empty());
    assert!(projection.labels.is_empty());
    assert!(projection.counts.is_empty());
    assert!(projection.colors.is_empty());
}

#[test]
fn labels_and_counts_align_with_the_choice_order() {
    let tally = tally();
    let colors = ColorAssignment::generate(&tally);

    let projection = build_projection(&tally, &colors);

    assert_eq!(projection.question, "Ship it?");
    assert_eq!(projection.labels, vec!["Yes", "No"]);
    assert_eq!(projection.counts, vec![2, 1]);
    assert_eq!(projection.colors.len(), 2);
}

#[test]
fn rebuilds_over_an_unchanged_tally_are_identical() {
    let tally = tally();
    let colors = ColorAssignment::generate(&tally);

    let first = build_projection(&tally, &colors);
    let second = build_projection(&tally, &colors);

    assert_eq!(first, second);
}

#[test]
fn colors_stay_assigned_while_votes_accumulate() {
    let mut tally = tally();
    let colors = ColorAssignment::generate(&tally);
    let before = build_projection(&tally, &colors);

    tally.apply(UserId(8), &[ChoiceId(2)]);
    let after = build_projection(&tally, &colors);

    assert_eq!(before.colors, after.colors);
    assert_eq!(after.counts, vec![2, 2]);
}

#[test]
fn assigned_colors_are_css_hex_values() {
    let tally = tally();
    let colors = ColorAssignment::generate(&tally);

    let projection = build_projection(&tally, &colors);

    for color in &projection.colors {
        assert_eq!(color.len(), 7, "unexpected color literal: {color}");
        assert!(color.starts_with('#'));
        assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
