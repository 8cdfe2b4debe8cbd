use proptest::prelude::*;
use student_grades::{grade_for, Grade};

#[test]
fn documented_band_edges() {
    assert_eq!(grade_for(90), Grade::APlus);
    assert_eq!(grade_for(89), Grade::A);
    assert_eq!(grade_for(40), Grade::D);
    assert_eq!(grade_for(39), Grade::F);
}

#[test]
fn labels_match_the_table() {
    let labels: Vec<&str> = Grade::ALL.iter().map(|g| g.as_str()).collect();
    assert_eq!(labels, ["A+", "A", "B+", "B", "C", "D", "F"]);
}

proptest! {
    #[test]
    fn lower_marks_never_earn_a_better_grade(a in 0u8..=100, b in 0u8..=100) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        // Variants are ordered best-first, so a better grade compares smaller.
        prop_assert!(grade_for(high) <= grade_for(low));
    }

    #[test]
    fn every_score_has_a_grade(marks in 0u8..=100) {
        let label = grade_for(marks).to_string();
        prop_assert!(Grade::ALL.iter().any(|g| g.as_str() == label));
    }
}
