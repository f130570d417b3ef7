// SPDX-License-Identifier: MIT OR Apache-2.0

//! Doubly-streaming (sorted-input) join semantics, and agreement with the
//! half-streaming algorithm on inputs that are sorted either way.

mod support;

use support::{dkvp_file, records, render, run_join};

use recflow::{Envelope, Record};

fn records_only(outputs: &[Envelope]) -> Vec<Record> {
    assert!(outputs.last().is_some_and(|e| e.is_end_of_stream()));
    outputs
        .iter()
        .filter_map(|e| e.as_record().cloned())
        .collect()
}

fn rendered(outputs: &[Envelope]) -> Vec<String> {
    records_only(outputs).iter().map(render).collect()
}

#[test]
fn sorted_inner_join_pairs_matching_keys() {
    let left = dkvp_file("id=1,l=a\nid=2,l=b\nid=4,l=c\n");
    let rights = records("id=2,r=x\nid=3,r=y\nid=4,r=z\n");

    let outputs = run_join(&format!("join -s -j id -f {}", left.path().display()), rights);
    assert_eq!(rendered(&outputs), vec!["id=2,l=b,r=x", "id=4,l=c,r=z"]);
}

#[test]
fn duplicate_keys_on_both_sides_cross_multiply() {
    let left = dkvp_file("id=1,l=a\nid=1,l=b\nid=2,l=c\n");
    let rights = records("id=1,r=x\nid=1,r=y\nid=2,r=z\n");

    let outputs = run_join(&format!("join -s -j id -f {}", left.path().display()), rights);
    assert_eq!(
        rendered(&outputs),
        vec![
            "id=1,l=a,r=x",
            "id=1,l=b,r=x",
            "id=1,l=a,r=y",
            "id=1,l=b,r=y",
            "id=2,l=c,r=z",
        ]
    );
}

#[test]
fn skipped_left_buckets_emit_before_the_advancing_right_record() {
    let left = dkvp_file("id=1,l=a\nid=2,l=b\nid=3,l=c\n");
    let rights = records("id=3,r=x\n");

    let outputs = run_join(
        &format!("join -s --ul -j id -f {}", left.path().display()),
        rights,
    );
    // The cursor steps past id=1 and id=2 to reach id=3; those unpaired
    // lefts surface before the pair they were skipped for.
    assert_eq!(
        rendered(&outputs),
        vec!["id=1,l=a", "id=2,l=b", "id=3,l=c,r=x"]
    );
}

#[test]
fn trailing_left_records_flush_at_end_of_stream() {
    let left = dkvp_file("id=1,l=a\nid=5,l=b\nid=6,l=c\n");
    let rights = records("id=1,r=x\n");

    let outputs = run_join(
        &format!("join -s --ul -j id -f {}", left.path().display()),
        rights,
    );
    assert_eq!(
        rendered(&outputs),
        vec!["id=1,l=a,r=x", "id=5,l=b", "id=6,l=c"]
    );
}

#[test]
fn right_unpairables_stream_in_arrival_order() {
    let left = dkvp_file("id=2,l=a\n");
    let rights = records("id=1,r=x\nid=2,r=y\nid=3,r=z\n");

    let outputs = run_join(
        &format!("join -s --ur -j id -f {}", left.path().display()),
        rights,
    );
    assert_eq!(rendered(&outputs), vec!["id=1,r=x", "id=2,l=a,r=y", "id=3,r=z"]);
}

#[test]
fn empty_left_file_leaves_all_rights_unpaired() {
    let left = dkvp_file("");
    let rights = records("id=1,r=x\nid=2,r=y\n");

    let outputs = run_join(
        &format!("join -s --np --ur -j id -f {}", left.path().display()),
        rights,
    );
    assert_eq!(rendered(&outputs), vec!["id=1,r=x", "id=2,r=y"]);
}

/// On sorted inputs both algorithms must agree on the set of pairs, the
/// set of left unpairables, and the set of right unpairables; only the
/// interleaving may differ.
#[test]
fn modes_agree_on_sorted_input() {
    let left_lines = "id=1,l=a\nid=2,l=b\nid=2,l=c\nid=5,l=d\n";
    let right_lines = "id=0,r=p\nid=2,r=q\nid=2,r=s\nid=4,r=t\nid=5,r=u\n";

    let left = dkvp_file(left_lines);
    let unsorted = run_join(
        &format!("join --ul --ur -j id -f {}", left.path().display()),
        records(right_lines),
    );
    let sorted = run_join(
        &format!("join -s --ul --ur -j id -f {}", left.path().display()),
        records(right_lines),
    );

    let mut unsorted = rendered(&unsorted);
    let mut sorted = rendered(&sorted);
    unsorted.sort();
    sorted.sort();
    assert_eq!(unsorted, sorted);
}
