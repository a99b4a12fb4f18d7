//! Property-based tests for tag resolution.
//!
//! These tests use proptest to check invariants across randomly generated
//! tag names, descriptors and linear histories.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use tagtrail::core::describe::{parse_describe_output, DescribeOutcome};
use tagtrail::core::pattern::TagPattern;
use tagtrail::core::types::{CommitId, TagName};
use tagtrail::git::{CommandStats, MockGit, StatSort, TagRef};
use tagtrail::graph::{TagIndex, TagResolver, TopoOrder};

/// Characters that are literal in both tag names and glob patterns.
fn literal_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
        Just('/'),
    ]
}

/// Valid tag names made only of literal characters.
fn tag_name() -> impl Strategy<Value = String> {
    prop::collection::vec(literal_char(), 1..30)
        .prop_map(|chars| chars.into_iter().collect::<String>())
        .prop_filter("tag names cannot start with '-'", |name| !name.starts_with('-'))
}

/// Lowercase hex abbreviations as git describe prints them.
fn abbrev() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
        ]),
        7..=40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn commit(i: usize) -> CommitId {
    CommitId::new(format!("{:040x}", i + 1)).unwrap()
}

fn resolver_over(mock: &MockGit) -> TagResolver {
    TagResolver::new(Arc::new(mock.clone()))
}

proptest! {
    /// A distance descriptor yields its tag and count, however many dashes
    /// and digits the tag itself contains.
    #[test]
    fn describe_distance_recovers_tag(
        name in tag_name(),
        count in 1u64..1_000_000,
        hex in abbrev(),
    ) {
        let raw = format!("{}-{}-g{}", name, count, hex);
        let outcome = parse_describe_output(&raw).unwrap();
        prop_assert_eq!(
            outcome,
            DescribeOutcome::Distance { base_tag: TagName::new(&name).unwrap(), count }
        );
    }

    /// A bare tag name is a direct hit.
    #[test]
    fn describe_bare_tag_is_direct(name in tag_name()) {
        prop_assume!(!name.contains("-g"));
        let outcome = parse_describe_output(&name).unwrap();
        prop_assert_eq!(outcome.count(), 0);
        prop_assert_eq!(outcome.tag().as_str(), name.as_str());
    }

    /// A pattern with no metacharacters matches exactly itself.
    #[test]
    fn literal_pattern_matches_only_itself(name in tag_name(), other in tag_name()) {
        let pattern = TagPattern::new(name.clone()).unwrap();
        prop_assert!(pattern.matches(&name));
        prop_assert_eq!(pattern.matches(&other), other == name);
    }

    /// `prefix*` matches every name that starts with the prefix.
    #[test]
    fn star_suffix_matches_prefix(prefix in tag_name(), rest in "[a-z0-9./-]{0,12}") {
        let pattern = TagPattern::new(format!("{}*", prefix)).unwrap();
        let name = format!("{}{}", prefix, rest);
        prop_assert!(pattern.matches(&name));
    }

    /// With several tags on one commit, the index keeps the smallest name.
    #[test]
    fn tag_index_keeps_smallest_name(names in prop::collection::btree_set(tag_name(), 1..8)) {
        let target = commit(0);
        let refs: Vec<TagRef> = names
            .iter()
            .rev()
            .map(|n| TagRef { name: TagName::new(n.as_str()).unwrap(), target: target.clone() })
            .collect();
        let index = TagIndex::from_refs(refs, &TagPattern::new("*").unwrap());

        prop_assert_eq!(index.len(), 1);
        let smallest = names.iter().next().unwrap();
        prop_assert_eq!(index.get(&target).unwrap().as_str(), smallest.as_str());
    }

    /// The commits before and after a position partition the order.
    #[test]
    fn topo_order_partitions_around_position(len in 1usize..40, pick in any::<prop::sample::Index>()) {
        let commits: Vec<CommitId> = (0..len).map(commit).collect();
        let order = TopoOrder::new(commits.clone());
        let i = pick.index(len);

        let mut before: Vec<CommitId> = order.before(i).cloned().collect();
        before.reverse();
        let after: Vec<CommitId> = order.after(i).cloned().collect();

        prop_assert_eq!(before.len(), i);
        prop_assert_eq!(after.len(), len - 1 - i);
        prop_assert_eq!(order.position(&commits[i]), Some(i));

        let mut rebuilt = before;
        rebuilt.push(commits[i].clone());
        rebuilt.extend(after);
        prop_assert_eq!(rebuilt, commits);
    }

    /// On a linear history, follows counts the steps back to the tag.
    #[test]
    fn follows_count_is_linear_distance(len in 2usize..30, tagged in any::<prop::sample::Index>(), at in any::<prop::sample::Index>()) {
        let (mock, commits) = MockGit::linear(len).unwrap();
        let k = tagged.index(len);
        let j = at.index(len);
        mock.tag("rel-1", commits[k].as_str()).unwrap();

        let pattern = TagPattern::new(TagPattern::DEFAULT).unwrap();
        let found = resolver_over(&mock)
            .find_follows_tag(&commits[j], Path::new("/repo"), &pattern)
            .unwrap();

        if j > k {
            let found = found.unwrap();
            prop_assert_eq!(found.count, j - k);
            prop_assert_eq!(&found.tag_sha, &commits[k]);
        } else {
            prop_assert!(found.is_none());
        }
    }

    /// On a linear history, precedes finds the tag only for earlier commits.
    #[test]
    fn precedes_only_for_earlier_commits(len in 2usize..30, tagged in any::<prop::sample::Index>(), at in any::<prop::sample::Index>()) {
        let (mock, commits) = MockGit::linear(len).unwrap();
        let k = tagged.index(len);
        let j = at.index(len);
        mock.tag("rel-1", commits[k].as_str()).unwrap();

        let pattern = TagPattern::new(TagPattern::DEFAULT).unwrap();
        let found = resolver_over(&mock)
            .find_precedes_tag(&commits[j], Path::new("/repo"), &pattern)
            .unwrap();

        prop_assert_eq!(found.is_some(), j < k);
    }

    /// Every recorded run is counted once, and no single run exceeds the total.
    #[test]
    fn stats_count_every_run(runs in prop::collection::vec((0usize..4, 0u64..50), 0..40)) {
        let stats = CommandStats::new();
        let commands = ["for-each-ref", "rev-list", "describe", "merge-base"];
        for (which, ms) in &runs {
            stats.record("git", &[commands[*which].to_string()], Duration::from_millis(*ms));
        }

        let rows = stats.snapshot(StatSort::Count);
        let total: u64 = rows.iter().map(|r| r.count).sum();
        prop_assert_eq!(total, runs.len() as u64);
        for row in &rows {
            prop_assert!(row.max_ms <= row.total_ms + f64::EPSILON);
        }
        for pair in rows.windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
        }
    }
}
