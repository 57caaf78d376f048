//! Membership resolution for smart lists.
//!
//! Everything in this module is pure: callers load a [`RuleSet`] and the
//! user's tag graph once, then evaluate membership in memory. Evaluation runs
//! per repository instance in this order:
//!
//! 1. an explicit exclude by id removes the instance, whatever else matches;
//! 2. an explicit include by id adds it;
//! 3. otherwise it is a member when it passes the include tag quorum (an
//!    empty include set always passes) and does not hit the exclude tag quorum
//!    (an empty exclude set never hits).

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{list, MatchQuorum};

impl MatchQuorum {
    /// Whether `tags` satisfies the rule tag set under this quorum.
    ///
    /// An empty rule set is trivially satisfied by `All` and never by `Any`;
    /// [`RuleSet::evaluate`] handles the empty case before asking.
    pub fn is_satisfied(self, rule_tags: &BTreeSet<Uuid>, tags: &BTreeSet<Uuid>) -> bool {
        match self {
            MatchQuorum::Any => !rule_tags.is_disjoint(tags),
            MatchQuorum::All => rule_tags.is_subset(tags),
        }
    }
}

/// The complete rule set of one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub include_tag_ids: BTreeSet<Uuid>,
    pub exclude_tag_ids: BTreeSet<Uuid>,
    pub include_repository_ids: BTreeSet<Uuid>,
    pub exclude_repository_ids: BTreeSet<Uuid>,
    pub include_match_quorum: MatchQuorum,
    pub exclude_match_quorum: MatchQuorum,
}

/// Which rule decided an instance's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    ExcludedById,
    IncludedById,
    IncludedByTags,
    ExcludedByTags,
    NotMatched,
}

impl Decision {
    pub fn is_member(self) -> bool {
        matches!(self, Decision::IncludedById | Decision::IncludedByTags)
    }
}

impl RuleSet {
    /// Rule set carrying the quorum settings of `list` and no rule ids.
    pub fn for_list(list: &list::Model) -> Self {
        Self {
            include_match_quorum: list.include_match_quorum,
            exclude_match_quorum: list.exclude_match_quorum,
            ..Self::default()
        }
    }

    /// Decide membership for one instance carrying `tags`.
    pub fn evaluate(&self, instance_id: Uuid, tags: &BTreeSet<Uuid>) -> Decision {
        if self.exclude_repository_ids.contains(&instance_id) {
            return Decision::ExcludedById;
        }
        if self.include_repository_ids.contains(&instance_id) {
            return Decision::IncludedById;
        }

        let include_pass =
            self.include_tag_ids.is_empty() || self.include_match_quorum.is_satisfied(&self.include_tag_ids, tags);
        if !include_pass {
            return Decision::NotMatched;
        }

        let should_exclude =
            !self.exclude_tag_ids.is_empty() && self.exclude_match_quorum.is_satisfied(&self.exclude_tag_ids, tags);
        if should_exclude {
            Decision::ExcludedByTags
        } else {
            Decision::IncludedByTags
        }
    }

    pub fn is_member(&self, instance_id: Uuid, tags: &BTreeSet<Uuid>) -> bool {
        self.evaluate(instance_id, tags).is_member()
    }

    /// Union of the include and exclude tag ids.
    pub fn referenced_tag_ids(&self) -> BTreeSet<Uuid> {
        self.include_tag_ids.union(&self.exclude_tag_ids).copied().collect()
    }

    /// Union of the include and exclude repository-instance ids.
    pub fn referenced_repository_ids(&self) -> BTreeSet<Uuid> {
        self.include_repository_ids
            .union(&self.exclude_repository_ids)
            .copied()
            .collect()
    }

    /// True when no rule ids are set, which makes every instance a member.
    pub fn is_unconstrained(&self) -> bool {
        self.include_tag_ids.is_empty()
            && self.exclude_tag_ids.is_empty()
            && self.include_repository_ids.is_empty()
            && self.exclude_repository_ids.is_empty()
    }
}

/// A user's repository instances with the tags attached to each, in a fixed
/// order. Built once per resolution pass.
#[derive(Debug, Clone, Default)]
pub struct MembershipGraph {
    entries: Vec<(Uuid, BTreeSet<Uuid>)>,
}

impl MembershipGraph {
    /// Build the graph from instance ids (kept in the given order, duplicates
    /// dropped) and `(tag_id, instance_id)` association pairs. Pairs naming an
    /// instance outside `instance_ids` are ignored.
    pub fn new<I>(instance_ids: I, associations: &[(Uuid, Uuid)]) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        let mut tags: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for (tag_id, instance_id) in associations {
            tags.entry(*instance_id).or_default().insert(*tag_id);
        }

        let mut seen = HashSet::new();
        let entries = instance_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .map(|id| {
                let instance_tags = tags.remove(&id).unwrap_or_default();
                (id, instance_tags)
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags attached to an instance, if the instance is part of the graph.
    pub fn tags_of(&self, instance_id: Uuid) -> Option<&BTreeSet<Uuid>> {
        self.entries
            .iter()
            .find(|(id, _)| *id == instance_id)
            .map(|(_, tags)| tags)
    }

    /// Member instance ids, in graph order.
    pub fn resolve(&self, rules: &RuleSet) -> Vec<Uuid> {
        self.entries
            .iter()
            .filter(|(id, tags)| rules.is_member(*id, tags))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Every instance with the decision reached for it, in graph order.
    pub fn explain(&self, rules: &RuleSet) -> Vec<(Uuid, Decision)> {
        self.entries
            .iter()
            .map(|(id, tags)| (*id, rules.evaluate(*id, tags)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn set(items: &[Uuid]) -> BTreeSet<Uuid> {
        items.iter().copied().collect()
    }

    /// Every subset of `universe`, as sets.
    fn subsets(universe: &[Uuid]) -> Vec<BTreeSet<Uuid>> {
        (0..(1u32 << universe.len()))
            .map(|mask| {
                universe
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let go = Uuid::new_v4();
        let archived = Uuid::new_v4();
        let (r1, r2, r9) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let rules = RuleSet {
            include_tag_ids: set(&[go]),
            exclude_tag_ids: set(&[archived]),
            exclude_repository_ids: set(&[r9]),
            ..RuleSet::default()
        };
        let graph = MembershipGraph::new([r1, r2, r9], &[(go, r1), (go, r2), (archived, r2), (go, r9)]);

        assert_eq!(graph.resolve(&rules), vec![r1]);
        assert_eq!(
            graph.explain(&rules),
            vec![
                (r1, Decision::IncludedByTags),
                (r2, Decision::ExcludedByTags),
                (r9, Decision::ExcludedById),
            ]
        );
    }

    #[test]
    fn test_exclude_by_id_beats_include_by_id() {
        let repo = Uuid::new_v4();
        let tag = Uuid::new_v4();
        let rules = RuleSet {
            include_repository_ids: set(&[repo]),
            exclude_repository_ids: set(&[repo]),
            include_tag_ids: set(&[tag]),
            ..RuleSet::default()
        };
        assert_eq!(rules.evaluate(repo, &set(&[tag])), Decision::ExcludedById);
        assert!(!rules.is_member(repo, &BTreeSet::new()));
    }

    #[test]
    fn test_include_by_id_overrides_tag_rules() {
        let repo = Uuid::new_v4();
        let [wanted, unwanted]: [Uuid; 2] = ids(2).try_into().unwrap();
        let rules = RuleSet {
            include_tag_ids: set(&[wanted]),
            exclude_tag_ids: set(&[unwanted]),
            include_repository_ids: set(&[repo]),
            ..RuleSet::default()
        };
        // Carries the excluded tag and lacks the included one
        assert_eq!(rules.evaluate(repo, &set(&[unwanted])), Decision::IncludedById);
    }

    #[test]
    fn test_empty_rule_set_matches_everything() {
        let rules = RuleSet::default();
        assert!(rules.is_unconstrained());

        let repos = ids(3);
        let tag = Uuid::new_v4();
        let graph = MembershipGraph::new(repos.clone(), &[(tag, repos[1])]);
        assert_eq!(graph.resolve(&rules), repos);
    }

    #[test]
    fn test_everything_except_list() {
        let archived = Uuid::new_v4();
        let repos = ids(3);
        let rules = RuleSet {
            exclude_tag_ids: set(&[archived]),
            ..RuleSet::default()
        };
        let graph = MembershipGraph::new(repos.clone(), &[(archived, repos[0])]);
        assert_eq!(graph.resolve(&rules), vec![repos[1], repos[2]]);
    }

    #[test]
    fn test_untagged_instance_against_all_quorums() {
        let repo = Uuid::new_v4();
        let tags = ids(2);
        let untagged = BTreeSet::new();

        let include_all = RuleSet {
            include_tag_ids: set(&tags),
            include_match_quorum: MatchQuorum::All,
            ..RuleSet::default()
        };
        assert_eq!(include_all.evaluate(repo, &untagged), Decision::NotMatched);

        let exclude_all = RuleSet {
            exclude_tag_ids: set(&tags),
            exclude_match_quorum: MatchQuorum::All,
            ..RuleSet::default()
        };
        assert_eq!(exclude_all.evaluate(repo, &untagged), Decision::IncludedByTags);
    }

    #[test]
    fn test_all_quorum_requires_every_tag() {
        let repo = Uuid::new_v4();
        let [rust, cli, web]: [Uuid; 3] = ids(3).try_into().unwrap();
        let rules = RuleSet {
            include_tag_ids: set(&[rust, cli]),
            include_match_quorum: MatchQuorum::All,
            ..RuleSet::default()
        };
        assert!(!rules.is_member(repo, &set(&[rust])));
        assert!(!rules.is_member(repo, &set(&[rust, web])));
        assert!(rules.is_member(repo, &set(&[rust, cli])));
        assert!(rules.is_member(repo, &set(&[rust, cli, web])));
    }

    #[test]
    fn test_exclude_all_quorum_only_hits_full_match() {
        let repo = Uuid::new_v4();
        let [old, fork]: [Uuid; 2] = ids(2).try_into().unwrap();
        let rules = RuleSet {
            exclude_tag_ids: set(&[old, fork]),
            exclude_match_quorum: MatchQuorum::All,
            ..RuleSet::default()
        };
        assert!(rules.is_member(repo, &set(&[old])));
        assert_eq!(rules.evaluate(repo, &set(&[old, fork])), Decision::ExcludedByTags);
    }

    #[test]
    fn test_switching_to_any_never_shrinks_include_side() {
        let universe = ids(3);
        let repo = Uuid::new_v4();
        for include in subsets(&universe) {
            for exclude in subsets(&universe) {
                for tags in subsets(&universe) {
                    for exclude_quorum in [MatchQuorum::Any, MatchQuorum::All] {
                        let all = RuleSet {
                            include_tag_ids: include.clone(),
                            exclude_tag_ids: exclude.clone(),
                            include_match_quorum: MatchQuorum::All,
                            exclude_match_quorum: exclude_quorum,
                            ..RuleSet::default()
                        };
                        let any = RuleSet {
                            include_match_quorum: MatchQuorum::Any,
                            ..all.clone()
                        };
                        if all.is_member(repo, &tags) {
                            assert!(any.is_member(repo, &tags), "ANY dropped a member that ALL kept");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_switching_to_any_never_grows_exclude_side() {
        let universe = ids(3);
        let repo = Uuid::new_v4();
        for include in subsets(&universe) {
            for exclude in subsets(&universe) {
                for tags in subsets(&universe) {
                    let all = RuleSet {
                        include_tag_ids: include.clone(),
                        exclude_tag_ids: exclude.clone(),
                        exclude_match_quorum: MatchQuorum::All,
                        ..RuleSet::default()
                    };
                    let any = RuleSet {
                        exclude_match_quorum: MatchQuorum::Any,
                        ..all.clone()
                    };
                    if any.is_member(repo, &tags) {
                        assert!(all.is_member(repo, &tags), "ALL exclusion removed a member ANY kept");
                    }
                }
            }
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let repos = ids(4);
        let tags = ids(2);
        let rules = RuleSet {
            include_tag_ids: set(&tags),
            ..RuleSet::default()
        };
        let graph = MembershipGraph::new(repos.clone(), &[(tags[0], repos[0]), (tags[1], repos[2])]);
        let first = graph.resolve(&rules);
        assert_eq!(first, graph.resolve(&rules));
        assert_eq!(first, vec![repos[0], repos[2]]);
    }

    #[test]
    fn test_graph_ignores_unknown_instances_and_duplicates() {
        let repo = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let tag = Uuid::new_v4();
        let graph = MembershipGraph::new([repo, repo], &[(tag, repo), (tag, stranger)]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.tags_of(repo), Some(&set(&[tag])));
        assert!(graph.tags_of(stranger).is_none());
    }

    #[test]
    fn test_referenced_ids() {
        let [a, b]: [Uuid; 2] = ids(2).try_into().unwrap();
        let rules = RuleSet {
            include_tag_ids: set(&[a]),
            exclude_tag_ids: set(&[a, b]),
            ..RuleSet::default()
        };
        assert_eq!(rules.referenced_tag_ids(), set(&[a, b]));
        assert!(rules.referenced_repository_ids().is_empty());
    }
}
