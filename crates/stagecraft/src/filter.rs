//! Sub-stage inclusion.
//!
//! A running stage asks [`SubStageFilter::decide`] once per declared
//! sub-stage. The decision depends only on the declared list, the `only`
//! and `without` filters, and whether the stage binds a handler to the name.

use stagecraft_types::Filter;

/// Outcome of an inclusion check. Everything but `Included` is a skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Included,
    /// Not in the stage's declared list.
    Undeclared,
    /// `only` is set and does not name it.
    NotSelected,
    /// `without` names it. Wins over `only`.
    Excluded,
    /// Declared but the stage has no handler for it.
    Unbound,
}

impl Inclusion {
    pub fn is_included(self) -> bool {
        self == Inclusion::Included
    }

    pub fn reason(self) -> &'static str {
        match self {
            Inclusion::Included => "included",
            Inclusion::Undeclared => "not declared by this stage",
            Inclusion::NotSelected => "not selected by --only",
            Inclusion::Excluded => "excluded by --without",
            Inclusion::Unbound => "no implementation bound",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubStageFilter<'a> {
    only: &'a Filter,
    without: &'a Filter,
}

impl<'a> SubStageFilter<'a> {
    pub fn new(only: &'a Filter, without: &'a Filter) -> Self {
        Self { only, without }
    }

    pub fn decide(&self, declared: &[&str], name: &str, bound: bool) -> Inclusion {
        if !declared.iter().any(|d| *d == name) {
            return Inclusion::Undeclared;
        }
        // An empty `only` places no restriction.
        let included = self.only.is_empty() || self.only.contains(name);
        let excluded = !self.without.is_empty() && self.without.contains(name);

        if excluded {
            Inclusion::Excluded
        } else if !included {
            Inclusion::NotSelected
        } else if !bound {
            Inclusion::Unbound
        } else {
            Inclusion::Included
        }
    }

    /// Pure inclusion for a sub-stage that has a handler.
    pub fn is_included(&self, declared: &[&str], name: &str) -> bool {
        self.decide(declared, name, true).is_included()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DECLARED: [&str; 3] = ["compile", "replace", "test"];

    fn filter(names: &[&str]) -> Filter {
        Filter::parse(names.iter().copied())
    }

    #[test]
    fn empty_filters_include_everything() {
        let (only, without) = (Filter::new(), Filter::new());
        let f = SubStageFilter::new(&only, &without);
        for name in DECLARED {
            assert!(f.is_included(&DECLARED, name));
        }
    }

    #[test]
    fn undeclared_names_are_never_included() {
        let (only, without) = (filter(&["minify"]), Filter::new());
        let f = SubStageFilter::new(&only, &without);
        assert_eq!(f.decide(&DECLARED, "minify", true), Inclusion::Undeclared);
    }

    #[test]
    fn only_restricts_to_named_sub_stages() {
        let (only, without) = (filter(&["replace"]), Filter::new());
        let f = SubStageFilter::new(&only, &without);
        assert!(f.is_included(&DECLARED, "replace"));
        assert_eq!(f.decide(&DECLARED, "compile", true), Inclusion::NotSelected);
        assert_eq!(f.decide(&DECLARED, "test", true), Inclusion::NotSelected);
    }

    #[test]
    fn without_beats_only() {
        let (only, without) = (filter(&["test"]), filter(&["test"]));
        let f = SubStageFilter::new(&only, &without);
        assert_eq!(f.decide(&DECLARED, "test", true), Inclusion::Excluded);
    }

    #[test]
    fn unbound_sub_stages_are_skipped() {
        let (only, without) = (Filter::new(), Filter::new());
        let f = SubStageFilter::new(&only, &without);
        assert_eq!(f.decide(&DECLARED, "test", false), Inclusion::Unbound);
        assert!(!Inclusion::Unbound.is_included());
    }

    fn declared_list() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-z]{1,8}", 1..6).prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn permissive_without_filters(declared in declared_list()) {
            let names: Vec<&str> = declared.iter().map(String::as_str).collect();
            let (only, without) = (Filter::new(), Filter::new());
            let f = SubStageFilter::new(&only, &without);
            for name in &names {
                prop_assert!(f.is_included(&names, name));
            }
        }

        #[test]
        fn only_selects_exactly_one(declared in declared_list(), pick in any::<prop::sample::Index>()) {
            let names: Vec<&str> = declared.iter().map(String::as_str).collect();
            let chosen = names[pick.index(names.len())];
            let (only, without) = (filter(&[chosen]), Filter::new());
            let f = SubStageFilter::new(&only, &without);
            for name in &names {
                prop_assert_eq!(f.is_included(&names, name), *name == chosen);
            }
        }

        #[test]
        fn exclusion_always_wins(declared in declared_list(), pick in any::<prop::sample::Index>()) {
            let names: Vec<&str> = declared.iter().map(String::as_str).collect();
            let chosen = names[pick.index(names.len())];
            let (only, without) = (filter(&[chosen]), filter(&[chosen]));
            let f = SubStageFilter::new(&only, &without);
            prop_assert!(!f.is_included(&names, chosen));
        }
    }
}
