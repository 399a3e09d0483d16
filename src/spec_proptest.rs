//! Property-based tests for specifier parsing and ref selection.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::refs::{parse_ls_remote, select_ref};
    use crate::spec::{parse, Site, DEFAULT_REF};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{1,16}"
    }

    fn site_prefix() -> impl Strategy<Value = (String, Site)> {
        prop_oneof![
            Just((String::new(), Site::Github)),
            Just(("github:".to_string(), Site::Github)),
            Just(("gitlab:".to_string(), Site::Gitlab)),
            Just(("bitbucket:".to_string(), Site::Bitbucket)),
            Just(("https://gitlab.com/".to_string(), Site::Gitlab)),
            Just(("bitbucket.org/".to_string(), Site::Bitbucket)),
            Just(("git@github.com:".to_string(), Site::Github)),
        ]
    }

    proptest! {
        /// Property: parse never panics, whatever the input
        #[test]
        fn parse_never_panics(input in ".*") {
            let _ = parse(&input);
        }

        /// Property: every component of [host:]owner/name[/subdir][#ref] is recovered
        #[test]
        fn parse_recovers_components(
            (prefix, site) in site_prefix(),
            owner in segment(),
            name in segment(),
            subdir in proptest::collection::vec(segment(), 0..4),
            r#ref in proptest::option::of("[A-Za-z0-9._/-]{1,24}"),
        ) {
            let mut src = format!("{}{}/{}", prefix, owner, name);
            for part in &subdir {
                src.push('/');
                src.push_str(part);
            }
            if let Some(r) = &r#ref {
                src.push('#');
                src.push_str(r);
            }

            let repo = parse(&src).unwrap();
            prop_assert_eq!(repo.site, site);
            prop_assert_eq!(&repo.owner, &owner);
            prop_assert_eq!(&repo.name, &name);
            let expected_subdir = if subdir.is_empty() { None } else { Some(subdir.join("/")) };
            prop_assert_eq!(repo.subdir, expected_subdir);
            prop_assert_eq!(repo.r#ref, r#ref.unwrap_or_else(|| DEFAULT_REF.to_string()));
        }

        /// Property: the display form parses back to the same descriptor
        #[test]
        fn display_reparses(
            owner in segment(),
            name in segment(),
            subdir in proptest::option::of(segment()),
            r#ref in "[A-Za-z0-9._-]{1,16}",
        ) {
            let src = match &subdir {
                Some(dir) => format!("{}/{}/{}#{}", owner, name, dir, r#ref),
                None => format!("{}/{}#{}", owner, name, r#ref),
            };
            let repo = parse(&src).unwrap();
            let reparsed = parse(&repo.to_string()).unwrap();
            prop_assert_eq!(reparsed, repo);
        }

        /// Property: an advertised ref is always selected by its exact name
        #[test]
        fn advertised_branch_selected_by_name(
            branches in proptest::collection::btree_map("[a-z]{1,12}", "[0-9a-f]{40}", 1..8),
        ) {
            let listing: String = branches
                .iter()
                .map(|(name, hash)| format!("{}\trefs/heads/{}\n", hash, name))
                .collect();
            let refs = parse_ls_remote(&listing).unwrap();

            for (name, hash) in &branches {
                let (entry, exact) = select_ref(&refs, name).unwrap();
                prop_assert!(exact);
                prop_assert_eq!(&entry.hash, hash);
            }
        }
    }
}
