use augprint_core::{
    generate, quote_value, Config, FlatEntry, PathSegmenter, SiblingGroup, WildcardStyle,
};
use proptest::prelude::*;

fn component() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::string::string_regex("[a-z#_][a-z0-9_-]{0,5}").unwrap(),
        (proptest::string::string_regex("[a-z#][a-z_]{0,5}").unwrap(), 1u32..20)
            .prop_map(|(label, n)| format!("{label}[{n}]")),
        (1u32..40).prop_map(|n| n.to_string()),
        proptest::string::string_regex("[a-z.\\[\\] ]{0,6}").unwrap(),
    ]
}

fn raw_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(component(), 0..7).prop_map(|parts| {
        let mut path = String::from("/files");
        for part in parts {
            path.push('/');
            path.push_str(&part);
        }
        path
    })
}

fn unquote(quoted: &str) -> Option<String> {
    let delimiter = quoted.chars().next()?;
    let inner = quoted.strip_prefix(delimiter)?.strip_suffix(delimiter)?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            c if c == delimiter => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn segmentation_reconstructs_the_input(path in raw_path()) {
        let segmented = PathSegmenter::new().segment(&path);
        prop_assert_eq!(segmented.to_path(), path);
    }

    #[test]
    fn quoting_never_leaks_the_delimiter(value in "[a-z'\"\\\\\n\t ]{0,12}") {
        let quoted = quote_value(&value);
        if value.contains('\'') {
            prop_assert!(quoted.starts_with('"'));
        } else {
            prop_assert!(quoted.starts_with('\''));
        }
        prop_assert_eq!(unquote(&quoted), Some(value));
    }

    #[test]
    fn chosen_tails_discriminate(
        rows in proptest::collection::vec((1u8..6, 0u8..3, 0u8..3), 1..24)
    ) {
        let mut group = SiblingGroup::new();
        for (index, tail, value) in &rows {
            group.add(&index.to_string(), ["name", "port", ""][*tail as usize], &format!("v{value}"));
        }
        group.choose_tail();

        let indices: Vec<String> = group.indices().map(str::to_string).collect();
        for i in &indices {
            for j in &indices {
                if i == j {
                    continue;
                }
                if let (Some(ti), Some(tj)) = (group.chosen_tail(i), group.chosen_tail(j)) {
                    if ti == tj {
                        prop_assert_ne!(group.value(i, ti), group.value(j, tj));
                    }
                }
            }
        }
    }

    #[test]
    fn one_directive_per_kept_entry(
        values in proptest::collection::vec("[a-c]{1,2}", 1..10)
    ) {
        let entries: Vec<FlatEntry> = values
            .iter()
            .enumerate()
            .map(|(n, v)| FlatEntry::leaf(format!("/files/etc/list/{}", n + 1), v.clone()))
            .collect();
        let conversion = generate(&entries, &Config::with_wildcard(WildcardStyle::Generic));
        prop_assert_eq!(conversion.directives.len(), entries.len());
        for (directive, entry) in conversion.directives.iter().zip(&entries) {
            prop_assert_eq!(&directive.source, &entry.path);
            prop_assert!(directive.path.starts_with("/files/etc/list/*["));
        }
        let unresolved_paths: usize = conversion.unresolved.iter().map(|g| g.paths.len()).sum();
        let duplicated = entries
            .iter()
            .filter(|e| values.iter().filter(|v| Some(v.as_str()) == e.value.as_deref()).count() > 1)
            .count();
        prop_assert_eq!(unresolved_paths, duplicated);
    }
}

#[test]
fn value_with_quote_and_backslash_uses_double_quotes() {
    let quoted = quote_value(r"it's a\b");
    assert_eq!(quoted, r#""it's a\\b""#);
}
