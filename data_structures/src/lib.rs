#![warn(clippy::all)]

pub mod scope_map;

pub use fxhash::FxHashMap as HashMap;
pub use fxhash::FxHashSet as HashSet;

use edit_distance::edit_distance;

/// Find the candidate closest to `target`, if any of them are close enough
/// that it's worth suggesting as a typo fix.
pub fn find_similar<'a, I>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = None;
    let mut lowest_distance = std::usize::MAX;
    for candidate in candidates {
        let distance = edit_distance(target, candidate);
        if distance < lowest_distance {
            lowest_distance = distance;
            result = Some(candidate);
        }
    }
    // Only make a recommendation if the edit distance is low
    if lowest_distance < 3 {
        result
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::find_similar;
    use quickcheck_macros::quickcheck;

    #[test]
    fn suggests_close_names() {
        let names = vec!["content", "header", "footer"];
        assert_eq!(find_similar("contnet", names.iter().copied()), Some("content"));
        assert_eq!(find_similar("sidebar", names.iter().copied()), None);
    }

    #[quickcheck]
    fn exact_match_is_always_suggested(name: String) -> bool {
        find_similar(&name, vec![name.as_str()]) == Some(name.as_str())
    }
}
