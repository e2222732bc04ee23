use crate::domain::Subscription;

/// Move the pinned pseudo-subreddits to the front: `frontpage` first, then
/// `popular`, the rest keeping their relative order.
///
/// Each pinned name is matched case-insensitively, searching from the end;
/// only the last occurrence moves. Missing names are not synthesized.
pub fn pin_reserved(mut subs: Vec<Subscription>, frontpage: &str, popular: &str) -> Vec<Subscription> {
    let popular_sub = take_last_named(&mut subs, popular);
    let frontpage_sub = take_last_named(&mut subs, frontpage);

    let mut pinned = Vec::with_capacity(subs.len() + 2);
    pinned.extend(frontpage_sub);
    pinned.extend(popular_sub);
    pinned.extend(subs);
    pinned
}

fn take_last_named(subs: &mut Vec<Subscription>, name: &str) -> Option<Subscription> {
    let index = subs.iter().rposition(|s| s.is_named(name))?;
    Some(subs.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(names: &[&str]) -> Vec<Subscription> {
        names.iter().map(|n| Subscription::confirmed(*n)).collect()
    }

    fn names(subs: &[Subscription]) -> Vec<&str> {
        subs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_pins_frontpage_then_popular() {
        let ordered = pin_reserved(
            subs(&["aww", "Popular", "pics", "Frontpage", "gifs"]),
            "Frontpage",
            "Popular",
        );
        assert_eq!(names(&ordered), vec!["Frontpage", "Popular", "aww", "pics", "gifs"]);
    }

    #[test]
    fn test_pinned_at_end() {
        let ordered = pin_reserved(subs(&["aww", "Frontpage", "Popular"]), "Frontpage", "Popular");
        assert_eq!(names(&ordered), vec!["Frontpage", "Popular", "aww"]);
    }

    #[test]
    fn test_pinned_reversed_at_front() {
        let ordered = pin_reserved(subs(&["Popular", "Frontpage", "aww"]), "Frontpage", "Popular");
        assert_eq!(names(&ordered), vec!["Frontpage", "Popular", "aww"]);
    }

    #[test]
    fn test_matches_case_insensitively() {
        let ordered = pin_reserved(subs(&["aww", "popular", "FRONTPAGE"]), "Frontpage", "Popular");
        assert_eq!(names(&ordered), vec!["FRONTPAGE", "popular", "aww"]);
    }

    #[test]
    fn test_only_last_match_moves() {
        let ordered = pin_reserved(
            subs(&["popular", "aww", "Popular"]),
            "Frontpage",
            "Popular",
        );
        assert_eq!(names(&ordered), vec!["Popular", "popular", "aww"]);
        assert_eq!(ordered.len(), 3);
    }

    #[test]
    fn test_missing_pinned_names() {
        let ordered = pin_reserved(subs(&["aww", "Popular"]), "Frontpage", "Popular");
        assert_eq!(names(&ordered), vec!["Popular", "aww"]);

        let ordered = pin_reserved(subs(&["aww", "pics"]), "Frontpage", "Popular");
        assert_eq!(names(&ordered), vec!["aww", "pics"]);

        assert!(pin_reserved(vec![], "Frontpage", "Popular").is_empty());
    }
}
