// ── Unique naming ──

/// Return `base` if no existing name equals it, else `"{base} (n)"` with
/// the smallest `n >= 1` that is free.
pub fn unique_name<'a, I>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: std::collections::HashSet<&str> = existing.into_iter().collect();
    let mut candidate = base.to_owned();
    let mut i = 0u32;
    while taken.contains(candidate.as_str()) {
        i += 1;
        candidate = format!("{base} ({i})");
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_base_is_kept() {
        assert_eq!(unique_name("New cache", ["Orders"]), "New cache");
    }

    #[test]
    fn skips_taken_suffixes() {
        let names = ["New cluster", "New cluster (1)"];
        assert_eq!(unique_name("New cluster", names), "New cluster (2)");
    }

    #[test]
    fn fills_first_gap() {
        let names = ["New IGFS", "New IGFS (2)"];
        assert_eq!(unique_name("New IGFS", names), "New IGFS (1)");
    }
}
