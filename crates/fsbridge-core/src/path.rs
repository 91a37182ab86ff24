//! `file://` locator normalization.

/// Scheme prefix hosts do not accept on local paths.
pub const FILE_SCHEME: &str = "file://";

/// Strip the `file://` scheme from a path-shaped argument.
///
/// Repeated prefixes are stripped as well, so normalizing twice yields the
/// same result as normalizing once.
#[must_use]
pub fn normalize_file_path(path: &str) -> &str {
    let mut rest = path;
    while let Some(stripped) = rest.strip_prefix(FILE_SCHEME) {
        rest = stripped;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_file_scheme() {
        assert_eq!(normalize_file_path("file:///a/b"), "/a/b");
        assert_eq!(normalize_file_path("/a/b"), "/a/b");
        assert_eq!(normalize_file_path("relative/c.txt"), "relative/c.txt");
        assert_eq!(normalize_file_path(""), "");
    }

    #[test]
    fn leaves_other_schemes_and_inner_occurrences() {
        assert_eq!(normalize_file_path("https://x/y.bin"), "https://x/y.bin");
        assert_eq!(normalize_file_path("FILE:///a"), "FILE:///a");
        assert_eq!(normalize_file_path("/tmp/file:///a"), "/tmp/file:///a");
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in [
            "file:///a/b",
            "file://file:///nested",
            "/plain",
            "file://",
            "content://media/1",
        ] {
            let once = normalize_file_path(input);
            assert_eq!(normalize_file_path(once), once, "input {input}");
        }
    }
}
