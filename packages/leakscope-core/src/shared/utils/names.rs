//! Class name helpers

/// Return the part of `name` after the last `separator`, or `name` itself
///
/// `last_segment("com.example.Foo$Bar", '.')` is `"Foo$Bar"`.
pub fn last_segment(name: &str, separator: char) -> &str {
    match name.rfind(separator) {
        Some(idx) => &name[idx + separator.len_utf8()..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("com.example.Foo", '.'), "Foo");
        assert_eq!(last_segment("com.example.Foo$Bar", '.'), "Foo$Bar");
        assert_eq!(last_segment("Foo", '.'), "Foo");
        assert_eq!(last_segment("trailing.", '.'), "");
    }
}
