//! 名称、字符串和创建跟踪的小工具

/// Bean 名称推导
pub mod naming {
    /// Separator between path segments of a fully-qualified type name.
    pub const PATH_SEPARATOR: &str = "::";

    /// Lower-cases the first character of a type name.
    ///
    /// Names starting with two upper-case characters are kept as they are,
    /// so `URLResolver` stays `URLResolver`.
    ///
    /// ```
    /// use sprig_core::utils::naming::decapitalize;
    ///
    /// assert_eq!(decapitalize("FooServiceImpl"), "fooServiceImpl");
    /// assert_eq!(decapitalize("URLResolver"), "URLResolver");
    /// assert_eq!(decapitalize("A"), "a");
    /// ```
    pub fn decapitalize(s: &str) -> String {
        let mut chars = s.char_indices();
        match (chars.next(), chars.next()) {
            (Some((_, first)), Some((_, second))) if first.is_uppercase() && second.is_uppercase() => {
                s.to_string()
            }
            (Some((_, first)), _) => first.to_lowercase().chain(s[first.len_utf8()..].chars()).collect(),
            (None, _) => String::new(),
        }
    }

    /// Returns the last segment of a `::`-separated type name.
    pub fn short_type_name(type_name: &str) -> &str {
        type_name
            .rsplit_once(PATH_SEPARATOR)
            .map(|(_, short)| short)
            .unwrap_or(type_name)
    }

    /// Returns everything before the last segment of a type name, or an
    /// empty string for a type without a package.
    pub fn package_name(type_name: &str) -> &str {
        type_name
            .rsplit_once(PATH_SEPARATOR)
            .map(|(package, _)| package)
            .unwrap_or("")
    }
}

/// String helpers for declarative attribute values
pub mod strings {
    /// Splits `s` on any of the characters in `delimiters`, trimming each
    /// token and dropping empty ones.
    ///
    /// ```
    /// use sprig_core::utils::strings::tokenize_to_string_array;
    ///
    /// let tokens = tokenize_to_string_array("a::b, c::d;\te", ",; \t\n");
    /// assert_eq!(tokens, vec!["a::b", "c::d", "e"]);
    /// ```
    pub fn tokenize_to_string_array(s: &str, delimiters: &str) -> Vec<String> {
        s.split(|c: char| delimiters.contains(c))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from)
            .collect()
    }

    /// Matches `s` against a simple pattern supporting `*` wildcards
    /// (`xxx*`, `*xxx`, `*xxx*`, `xxx*yyy` and so on).
    pub fn simple_match(pattern: &str, s: &str) -> bool {
        match pattern.find('*') {
            None => pattern == s,
            Some(0) => {
                if pattern.len() == 1 {
                    return true;
                }
                let rest = &pattern[1..];
                match rest.find('*') {
                    None => s.ends_with(rest),
                    Some(next) => {
                        let part = &rest[..next];
                        if part.is_empty() {
                            return simple_match(rest, s);
                        }
                        let mut offset = 0;
                        while let Some(pos) = s[offset..].find(part) {
                            let index = offset + pos;
                            if simple_match(&rest[next..], &s[index + part.len()..]) {
                                return true;
                            }
                            offset = index
                                + s[index..].chars().next().map_or(1, char::len_utf8);
                        }
                        false
                    }
                }
            }
            Some(first) => {
                match (s.get(..first), s.get(first..)) {
                    (Some(head), Some(tail)) => {
                        head == &pattern[..first] && simple_match(&pattern[first..], tail)
                    }
                    _ => false,
                }
            }
        }
    }
}

pub mod dependency {
    use parking_lot::Mutex;

    /// 正在创建的 Bean 名称，按开始顺序保存，循环依赖报错时输出整条链
    #[derive(Debug, Default)]
    pub struct CreationTracker {
        creating: Mutex<Vec<String>>,
    }

    impl CreationTracker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_creating(&self, name: &str) -> bool {
            self.creating.lock().iter().any(|n| n == name)
        }

        /// 名称已在链中时返回 false
        pub fn start_creating(&self, name: &str) -> bool {
            let mut creating = self.creating.lock();
            if creating.iter().any(|n| n == name) {
                return false;
            }
            creating.push(name.to_string());
            true
        }

        pub fn finish_creating(&self, name: &str) {
            let mut creating = self.creating.lock();
            if let Some(pos) = creating.iter().rposition(|n| n == name) {
                creating.remove(pos);
            }
        }

        pub fn current_creating(&self) -> Vec<String> {
            self.creating.lock().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    mod naming_tests {
        use super::super::naming::*;

        #[test]
        fn test_decapitalize() {
            assert_eq!(decapitalize("FooServiceImpl"), "fooServiceImpl");
            assert_eq!(decapitalize("A"), "a");
            assert_eq!(decapitalize("URLResolver"), "URLResolver");
            assert_eq!(decapitalize("lowerCase"), "lowerCase");
            assert_eq!(decapitalize("Éclair"), "éclair");
            assert_eq!(decapitalize(""), "");
        }

        #[test]
        fn test_short_type_name_and_package() {
            assert_eq!(short_type_name("example::scannable::FooService"), "FooService");
            assert_eq!(short_type_name("FooService"), "FooService");
            assert_eq!(package_name("example::scannable::FooService"), "example::scannable");
            assert_eq!(package_name("FooService"), "");
        }
    }

    mod strings_tests {
        use super::super::strings::*;

        #[test]
        fn test_tokenize_to_string_array() {
            assert_eq!(
                tokenize_to_string_array(" a::b ,c;;d\n", ",; \t\n"),
                vec!["a::b", "c", "d"]
            );
            assert!(tokenize_to_string_array("", ",; \t\n").is_empty());
            assert!(tokenize_to_string_array(" ,; ", ",; \t\n").is_empty());
        }

        #[test]
        fn test_simple_match() {
            assert!(simple_match("*", "anything"));
            assert!(simple_match("foo*", "fooService"));
            assert!(simple_match("*Service", "fooService"));
            assert!(simple_match("*Serv*", "fooServiceImpl"));
            assert!(simple_match("foo*Impl", "fooServiceImpl"));
            assert!(!simple_match("foo*Impl", "fooService"));
            assert!(!simple_match("bar*", "fooService"));
            assert!(simple_match("exact", "exact"));
            assert!(!simple_match("exact", "exactly"));
        }
    }

    mod dependency_tests {
        use super::super::dependency::*;

        #[test]
        fn test_creation_tracker() {
            let tracker = CreationTracker::new();

            assert!(!tracker.is_creating("serviceA"));
            assert!(tracker.start_creating("serviceA"));
            assert!(tracker.is_creating("serviceA"));

            // 再次开始创建同一个 Bean 意味着循环依赖
            assert!(!tracker.start_creating("serviceA"));

            tracker.finish_creating("serviceA");
            assert!(!tracker.is_creating("serviceA"));
        }

        #[test]
        fn test_current_creating_keeps_order() {
            let tracker = CreationTracker::new();

            tracker.start_creating("serviceA");
            tracker.start_creating("serviceB");

            assert_eq!(tracker.current_creating(), vec!["serviceA", "serviceB"]);
        }
    }
}
