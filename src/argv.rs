use std::fmt;
use std::ops::Index;

/// Ordered list of owned argument strings produced from one input line.
///
/// The first element names the command; the rest are its arguments. Every
/// element is an independent copy of a token, so an `Argv` never borrows from
/// the line it was parsed from. Dropping it releases all of its storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argv {
    args: Vec<String>,
}

impl Argv {
    /// Create an empty argument vector with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            args: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    /// The command name, if any.
    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }
}

impl<S: Into<String>> FromIterator<S> for Argv {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Index<usize> for Argv {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.args[index]
    }
}

/// Joins the arguments with single spaces.
impl fmt::Display for Argv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_get() {
        let argv: Argv = ["cd", "/tmp"].into_iter().collect();
        assert_eq!(argv.first(), Some("cd"));
        assert_eq!(argv.get(1), Some("/tmp"));
        assert_eq!(argv.get(2), None);
        assert_eq!(&argv[1], "/tmp");
        assert_eq!(argv.len(), 2);
    }

    #[test]
    fn test_empty_has_no_first() {
        let argv = Argv::default();
        assert!(argv.is_empty());
        assert_eq!(argv.first(), None);
        assert_eq!(argv.to_string(), "");
    }

    #[test]
    fn test_display_joins_with_spaces() {
        let argv: Argv = ["ls", "-l", "/"].into_iter().collect();
        assert_eq!(argv.to_string(), "ls -l /");
    }
}
