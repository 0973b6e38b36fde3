//! Domain names and labels.
//!
//! Construction from text is strict (RFC 1035's `[a-z0-9-]`, no leading or
//! trailing hyphen). Construction from the wire is permissive: a resolver has
//! to tolerate whatever bytes an upstream server sends, so [`Label::from_wire_bytes`]
//! never fails.

use std::fmt;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    EmptyLabel,
    LabelTooLong(usize),
    InvalidLabelChar(char),
    LeadingOrTrailingHyphen,
    NameTooLong(usize),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLabel => write!(f, "empty label"),
            Self::LabelTooLong(len) => write!(f, "label of {len} bytes exceeds {MAX_LABEL_LEN}"),
            Self::InvalidLabelChar(c) => write!(f, "invalid character in label: {c:?}"),
            Self::LeadingOrTrailingHyphen => write!(f, "label starts or ends with a hyphen"),
            Self::NameTooLong(len) => write!(f, "name of {len} bytes exceeds {MAX_NAME_LEN}"),
        }
    }
}

impl std::error::Error for NameError {}

/// A single DNS label: 1..=63 octets, case-folded to lower on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    /// Validates and lower-cases `raw`. Used when a name is built from text
    /// (CLI arguments, config, user input).
    pub fn new(raw: &str) -> Result<Self, NameError> {
        if raw.is_empty() {
            return Err(NameError::EmptyLabel);
        }
        if raw.len() > MAX_LABEL_LEN {
            return Err(NameError::LabelTooLong(raw.len()));
        }
        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(NameError::LeadingOrTrailingHyphen);
        }
        if let Some(c) = raw.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
            return Err(NameError::InvalidLabelChar(c));
        }
        Ok(Label(raw.to_ascii_lowercase()))
    }

    /// Builds a label directly from wire bytes, with no validation beyond
    /// UTF-8 lossy conversion. Resolvers must accept any bytes a server sends.
    pub fn from_wire_bytes(raw: &[u8]) -> Self {
        Label(String::from_utf8_lossy(raw).to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An ordered sequence of labels. The empty sequence is the DNS root.
///
/// Two names are equal iff their case-folded textual forms match -- since
/// every [`Label`] is already lower-cased on construction, plain derived
/// equality gives us that for free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name(Vec<Label>);

impl Name {
    pub fn root() -> Self {
        Name(Vec::new())
    }

    /// Parses a dotted textual name such as `www.example.com`, validating
    /// every label. A trailing dot (fully-qualified form) is tolerated.
    pub fn parse(text: &str) -> Result<Self, NameError> {
        let text = text.trim_end_matches('.');
        if text.is_empty() {
            return Ok(Self::root());
        }
        let labels = text
            .split('.')
            .map(Label::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_labels(labels)
    }

    pub fn from_labels(labels: Vec<Label>) -> Result<Self, NameError> {
        let name = Name(labels);
        let len = name.encoded_len();
        if len > MAX_NAME_LEN {
            return Err(NameError::NameTooLong(len));
        }
        Ok(name)
    }

    /// Builds a name from wire-decoded labels without re-validating them --
    /// they already passed through the permissive decode path.
    pub fn from_wire_labels(labels: Vec<Label>) -> Self {
        Name(labels)
    }

    /// Encoded wire length: each label costs `len+1` bytes, plus the 1 byte
    /// root terminator.
    pub fn encoded_len(&self) -> usize {
        self.0.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    pub fn labels(&self) -> &[Label] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the name with the leftmost label stripped, i.e. the parent
    /// zone. `Name::root().parent() == Name::root()`.
    pub fn parent(&self) -> Name {
        if self.0.is_empty() {
            Name::root()
        } else {
            Name(self.0[1..].to_vec())
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, ".");
        }
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", label.as_str())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_simple_name() {
        let name = Name::parse("www.example.com").unwrap();
        assert_eq!(name.to_string(), "www.example.com");
        assert_eq!(name.labels().len(), 3);
    }

    #[test]
    fn should_fold_case() {
        let a = Name::parse("WWW.Example.COM").unwrap();
        let b = Name::parse("www.example.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn should_reject_leading_hyphen() {
        assert!(Name::parse("-bad.example.com").is_err());
    }

    #[test]
    fn should_reject_label_too_long() {
        let long = "a".repeat(64);
        assert!(Name::parse(&long).is_err());
    }

    #[test]
    fn should_accept_anything_from_the_wire() {
        // Underscores are not valid in a constructed label but resolvers
        // must still decode them off the wire (e.g. SRV/TXT conventions).
        let label = Label::from_wire_bytes(b"_dmarc");
        let name = Name::from_wire_labels(vec![label]);
        assert_eq!(name.to_string(), "_dmarc");
    }

    #[test]
    fn root_is_empty_and_dot() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), ".");
        assert_eq!(root.encoded_len(), 1);
    }

    #[test]
    fn parent_strips_leftmost_label() {
        let name = Name::parse("www.example.com").unwrap();
        assert_eq!(name.parent().to_string(), "example.com");
    }
}
