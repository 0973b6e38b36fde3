use std::fmt;

/// Error surface of the binary itself: everything the library crates can
/// raise, wrapped so `main` has one type to match on.
#[derive(Debug)]
pub enum CliError {
    InvalidName(resolv_proto::NameError),
    Resolve(resolv_resolver::ResolveError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "invalid domain name: {err}"),
            Self::Resolve(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Resolve(err) => Some(err),
        }
    }
}

impl From<resolv_proto::NameError> for CliError {
    fn from(value: resolv_proto::NameError) -> Self {
        Self::InvalidName(value)
    }
}

impl From<resolv_resolver::ResolveError> for CliError {
    fn from(value: resolv_resolver::ResolveError) -> Self {
        Self::Resolve(value)
    }
}
