use tracing::warn;

pub const DEFAULT_CONTEXT_KEY: &str = "camera";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9555;

/// Positional arguments: `[context_key [host [port]]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub context_key: String,
    pub host: String,
    pub port: u16,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            context_key: DEFAULT_CONTEXT_KEY.to_owned(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

impl Args {
    /// Read the process arguments (the program name is skipped).
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse_from(std::env::args().skip(1))
    }

    /// Extra arguments are ignored. An invalid port falls back to [`DEFAULT_PORT`]
    /// with a warning.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let defaults = Self::default();
        let context_key = args.next().unwrap_or(defaults.context_key);
        let host = args.next().unwrap_or(defaults.host);
        let port = args.next().map_or(defaults.port, |port| parse_port(&port));
        Self {
            context_key,
            host,
            port,
        }
    }
}

fn parse_port(value: &str) -> u16 {
    value.parse::<u16>().unwrap_or_else(|_| {
        warn!("Port {value} is invalid, use default port {DEFAULT_PORT}.");
        DEFAULT_PORT
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[test]
    fn defaults_without_args() {
        let args = Args::parse_from(Vec::<String>::new());
        check!(args.context_key == "camera");
        check!(args.host == "localhost");
        check!(args.port == 9555);
    }

    #[test]
    fn positional_args_override_defaults() {
        let args = Args::parse_from(["vintage", "ads.example", "8080"]);
        check!(
            args == Args {
                context_key: "vintage".to_owned(),
                host: "ads.example".to_owned(),
                port: 8080,
            }
        );
    }

    #[test]
    fn missing_trailing_args_keep_defaults() {
        let args = Args::parse_from(["kitchen"]);
        check!(args.context_key == "kitchen");
        check!(args.host == DEFAULT_HOST);
        check!(args.port == DEFAULT_PORT);
    }

    #[rstest]
    #[case("8080", 8080)]
    #[case("abc", DEFAULT_PORT)]
    #[case("", DEFAULT_PORT)]
    #[case("-1", DEFAULT_PORT)]
    #[case("70000", DEFAULT_PORT)]
    #[case("65535", 65535)]
    fn effective_port(#[case] value: &str, #[case] expected: u16) {
        check!(parse_port(value) == expected);
    }
}
