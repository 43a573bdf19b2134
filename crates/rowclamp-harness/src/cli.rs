#![forbid(unsafe_code)]

//! Command-line argument parsing for the harness binary.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `ROWCLAMP_HARNESS_*` prefix.

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
rowclamp-harness: settle one truncated text box in a headless layout host

USAGE:
    rowclamp-harness [OPTIONS] [TEXT]

OPTIONS:
    --text=TEXT          Source text (default: a 50-word lorem ipsum)
    --rows=N             Row budget (default: 3)
    --width=PX           Box width in pixels (default: 320)
    --advance=PX         Cell advance in pixels (default: 8)
    --line-height=PX     Line height in pixels (default: 20)
    --max-passes=N       Give up after N layout passes (default: 256)
    --expanded           Show the full text
    --trace              Print the decision trace as JSON lines
    --json               Print a JSON report instead of the bare output
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    ROWCLAMP_HARNESS_TEXT     Override --text
    ROWCLAMP_HARNESS_ROWS     Override --rows
    ROWCLAMP_HARNESS_WIDTH    Override --width
    ROWCLAMP_*                Engine configuration (ellipsis, placeholder, ...)
    RUST_LOG                  Log filter for stderr diagnostics (default: warn)";

pub const LOREM: &str = "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do \
eiusmod tempor incididunt ut labore et dolore magna aliqua Ut enim ad minim veniam quis \
nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat Duis aute \
irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Source text.
    pub text: String,
    /// Row budget.
    pub rows: u16,
    /// Box width in pixels.
    pub width: f32,
    /// Cell advance in pixels.
    pub advance: f32,
    /// Line height in pixels.
    pub line_height: f32,
    /// Pass limit.
    pub max_passes: usize,
    /// Expanded bypass.
    pub expanded: bool,
    /// Print the decision trace.
    pub trace: bool,
    /// Print a JSON report.
    pub json: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            text: LOREM.to_string(),
            rows: 3,
            width: 320.0,
            advance: 8.0,
            line_height: 20.0,
            max_passes: 256,
            expanded: false,
            trace: false,
            json: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a scenario.
    Run(Opts),
    /// Print help.
    Help,
    /// Print the version.
    Version,
}

impl Command {
    /// Version banner.
    pub fn version_line() -> String {
        format!("rowclamp-harness {VERSION}")
    }
}

/// Parse `args` (without the program name) with `get_env` for overrides.
///
/// Environment variables take precedence over defaults but are overridden by
/// explicit command-line flags.
pub fn parse<I, F>(args: I, get_env: F) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    let mut opts = Opts::default();

    if let Some(val) = get_env("ROWCLAMP_HARNESS_TEXT") {
        opts.text = val;
    }
    if let Some(val) = get_env("ROWCLAMP_HARNESS_ROWS")
        && let Ok(n) = val.trim().parse()
    {
        opts.rows = n;
    }
    if let Some(val) = get_env("ROWCLAMP_HARNESS_WIDTH")
        && let Ok(n) = val.trim().parse()
    {
        opts.width = n;
    }

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--expanded" => opts.expanded = true,
            "--trace" => opts.trace = true,
            "--json" => opts.json = true,
            other => {
                if let Some(val) = other.strip_prefix("--text=") {
                    opts.text = val.to_string();
                } else if let Some(val) = other.strip_prefix("--rows=") {
                    opts.rows = parse_value("--rows", val)?;
                } else if let Some(val) = other.strip_prefix("--width=") {
                    opts.width = parse_value("--width", val)?;
                } else if let Some(val) = other.strip_prefix("--advance=") {
                    opts.advance = parse_positive("--advance", val)?;
                } else if let Some(val) = other.strip_prefix("--line-height=") {
                    opts.line_height = parse_positive("--line-height", val)?;
                } else if let Some(val) = other.strip_prefix("--max-passes=") {
                    opts.max_passes = parse_value("--max-passes", val)?;
                } else if other.starts_with('-') {
                    return Err(format!("unknown argument: {other}"));
                } else {
                    opts.text = other.to_string();
                }
            }
        }
    }

    Ok(Command::Run(opts))
}

fn parse_value<T: std::str::FromStr>(flag: &str, val: &str) -> Result<T, String> {
    val.parse()
        .map_err(|_| format!("invalid value for {flag}: {val}"))
}

fn parse_positive(flag: &str, val: &str) -> Result<f32, String> {
    let n: f32 = parse_value(flag, val)?;
    if n.is_finite() && n > 0.0 {
        Ok(n)
    } else {
        Err(format!("{flag} must be a positive number, got {val}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_args() {
        assert_eq!(parse(args(&[]), no_env), Ok(Command::Run(Opts::default())));
    }

    #[test]
    fn flags_override_defaults() {
        let Ok(Command::Run(opts)) = parse(
            args(&["--rows=1", "--width=96", "--line-height=18", "--trace", "hello world"]),
            no_env,
        ) else {
            panic!("expected run");
        };
        assert_eq!(opts.rows, 1);
        assert_eq!(opts.width, 96.0);
        assert_eq!(opts.line_height, 18.0);
        assert!(opts.trace);
        assert_eq!(opts.text, "hello world");
    }

    #[test]
    fn flags_beat_env() {
        let env = |key: &str| match key {
            "ROWCLAMP_HARNESS_ROWS" => Some("7".to_string()),
            "ROWCLAMP_HARNESS_WIDTH" => Some("200".to_string()),
            _ => None,
        };
        let Ok(Command::Run(opts)) = parse(args(&["--rows=2"]), env) else {
            panic!("expected run");
        };
        assert_eq!(opts.rows, 2);
        assert_eq!(opts.width, 200.0);
    }

    #[test]
    fn help_and_version() {
        assert_eq!(parse(args(&["-h"]), no_env), Ok(Command::Help));
        assert_eq!(parse(args(&["--version"]), no_env), Ok(Command::Version));
        assert!(Command::version_line().starts_with("rowclamp-harness "));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(parse(args(&["--rows=x"]), no_env).is_err());
        assert!(parse(args(&["--advance=0"]), no_env).is_err());
        assert!(parse(args(&["--bogus"]), no_env).is_err());
    }
}
