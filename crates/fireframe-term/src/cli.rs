#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Parses args manually to keep the binary lean. Every option has a
//! `FIREFRAME_*` environment override; explicit flags win over the
//! environment. Both `--flag=value` and `--flag value` forms are accepted.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use fireframe_core::SceneConfig;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
Fireframe: a rotating wireframe burning in a fixed-point fire

USAGE:
    fireframe [OPTIONS]

OPTIONS:
    --width=N, -W N          Simulation width in pixels (default: terminal width)
    --height=N, -H N         Simulation height in pixels (default: terminal height)
    --palette=NAME, -p NAME  Starting palette (default: fire)
    --shape=NAME, -s NAME    Starting shape (default: cube)
    --cooling=N, -c N        Fire cooling, 0 or more (default: 12)
    --mesh=PATH, -m PATH     Extra OBJ mesh; repeatable
    --no-auto-rotate         Start with auto-rotation off
    --auto-switch            Cycle palettes (and shapes) automatically
    --switch-interval=MS     Auto-switch period in milliseconds (default: 3000)
    --paused                 Start paused
    --still-fire             Start with a constant (non-flickering) fire bottom
    --gpu                    Try the GPU convolution back-end
    --no-simd                Disable the SIMD convolution back-end
    --wireframe, -w          Start in wireframe-only mode
    --log-file=PATH          Write logs to PATH (RUST_LOG sets the filter)
    --list                   Print palette and shape names and exit
    --help, -h               Show this help message
    --version, -V            Show version

KEYBINDINGS:
    Left / Right        Previous / next shape
    Up / Down           Next / previous palette
    + / -               Grow / shrink shape
    * /                 Push shape away / pull closer
    PageUp / PageDown   More / less cooling
    c                   Toggle still shape
    b                   Toggle still fire bottom
    r                   Toggle auto-rotate
    a                   Toggle auto-switch
    w                   Toggle fire / wireframe
    Space               Pause
    q / Esc / Ctrl+C    Quit
    Mouse drag          Rotate shape; wheel changes palette; clicks change shape

ENVIRONMENT VARIABLES:
    FIREFRAME_WIDTH, FIREFRAME_HEIGHT, FIREFRAME_PALETTE, FIREFRAME_SHAPE,
    FIREFRAME_COOLING, FIREFRAME_MESH (path list), FIREFRAME_AUTO_ROTATE,
    FIREFRAME_AUTO_SWITCH, FIREFRAME_SWITCH_INTERVAL, FIREFRAME_PAUSED,
    FIREFRAME_STILL_FIRE, FIREFRAME_GPU, FIREFRAME_SIMD, FIREFRAME_WIREFRAME,
    FIREFRAME_LOG_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    UnknownFlag(String),
    MissingValue(&'static str),
    BadValue { flag: &'static str, value: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlag(flag) => write!(f, "unknown argument: {flag}"),
            Self::MissingValue(flag) => write!(f, "missing value for {flag}"),
            Self::BadValue { flag, value } => write!(f, "invalid {flag} value: {value}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Parsed options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opts {
    pub scene: SceneConfig,
    /// Explicit simulation size; otherwise the terminal decides.
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub log_file: Option<PathBuf>,
}

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Opts),
    List(Opts),
    Help,
    Version,
}

fn truthy(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn number<T: std::str::FromStr>(flag: &'static str, value: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::BadValue {
        flag,
        value: value.to_owned(),
    })
}

fn cooling(flag: &'static str, value: &str) -> Result<i32, CliError> {
    let n: i32 = number(flag, value)?;
    if n < 0 {
        return Err(CliError::BadValue {
            flag,
            value: value.to_owned(),
        });
    }
    Ok(n)
}

impl Opts {
    /// Apply `FIREFRAME_*` overrides. Unparsable values are ignored.
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        let flag = |name: &str| lookup(name).as_deref().and_then(truthy);
        if let Some(n) = lookup("FIREFRAME_WIDTH").and_then(|v| v.trim().parse().ok()) {
            self.width = Some(n);
        }
        if let Some(n) = lookup("FIREFRAME_HEIGHT").and_then(|v| v.trim().parse().ok()) {
            self.height = Some(n);
        }
        if let Some(v) = lookup("FIREFRAME_PALETTE") {
            self.scene.palette = v;
        }
        if let Some(v) = lookup("FIREFRAME_SHAPE") {
            self.scene.shape = v;
        }
        if let Some(n) = lookup("FIREFRAME_COOLING").and_then(|v| v.trim().parse::<i32>().ok())
            && n >= 0
        {
            self.scene.cooling = n;
        }
        if let Some(v) = lookup("FIREFRAME_MESH") {
            self.scene
                .mesh_files
                .extend(std::env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(b) = flag("FIREFRAME_AUTO_ROTATE") {
            self.scene.auto_rotate = b;
        }
        if let Some(b) = flag("FIREFRAME_AUTO_SWITCH") {
            self.scene.auto_switch = b;
        }
        if let Some(ms) = lookup("FIREFRAME_SWITCH_INTERVAL").and_then(|v| v.trim().parse().ok()) {
            self.scene.switch_interval = Duration::from_millis(ms);
        }
        if let Some(b) = flag("FIREFRAME_PAUSED") {
            self.scene.paused = b;
        }
        if let Some(b) = flag("FIREFRAME_STILL_FIRE") {
            self.scene.still_fire = b;
        }
        if let Some(b) = flag("FIREFRAME_GPU") {
            self.scene.gpu = b;
        }
        if let Some(b) = flag("FIREFRAME_SIMD") {
            self.scene.simd = b;
        }
        if let Some(b) = flag("FIREFRAME_WIREFRAME") {
            self.scene.wireframe = b;
        }
        if let Some(v) = lookup("FIREFRAME_LOG_FILE") {
            self.log_file = Some(PathBuf::from(v));
        }
    }

    /// Parse the process arguments and environment.
    pub fn parse() -> Result<Action, CliError> {
        Self::parse_from(std::env::args().skip(1), |name| std::env::var(name).ok())
    }

    /// Parse `args` (without the program name) with `lookup` as the
    /// environment.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Action, CliError> {
        let mut opts = Self::default();
        opts.apply_env(&lookup);

        let mut list = false;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((n, v)) if n.starts_with("--") => (n.to_owned(), Some(v.to_owned())),
                _ => (arg.clone(), None),
            };
            let mut value = |flag: &'static str| -> Result<String, CliError> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => args.next().ok_or(CliError::MissingValue(flag)),
                }
            };
            match name.as_str() {
                "--help" | "-h" => return Ok(Action::Help),
                "--version" | "-V" => return Ok(Action::Version),
                "--list" => list = true,
                "--width" | "-W" => opts.width = Some(number("--width", &value("--width")?)?),
                "--height" | "-H" => opts.height = Some(number("--height", &value("--height")?)?),
                "--palette" | "-p" => opts.scene.palette = value("--palette")?,
                "--shape" | "-s" => opts.scene.shape = value("--shape")?,
                "--cooling" | "-c" => opts.scene.cooling = cooling("--cooling", &value("--cooling")?)?,
                "--mesh" | "-m" => opts.scene.mesh_files.push(PathBuf::from(value("--mesh")?)),
                "--no-auto-rotate" => opts.scene.auto_rotate = false,
                "--auto-switch" => opts.scene.auto_switch = true,
                "--switch-interval" => {
                    let ms: u64 = number("--switch-interval", &value("--switch-interval")?)?;
                    opts.scene.switch_interval = Duration::from_millis(ms);
                }
                "--paused" => opts.scene.paused = true,
                "--still-fire" => opts.scene.still_fire = true,
                "--gpu" => opts.scene.gpu = true,
                "--no-simd" => opts.scene.simd = false,
                "--wireframe" | "-w" => opts.scene.wireframe = true,
                "--log-file" => opts.log_file = Some(PathBuf::from(value("--log-file")?)),
                _ => return Err(CliError::UnknownFlag(arg)),
            }
        }

        Ok(if list {
            Action::List(opts)
        } else {
            Action::Run(opts)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Action, CliError> {
        Opts::parse_from(args.iter().map(|s| s.to_string()), |_| None)
    }

    fn run(args: &[&str]) -> Opts {
        match parse(args) {
            Ok(Action::Run(opts)) => opts,
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let opts = run(&[]);
        assert_eq!(opts.scene, SceneConfig::default());
        assert_eq!(opts.width, None);
        assert_eq!(opts.log_file, None);
    }

    #[test]
    fn both_value_forms() {
        let opts = run(&["--palette=matrix", "-s", "torus", "--cooling", "20", "-W", "300"]);
        assert_eq!(opts.scene.palette, "matrix");
        assert_eq!(opts.scene.shape, "torus");
        assert_eq!(opts.scene.cooling, 20);
        assert_eq!(opts.width, Some(300));
    }

    #[test]
    fn repeatable_mesh_and_switches() {
        let opts = run(&[
            "-m", "a.obj", "--mesh=b.obj", "--no-auto-rotate", "--auto-switch",
            "--switch-interval=500", "--paused", "--still-fire", "--gpu", "--no-simd", "-w",
        ]);
        assert_eq!(opts.scene.mesh_files, vec![PathBuf::from("a.obj"), PathBuf::from("b.obj")]);
        assert!(!opts.scene.auto_rotate && opts.scene.auto_switch);
        assert_eq!(opts.scene.switch_interval, Duration::from_millis(500));
        assert!(opts.scene.paused && opts.scene.still_fire && opts.scene.gpu);
        assert!(!opts.scene.simd && opts.scene.wireframe);
    }

    #[test]
    fn errors() {
        assert_eq!(parse(&["--bogus"]), Err(CliError::UnknownFlag("--bogus".into())));
        assert_eq!(parse(&["--shape"]), Err(CliError::MissingValue("--shape")));
        assert!(matches!(parse(&["--cooling=-1"]), Err(CliError::BadValue { .. })));
        assert!(matches!(parse(&["--width=wide"]), Err(CliError::BadValue { .. })));
    }

    #[test]
    fn help_version_list() {
        assert_eq!(parse(&["-h"]), Ok(Action::Help));
        assert_eq!(parse(&["--version"]), Ok(Action::Version));
        assert!(matches!(parse(&["--list"]), Ok(Action::List(_))));
    }

    #[test]
    fn env_overrides_lose_to_flags() {
        let env = |name: &str| match name {
            "FIREFRAME_PALETTE" => Some("evil".to_string()),
            "FIREFRAME_SHAPE" => Some("star".to_string()),
            "FIREFRAME_AUTO_ROTATE" => Some("off".to_string()),
            "FIREFRAME_COOLING" => Some("-3".to_string()),
            _ => None,
        };
        let Ok(Action::Run(opts)) = Opts::parse_from(["--shape=helix".to_string()], env) else {
            panic!("expected Run");
        };
        assert_eq!(opts.scene.palette, "evil");
        assert_eq!(opts.scene.shape, "helix");
        assert!(!opts.scene.auto_rotate);
        assert_eq!(opts.scene.cooling, 12, "negative env cooling is ignored");
    }

    #[test]
    fn help_text_mentions_every_flag() {
        for flag in ["--palette", "--mesh", "--switch-interval", "--log-file", "--list"] {
            assert!(HELP_TEXT.contains(flag), "{flag} missing from help");
        }
    }
}
