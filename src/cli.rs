//! Command-line interface
//!
//! The toggles keep the short names earlier releases documented and accept
//! `-`, `--` or `/` as prefix in any case (`-nf`, `/NFL`, `--se`). Tokens
//! are rewritten to clap long options before parsing.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Toggle names accepted with any prefix
const TOGGLES: &[&str] = &["nf", "nfl", "nfs", "se", "fm", "no", "sm", "ni"];

/// Sound Menu - route application audio to output devices from the tray
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None, args_override_self = true)]
pub struct Args {
    /// Disables favorites entirely (implies --nfl --nfs --se --fm)
    #[arg(long = "nf")]
    pub no_favorites: bool,

    /// Disables favorites file loading
    #[arg(long = "nfl")]
    pub no_favorites_load: bool,

    /// Disables favorites file saving
    #[arg(long = "nfs")]
    pub no_favorites_save: bool,

    /// Double-click closes the application instead of switching mode
    #[arg(long = "se")]
    pub switch_exits: bool,

    /// Starts in full mode
    #[arg(long = "fm")]
    pub full_mode: bool,

    /// Hides 'Sound Settings' and 'SoundVolumeView'
    #[arg(long = "no")]
    pub no_options: bool,

    /// Lists devices directly under each app and hides 'Mute'
    #[arg(long = "sm")]
    pub simple_menu: bool,

    /// Hides process ids and device sub-names
    #[arg(long = "ni")]
    pub no_info: bool,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Parse process arguments, accepting the legacy prefixes
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize(std::env::args_os()))
    }
}

/// Rewrite legacy toggle spellings into clap long options.
///
/// The first item is the program name and passes through untouched, as do
/// tokens that are not toggles (option values, unknown arguments).
pub fn normalize<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = args.next().into_iter().collect();

    for arg in args {
        let rewritten = arg.to_str().and_then(|s| {
            let name = s
                .strip_prefix("--")
                .or_else(|| s.strip_prefix('-'))
                .or_else(|| s.strip_prefix('/'))?
                .to_ascii_lowercase();
            if TOGGLES.contains(&name.as_str()) {
                Some(format!("--{name}"))
            } else if name == "?" || name == "help" {
                Some("--help".to_string())
            } else {
                None
            }
        });
        out.push(rewritten.map(OsString::from).unwrap_or(arg));
    }

    out
}

/// Resolved switches the engine and tray consume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub favorites_enabled: bool,
    pub load_favorites: bool,
    pub save_favorites: bool,
    /// Double-click toggles compact/full mode; otherwise it exits
    pub double_click_switch: bool,
    pub start_full: bool,
    /// Show the settings and tool launchers
    pub include_options: bool,
    pub simple_menu: bool,
    pub info_suppressed: bool,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        let nf = args.no_favorites;
        Self {
            favorites_enabled: !nf,
            load_favorites: !(nf || args.no_favorites_load),
            save_favorites: !(nf || args.no_favorites_save),
            double_click_switch: !(nf || args.switch_exits),
            start_full: nf || args.full_mode,
            include_options: !args.no_options,
            simple_menu: args.simple_menu,
            info_suppressed: args.no_info,
        }
    }

    /// Edit mode needs favorites
    pub fn edit_mode_allowed(&self) -> bool {
        self.favorites_enabled
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_args(&Args::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        let mut full = vec!["sound-menu"];
        full.extend_from_slice(args);
        Args::try_parse_from(normalize(full))
    }

    #[test]
    fn test_normalize_prefixes_and_case() {
        let out = normalize(["prog", "-nf", "/NFL", "--Se", "-?", "/help"]);
        let out: Vec<_> = out.iter().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(out, vec!["prog", "--nf", "--nfl", "--se", "--help", "--help"]);
    }

    #[test]
    fn test_normalize_leaves_values_alone() {
        let out = normalize(["prog", "--config", "/etc/sound-menu.yaml", "-l", "debug"]);
        let out: Vec<_> = out.iter().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(out, vec!["prog", "--config", "/etc/sound-menu.yaml", "-l", "debug"]);
    }

    #[test]
    fn test_repeated_toggles_accepted() {
        let args = parse(&["-nf", "/NF", "--nf"]).unwrap();
        assert!(args.no_favorites);

        let args = parse(&["-se", "/SE", "-sm", "--Sm", "/ni", "-NI"]).unwrap();
        assert!(args.switch_exits);
        assert!(args.simple_menu);
        assert!(args.no_info);
        assert!(!args.no_favorites);
    }

    #[test]
    fn test_parse_toggles() {
        let args = parse(&["-nfl", "/nfs", "--fm", "-NO"]).unwrap();
        assert!(args.no_favorites_load);
        assert!(args.no_favorites_save);
        assert!(args.full_mode);
        assert!(args.no_options);
        assert!(!args.no_favorites);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(parse(&["-xyz"]).is_err());
        assert!(parse(&["nf"]).is_err());
    }

    #[test]
    fn test_help_is_reported() {
        let err = parse(&["/?"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.favorites_enabled);
        assert!(settings.load_favorites);
        assert!(settings.save_favorites);
        assert!(settings.double_click_switch);
        assert!(!settings.start_full);
        assert!(settings.include_options);
        assert!(!settings.simple_menu);
        assert!(!settings.info_suppressed);
    }

    #[test]
    fn test_no_favorites_implies_the_rest() {
        let settings = Settings::from_args(&parse(&["-nf"]).unwrap());
        assert!(!settings.favorites_enabled);
        assert!(!settings.load_favorites);
        assert!(!settings.save_favorites);
        assert!(!settings.double_click_switch);
        assert!(settings.start_full);
        assert!(!settings.edit_mode_allowed());
    }

    #[test]
    fn test_display_toggles() {
        let settings = Settings::from_args(&parse(&["-sm", "-ni", "-se"]).unwrap());
        assert!(settings.simple_menu);
        assert!(settings.info_suppressed);
        assert!(!settings.double_click_switch);
        assert!(settings.favorites_enabled);
    }
}
