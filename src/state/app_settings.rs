use clap::Parser;
use log::LevelFilter;
use std::time::Duration;
use trufan_api::client::DEFAULT_BASE_URL;

/// Command line, with every option also readable from the environment.
#[derive(Debug, Parser)]
#[command(name = "trufan", version, about = "TruFan prediction leagues in your terminal")]
pub struct Cli {
    /// Base URL of the League API
    #[arg(long, env = "TRUFAN_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// User id to sign in as
    #[arg(short, long, env = "TRUFAN_USER")]
    pub user: String,

    /// Bearer token sent with every request
    #[arg(long, env = "TRUFAN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Tournament of the league to open on start
    #[arg(short, long, env = "TRUFAN_TOURNAMENT", requires = "league")]
    pub tournament: Option<String>,

    /// League to open on start
    #[arg(short, long, env = "TRUFAN_LEAGUE", requires = "tournament")]
    pub league: Option<String>,

    /// Enable the schedule editor
    #[arg(long, env = "TRUFAN_ADMIN")]
    pub admin: bool,

    /// off, error, warn, info, debug or trace
    #[arg(long = "log", env = "TRUFAN_LOG", default_value = "info", value_parser = parse_level)]
    pub log_level: LevelFilter,

    /// Seconds between schedule refreshes
    #[arg(long, env = "TRUFAN_REFRESH_SECS", default_value_t = 120, value_parser = clap::value_parser!(u64).range(5..))]
    pub refresh_secs: u64,

    /// Hide the tab bar
    #[arg(long)]
    pub full_screen: bool,
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse()
        .map_err(|_| format!("unknown log level `{raw}`"))
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub user: String,
    pub token: Option<String>,
    /// `(tournament, league)` to open once leagues are loaded.
    pub start_league: Option<(String, String)>,
    pub admin: bool,
    pub full_screen: bool,
    pub log_level: LevelFilter,
    pub refresh_interval: Duration,
    pub clock_interval: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            user: String::new(),
            token: None,
            start_league: None,
            admin: false,
            full_screen: false,
            log_level: LevelFilter::Info,
            refresh_interval: Duration::from_secs(120),
            clock_interval: Duration::from_secs(60),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from(Cli::parse())
    }
}

impl From<Cli> for AppSettings {
    fn from(cli: Cli) -> Self {
        Self {
            api_url: cli.api_url,
            user: cli.user,
            token: cli.token.filter(|t| !t.trim().is_empty()),
            start_league: cli.tournament.zip(cli.league),
            admin: cli.admin,
            full_screen: cli.full_screen,
            log_level: cli.log_level,
            refresh_interval: Duration::from_secs(cli.refresh_secs),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<AppSettings, clap::Error> {
        Cli::try_parse_from(std::iter::once("trufan").chain(args.iter().copied())).map(AppSettings::from)
    }

    #[test]
    fn defaults() {
        let settings = parse(&["--user", "fan"]).unwrap();
        assert_eq!(settings.user, "fan");
        assert_eq!(settings.api_url, DEFAULT_BASE_URL);
        assert_eq!(settings.refresh_interval, Duration::from_secs(120));
        assert_eq!(settings.log_level, LevelFilter::Info);
        assert!(settings.start_league.is_none());
        assert!(!settings.admin);
    }

    #[test]
    fn start_league_needs_both_halves() {
        assert!(parse(&["-u", "fan", "--league", "office"]).is_err());
        let settings = parse(&["-u", "fan", "-t", "IPL", "-l", "office", "--log", "debug"]).unwrap();
        assert_eq!(settings.start_league, Some(("IPL".into(), "office".into())));
        assert_eq!(settings.log_level, LevelFilter::Debug);
    }

    #[test]
    fn blank_token_is_dropped() {
        let settings = parse(&["-u", "fan", "--token", "  "]).unwrap();
        assert!(settings.token.is_none());
    }

    #[test]
    fn refresh_has_a_floor() {
        assert!(parse(&["-u", "fan", "--refresh-secs", "1"]).is_err());
        let settings = parse(&["-u", "fan", "--refresh-secs", "30"]).unwrap();
        assert_eq!(settings.refresh_interval, Duration::from_secs(30));
    }
}
