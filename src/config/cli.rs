use crate::config::{FileConfig, Settings};
use crate::domain::model::{ActivityType, Gender, Query};
use crate::utils::error::{ErrorKind, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fengshui")]
#[command(about = "Command-line client for the bazi and feng shui analysis service")]
pub struct CliConfig {
    /// Base URL of the analysis service
    #[arg(long, env = "FENGSHUI_API_URL", global = true)]
    pub base_url: Option<String>,

    /// Deadline for each remote call, in seconds
    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the service is reachable
    Health,
    /// Run the two-phase analysis, printing each stage as it arrives
    Analyze(QueryArgs),
    /// Run both phases in a single request
    LegacyAnalyze(QueryArgs),
    /// Feng shui advice for a compass direction (北, 东南, north, ...)
    Direction { direction: String },
    /// Fortune for a day, optionally personalised with a birth chart
    Daily {
        /// Day to look up (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        birth: BirthArgs,
    },
    /// Auspicious days in a date range
    Auspicious {
        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long, value_enum, default_value_t = ActivityType::General)]
        activity: ActivityType,
    },
    /// Two-phase analysis followed by feng shui advice on the resulting chart
    Consult(QueryArgs),
    /// Full report: chart, interpretation, daily info and advice
    Complete(QueryArgs),
}

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: u32,

    #[arg(long)]
    pub day: u32,

    #[arg(long)]
    pub hour: u32,

    #[arg(long, value_enum)]
    pub gender: Gender,

    #[arg(long)]
    pub location: String,
}

impl From<QueryArgs> for Query {
    fn from(args: QueryArgs) -> Self {
        Query {
            name: args.name,
            year: args.year,
            month: args.month,
            day: args.day,
            hour: args.hour,
            gender: args.gender,
            location: args.location,
        }
    }
}

/// Birth data that may be omitted entirely, but not in part.
#[derive(Debug, Clone, Default, Args)]
pub struct BirthArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub month: Option<u32>,

    #[arg(long)]
    pub day: Option<u32>,

    #[arg(long)]
    pub hour: Option<u32>,

    #[arg(long, value_enum)]
    pub gender: Option<Gender>,

    #[arg(long)]
    pub location: Option<String>,
}

impl BirthArgs {
    pub fn into_query(self) -> Result<Option<Query>> {
        match self {
            BirthArgs {
                name: None,
                year: None,
                month: None,
                day: None,
                hour: None,
                gender: None,
                location: None,
            } => Ok(None),
            BirthArgs {
                name: Some(name),
                year: Some(year),
                month: Some(month),
                day: Some(day),
                hour: Some(hour),
                gender: Some(gender),
                location: Some(location),
            } => Ok(Some(Query {
                name,
                year,
                month,
                day,
                hour,
                gender,
                location,
            })),
            _ => Err(ErrorKind::validation(
                "birth",
                "partial",
                "Provide all of --name, --year, --month, --day, --hour, --gender, --location or none",
            )),
        }
    }
}

impl CliConfig {
    pub fn settings(&self) -> Result<Settings> {
        let file = self
            .config
            .as_ref()
            .map(FileConfig::from_file)
            .transpose()?;

        Settings::resolve(
            file.as_ref(),
            self.base_url.as_deref(),
            self.timeout_seconds,
        )
    }
}
