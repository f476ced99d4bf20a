use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;
use tomatick_core::{AppConfig, DailyStat, WallClock, SystemWallClock};

use crate::session::Session;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// Every recorded day, newest first, with totals
    All,
    /// Totals for one date
    Day {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },
}

#[derive(Serialize)]
struct DayRow {
    date: NaiveDate,
    #[serde(flatten)]
    stat: DailyStat,
}

#[derive(Serialize)]
struct AllStats {
    days: Vec<DayRow>,
    totals: DailyStat,
}

pub fn run(action: StatsAction, app_config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(app_config)?;
    let ledger = session.engine.ledger();

    let day_row = |date: NaiveDate| DayRow {
        date,
        stat: ledger.get(date).copied().unwrap_or_default(),
    };

    match action {
        StatsAction::Today => {
            let row = day_row(SystemWallClock.today());
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        StatsAction::Day { date } => {
            println!("{}", serde_json::to_string_pretty(&day_row(date))?);
        }
        StatsAction::All => {
            let all = AllStats {
                days: ledger
                    .entries_desc()
                    .map(|(date, stat)| DayRow { date, stat })
                    .collect(),
                totals: ledger.totals(),
            };
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }

    session.close();
    Ok(())
}
