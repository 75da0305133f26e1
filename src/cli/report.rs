//! Report CLI command

use clap::Args;

use crate::error::{LedgerError, LedgerResult};
use crate::models::period::PeriodError;
use crate::models::{DateRange, ReportPeriod};
use crate::reports::{CancellationToken, ReportAggregator, ReportRequest, ReportType};
use crate::services::LedgerContext;

use super::parse_date;

#[derive(Args)]
pub struct ReportArgs {
    /// week, month, quarter, year or custom
    #[arg(short, long, default_value = "month")]
    pub period: String,

    /// all, financial, goals, plans or tasks
    #[arg(short = 't', long = "type", default_value = "all")]
    pub report_type: String,

    /// Custom period start (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Custom period end (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Print the report document as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    fn request(&self) -> LedgerResult<ReportRequest> {
        let period: ReportPeriod = self
            .period
            .parse()
            .map_err(|e: PeriodError| LedgerError::Validation(e.to_string()))?;
        let report_type: ReportType = self.report_type.parse()?;

        let custom_range = match (&self.from, &self.to) {
            (Some(from), Some(to)) => Some(
                DateRange::new(parse_date(from)?, parse_date(to)?)
                    .map_err(|e| LedgerError::InvalidDate(e.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(LedgerError::InvalidDate(
                    "A custom period needs both --from and --to".into(),
                ))
            }
        };

        // Giving a range implies a custom period
        let period = if custom_range.is_some() {
            ReportPeriod::Custom
        } else {
            period
        };

        Ok(ReportRequest {
            period,
            report_type,
            custom_range,
        })
    }
}

/// Handle the report command
pub fn handle_report_command(ctx: &LedgerContext, args: ReportArgs) -> LedgerResult<()> {
    let request = args.request()?;
    let report = ReportAggregator::new(ctx).generate(&request, &CancellationToken::new())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.format_terminal(&ctx.settings.currency_symbol));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(period: &str, from: Option<&str>, to: Option<&str>) -> ReportArgs {
        ReportArgs {
            period: period.to_string(),
            report_type: "financial".to_string(),
            from: from.map(String::from),
            to: to.map(String::from),
            json: false,
        }
    }

    #[test]
    fn test_request_from_args() {
        let request = args("quarter", None, None).request().unwrap();
        assert_eq!(request.period, ReportPeriod::Quarter);
        assert_eq!(request.report_type, ReportType::Financial);

        let request = args("month", Some("2024-01-01"), Some("2024-01-31"))
            .request()
            .unwrap();
        assert_eq!(request.period, ReportPeriod::Custom);
        assert!(request.custom_range.is_some());

        assert!(args("month", Some("2024-01-01"), None).request().is_err());
        assert!(args("fortnight", None, None).request().unwrap_err().is_validation());
    }
}
