//! Interactive prompt loop for exploring trip data.

use anyhow::Result;
use bikeshare_stats::catalog::resolve_choice;
use bikeshare_stats::engine::TripStatsEngine;
use bikeshare_stats::filter::{FilterSpec, HourRange, month_options, weekday_options};
use bikeshare_stats::model::TripDataset;
use bikeshare_stats::output::{render_text, title_case};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// Reads answers from `input` and writes prompts to `output`.
/// Every question returns `None` once input is exhausted.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Lists `options` numbered from 1 and asks until one is picked by name
    /// or number.
    pub fn choose<'a>(&mut self, title: &str, options: &[&'a str], prompt: &str) -> Result<Option<&'a str>> {
        self.say(&format!("\n{}:", title))?;
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, title_case(option)))?;
        }
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            if let Some(choice) = resolve_choice(&answer, options) {
                return Ok(Some(choice));
            }
            self.say(&format!(
                "Invalid input. Choose 1-{} or one of: {}",
                options.len(),
                options.join(", ")
            ))?;
        }
    }

    /// Asks for an hour range such as `7-19`; a blank answer means all hours.
    pub fn hour_range(&mut self) -> Result<Option<Option<HourRange>>> {
        loop {
            let Some(answer) = self.ask("Enter hour range, e.g. 7-19 (blank for all hours): ")? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(None));
            }
            match HourRange::parse(&answer) {
                Ok(range) => return Ok(Some(Some(range))),
                Err(e) => self.say(&format!("{}", e))?,
            }
        }
    }

    pub fn confirm(&mut self, question: &str) -> Result<Option<bool>> {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(None);
            };
            match answer.to_lowercase().as_str() {
                "yes" | "y" => return Ok(Some(true)),
                "no" | "n" => return Ok(Some(false)),
                _ => self.say("Please enter 'yes' or 'no'")?,
            }
        }
    }

    /// Collects one full filter selection.
    fn select_filters(&mut self, cities: &[&str]) -> Result<Option<FilterSpec>> {
        let Some(city) = self.choose("Available cities", cities, "Enter city name or number: ")? else {
            return Ok(None);
        };
        let months = month_options();
        let Some(month) = self.choose(
            "Available months",
            &months,
            "Enter month name/number (or 'all' for no filter): ",
        )?
        else {
            return Ok(None);
        };
        let days = weekday_options();
        let Some(day) = self.choose(
            "Available days",
            &days,
            "Enter day name/number (or 'all' for no filter): ",
        )?
        else {
            return Ok(None);
        };
        let Some(hours) = self.hour_range()? else {
            return Ok(None);
        };

        let mut spec = FilterSpec::new(city, month, day)?;
        if let Some(range) = hours {
            spec = spec.with_hour_range(range);
        }
        Ok(Some(spec))
    }
}

/// Runs select → report → "again?" until the user stops or input ends.
/// Loaded cities are kept for the rest of the session.
pub fn run_explorer<R: BufRead, W: Write>(
    engine: &TripStatsEngine,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let mut cache: HashMap<String, TripDataset> = HashMap::new();
    let cities: Vec<String> = engine.catalog().names().into_iter().map(String::from).collect();
    let city_refs: Vec<&str> = cities.iter().map(String::as_str).collect();

    prompter.say("Welcome to the bikeshare data explorer!")?;

    loop {
        let Some(spec) = prompter.select_filters(&city_refs)? else {
            break;
        };
        prompter.say(&format!(
            "\nSelected filters: {}, {}, {}",
            title_case(spec.city()),
            spec.month(),
            spec.weekday()
        ))?;

        let dataset = match cache.entry(spec.city().to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => match engine.load(spec.city()) {
                Ok(ds) => e.insert(ds),
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "Could not load city");
                    prompter.say(&format!("{}. Please choose again.", err))?;
                    continue;
                }
                Err(err) => return Err(err.into()),
            },
        };

        let report = engine.analyze(dataset, &spec);
        info!(matched = report.matched_records, "Report ready");
        prompter.say(&render_text(&report))?;

        match prompter.confirm("\nWould you like to analyze different data? (yes/no): ")? {
            Some(true) => continue,
            _ => break,
        }
    }

    prompter.say("\nThank you for using the bikeshare analyzer!")
}
