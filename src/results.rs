/*!
Control the appearance of simulation result data

# Working with [`ResultsBuilder`]

## Examples

Creating a [`ResultsTable`] after running a simulation group:

```
use quantum_sim::prelude::*;

let sim = SimulationBuilder::new()
    .add_attacker(AttackerProfile::quantum_pirate())
    .add_attacker(AttackerProfile::crypto_thief())
    .standard_scenarios()
    .trials(20)
    .build()
    .unwrap();

let results = sim
    .run_all()
    .average(Average::Median) // Take the median of the trials' tallies
    .strategy()               // Include each attacker's strategy
    .trials()                 // Include the number of trials run
    .format(Format::CSV)      // Output results as CSV
    .build();

println!("{}", results);
```
*/

use std::{collections::BTreeSet, fmt::Display, num::NonZeroUsize};

use crate::{
    attacker::AttackerId,
    simulation::{SimulationOutput, Tally, TrialLog},
    utils,
};

/// Floating point precision of results data.
pub const FLOAT_PRECISION_DIGITS: usize = 4;

/// Builder for [`ResultsTable`]. Produced by running a
/// [`SimulationGroup`](crate::simulation::SimulationGroup).
#[derive(Debug, Clone)]
pub struct ResultsBuilder {
    average: Average,
    columns: BTreeSet<Column>,
    data: SimulationOutput,
    format: Format,
    repeated: NonZeroUsize,
}

/// Describes the appearance of a [`ResultsTable`] table as given by its
/// [`Display`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated, without extra whitespace.
    CSV,
    /// Human-readable.
    #[default]
    PrettyPrint,
}

impl ResultsBuilder {
    /// Create a new [`ResultsBuilder`].
    pub(crate) fn new(data: SimulationOutput, repeated: NonZeroUsize) -> Self {
        Self {
            data,
            repeated,
            average: Average::default(),
            columns: BTreeSet::default(),
            format: Format::default(),
        }
    }

    /// Include every optional column.
    ///
    /// [`ResultsBuilder::average`] must still be called separately
    /// to create averaged data.
    pub fn all(self) -> Self {
        self.strategy()
            .qubits()
            .capability()
            .success_rate()
            .skipped()
            .observed_success_rate()
            .trials()
    }

    /// Average the tallies of repeated trials based on the given [`Average`]
    /// type. For types other than [`Average::None`], a column describing the
    /// averaging method will be included in the results table.
    pub fn average(mut self, average: Average) -> Self {
        self.average = average;

        self
    }

    /// Include the "Strategy" column in the results table.
    pub fn strategy(mut self) -> Self {
        self.columns.insert(Column::Strategy);

        self
    }

    /// Include the "Qubits" column in the results table.
    pub fn qubits(mut self) -> Self {
        self.columns.insert(Column::Qubits);

        self
    }

    /// Include the "Breaks secp256k1" column in the results table.
    pub fn capability(mut self) -> Self {
        self.columns.insert(Column::BreaksSecp256k1);

        self
    }

    /// Include the configured "Success Rate" column in the results table.
    pub fn success_rate(mut self) -> Self {
        self.columns.insert(Column::SuccessRate);

        self
    }

    /// Include the "Skipped" column in the results table.
    pub fn skipped(mut self) -> Self {
        self.columns.insert(Column::Skipped);

        self
    }

    /// Include the "Observed Success" column, the fraction of attempts which
    /// ended in theft.
    pub fn observed_success_rate(mut self) -> Self {
        self.columns.insert(Column::ObservedSuccessRate);

        self
    }

    /// Include the "Trials" column in the results table.
    pub fn trials(mut self) -> Self {
        self.columns.insert(Column::Trials);

        self
    }

    /// Specify the [`Format`] of the results table.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;

        self
    }

    /// Borrow the raw [`SimulationOutput`] without consuming the builder.
    pub fn output(&self) -> &SimulationOutput {
        &self.data
    }

    /// Extract the raw [`SimulationOutput`] data from this [`ResultsBuilder`].
    /// Useful for running custom statistical analysis.
    pub fn data(self) -> SimulationOutput {
        self.data
    }

    /// Create new [`ResultsTable`].
    pub fn build(self) -> ResultsTable {
        let ResultsBuilder { average, mut columns, data, format, repeated } =
            self;

        columns.extend([
            Column::Attacker,
            Column::Won,
            Column::Failed,
            Column::Stolen,
        ]);

        match average {
            Average::None => {
                columns.insert(Column::Trial);
            }
            _ => {
                columns.insert(Column::AverageOf(average));
            }
        }

        let columns = Vec::from_iter(columns);
        let attackers = (1..=data.attackers.len()).map(AttackerId::from);

        let rows: Vec<Vec<ColumnValue>> = match average {
            Average::None => {
                let mut rows = vec![];
                for trial in data.trials.iter() {
                    for attacker in attackers.clone() {
                        rows.push(
                            columns
                                .iter()
                                .map(|col| col.get_value(&data, trial, attacker))
                                .collect(),
                        );
                    }
                }

                rows
            }
            _ => attackers
                .map(|attacker| {
                    columns
                        .iter()
                        .map(|col| {
                            col.get_average_value(
                                average, &data, attacker, repeated,
                            )
                        })
                        .collect()
                })
                .collect(),
        };

        ResultsTable { columns, format, rows }
    }
}

/// Formatted attacker results from the completion of a
/// [`SimulationGroup`](crate::simulation::SimulationGroup). The results table
/// is given by the struct's [`Display`] implementation, as specified by
/// its [`Format`].
pub struct ResultsTable {
    columns: Vec<Column>,
    format: Format,
    rows: Vec<Vec<ColumnValue>>,
}

impl ResultsTable {
    const SEPARATOR_VERTICAL: char = '|';
    const SEPARATOR_HORIZONTAL: char = '-';

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Column titles in display order.
    pub fn titles(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.to_string()).collect()
    }
}

impl Display for ResultsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let titles = self.titles();

        match self.format {
            Format::CSV => {
                write!(f, "{}", titles.join(","))?;

                for row in self.rows.iter() {
                    writeln!(f)?;

                    let row: Vec<_> =
                        row.iter().map(|val| val.to_string()).collect();

                    write!(f, "{}", row.join(","))?;
                }
            }
            Format::PrettyPrint => {
                let mut text_widths: Vec<_> =
                    titles.iter().map(|title| title.len()).collect();

                for row in self.rows.iter() {
                    for (i, val) in row.iter().enumerate() {
                        let val = val.to_string();
                        text_widths[i] = text_widths[i].max(val.len());
                    }
                }

                for (i, title) in titles.into_iter().enumerate() {
                    write!(
                        f,
                        " {:1$} {2}",
                        title,
                        text_widths[i],
                        Self::SEPARATOR_VERTICAL
                    )?;
                }
                writeln!(f)?;

                let total_width = text_widths.iter().map(|x| x + 3).sum();
                for _ in 0..total_width {
                    write!(f, "{}", Self::SEPARATOR_HORIZONTAL)?;
                }

                for row in self.rows.iter() {
                    writeln!(f)?;

                    for (i, val) in row.iter().enumerate() {
                        write!(
                            f,
                            " {:1$} {2}",
                            val.to_string(),
                            text_widths[i],
                            Self::SEPARATOR_VERTICAL
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Methods of extracting an average/central value from a set of repeated
/// trials.
///
/// In the process of creating a results table, the given averaging method is
/// only applied to the values of columns which change between trials.
#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Average {
    /// Include all repeated values.
    None,
    /// Arithmetic mean of all values.
    #[default]
    Mean,
    /// Median of all values.
    Median,
    /// Maximum of all values.
    Max,
    /// Minimum of all values.
    Min,
}

impl Average {
    fn apply(&self, values: Vec<f64>) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        match self {
            Self::Mean => Some(utils::mean_of_floats(&values)),
            Self::Median => Some(utils::median_of_floats(values)),
            Self::Max => values.into_iter().reduce(f64::max),
            Self::Min => values.into_iter().reduce(f64::min),
            Self::None => unreachable!("values are never averaged with None"),
        }
    }
}

/// Type of column that can appear in a data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Column {
    // Variant order determines the order of columns in results tables:
    // https://doc.rust-lang.org/stable/std/cmp/trait.PartialOrd.html#derivable
    Trial,
    Attacker,
    Strategy,
    Qubits,
    BreaksSecp256k1,
    SuccessRate,
    Won,
    Failed,
    Skipped,
    Stolen,
    ObservedSuccessRate,
    AverageOf(Average),
    Trials,
}

/// Value which corresponds to a [`Column`].
#[derive(Debug, Clone)]
enum ColumnValue {
    Text(String),
    Int(usize),
    Float(f64),
    Flag(bool),
    Missing,
}

impl From<Option<f64>> for ColumnValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(ColumnValue::Missing, ColumnValue::Float)
    }
}

impl Column {
    /// Tally-derived value of this column, or `None` if the column does not
    /// change between trials.
    fn metric(&self, tally: &Tally) -> Option<Option<f64>> {
        match self {
            Self::Won => Some(Some(tally.won as f64)),
            Self::Failed => Some(Some(tally.failed as f64)),
            Self::Skipped => Some(Some(tally.skipped as f64)),
            Self::Stolen => Some(Some(tally.stolen)),
            Self::ObservedSuccessRate => Some(tally.success_rate()),
            _ => None,
        }
    }

    /// Value of a column which is the same in every trial.
    fn constant_value(
        &self,
        output: &SimulationOutput,
        attacker: AttackerId,
    ) -> ColumnValue {
        let profile = output.attacker(attacker);

        match self {
            Self::Attacker => ColumnValue::Text(profile.name().into()),
            Self::Strategy => ColumnValue::Text(profile.strategy().to_string()),
            Self::Qubits => ColumnValue::Int(profile.qubits() as usize),
            Self::BreaksSecp256k1 => {
                ColumnValue::Flag(profile.computer().can_break_secp256k1())
            }
            Self::SuccessRate => ColumnValue::Float(profile.success_rate()),
            Self::Trials => ColumnValue::Int(output.trials.len()),
            _ => unreachable!("{:?} changes between trials", self),
        }
    }

    fn get_value(
        &self,
        output: &SimulationOutput,
        trial: &TrialLog,
        attacker: AttackerId,
    ) -> ColumnValue {
        match self {
            Self::Trial => ColumnValue::Int(trial.trial),
            Self::AverageOf(_) => unreachable!(
                "never need the single value of the average descriptor column"
            ),
            _ => match self.metric(trial.tally(attacker)) {
                Some(value) => value.into(),
                None => self.constant_value(output, attacker),
            },
        }
    }

    fn get_average_value(
        &self,
        method: Average,
        output: &SimulationOutput,
        attacker: AttackerId,
        repeated: NonZeroUsize,
    ) -> ColumnValue {
        match self {
            Self::AverageOf(_) => return ColumnValue::Int(repeated.get()),
            Self::Trial => unreachable!("trial column is only used unaveraged"),
            _ => (),
        }

        let values: Option<Vec<_>> = output
            .trials
            .iter()
            .map(|trial| self.metric(trial.tally(attacker)))
            .collect();

        match values {
            // Trials without any attempts have no observed success rate
            Some(values) => {
                method.apply(values.into_iter().flatten().collect()).into()
            }
            None => self.constant_value(output, attacker),
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::AverageOf(method) => match method {
                Average::Mean => write!(f, "Mean Of"),
                Average::Median => write!(f, "Median Of"),
                Average::Max => write!(f, "Max Of"),
                Average::Min => write!(f, "Min Of"),
                Average::None => unreachable!(),
            },
            Self::Trial => write!(f, "Trial"),
            Self::Attacker => write!(f, "Attacker"),
            Self::Strategy => write!(f, "Strategy"),
            Self::Qubits => write!(f, "Qubits"),
            Self::BreaksSecp256k1 => write!(f, "Breaks secp256k1"),
            Self::SuccessRate => write!(f, "Success Rate"),
            Self::Won => write!(f, "Attacks Won"),
            Self::Failed => write!(f, "Attacks Failed"),
            Self::Skipped => write!(f, "Targets Skipped"),
            Self::Stolen => write!(f, "BTC Stolen"),
            Self::ObservedSuccessRate => write!(f, "Observed Success"),
            Self::Trials => write!(f, "Trials"),
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Int(int) => write!(f, "{}", int),
            Self::Float(float) => {
                write!(f, "{:.1$}", float, FLOAT_PRECISION_DIGITS)
            }
            Self::Flag(true) => write!(f, "yes"),
            Self::Flag(false) => write!(f, "no"),
            Self::Missing => write!(f, "N/A"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{attacker::AttackerProfile, simulation::SimulationBuilder};

    use super::{Average, Format, ResultsBuilder};

    fn run(trials: usize) -> ResultsBuilder {
        SimulationBuilder::new()
            .add_attacker(AttackerProfile::quantum_pirate())
            .add_attacker(AttackerProfile::crypto_thief())
            .standard_scenarios()
            .trials(trials)
            .seed(3)
            .build()
            .unwrap()
            .run_all()
    }

    #[test]
    fn averaged_rows_per_attacker() {
        let table = run(4).average(Average::Mean).build();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(
            table.titles(),
            vec![
                "Attacker",
                "Attacks Won",
                "Attacks Failed",
                "BTC Stolen",
                "Mean Of"
            ]
        );
    }

    #[test]
    fn unaveraged_rows_per_trial() {
        let table = run(3).average(Average::None).all().build();

        assert_eq!(table.num_rows(), 6);
        assert_eq!(table.titles()[0], "Trial");
        assert_eq!(table.titles().last().unwrap(), "Trials");
    }

    #[test]
    fn csv_output() {
        let table = run(2)
            .average(Average::Max)
            .strategy()
            .format(Format::CSV)
            .build();
        let text = table.to_string();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Attacker,Strategy,Attacks Won,Attacks Failed,BTC Stolen,Max Of"
        );
        assert!(lines[1].starts_with("QuantumPirate,AGGRESSIVE,"));
        assert!(lines[2].starts_with("CryptoThief,SELECTIVE,"));
        assert!(lines[1].ends_with(",2"));
    }

    #[test]
    fn pretty_print_is_aligned() {
        let table = run(1).all().build();
        let text = table.to_string();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), lines[2].len());
        assert_eq!(lines[0].len(), lines[3].len());
        assert!(lines[1].chars().all(|c| c == '-'));
    }

    #[test]
    fn stolen_matches_trial_logs() {
        let results = run(5);
        let expected: f64 = results
            .output()
            .trials
            .iter()
            .map(|trial| trial.tallies[0].stolen)
            .fold(f64::MIN, f64::max);

        let text = results
            .average(Average::Max)
            .format(Format::CSV)
            .build()
            .to_string();
        let pirate = text.lines().nth(1).unwrap();
        let stolen: f64 = pirate.split(',').nth(3).unwrap().parse().unwrap();

        assert!((stolen - expected).abs() < 1e-3);
    }
}
