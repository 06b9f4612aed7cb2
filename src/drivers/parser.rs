use crate::drivers::ParseError;
/// Number of fixed leading fields: date, time, hz_low, hz_high, bin width, sample count.
pub const FIXED_FIELDS: usize = 6;
/// Power-value count `hackrf_sweep` emits when the configuration yields no usable bins.
pub const DEFAULT_SENTINEL_WIDTH: usize = 6;
/// One reported scan across a sub-range of frequencies.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepSegment {
    pub timestamp: String,
    pub start_freq_ghz: f64,
    pub stop_freq_ghz: f64,
    pub step_mhz: f64,
    pub power_db: Vec<f64>,
}
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedLine {
    Segment(SweepSegment),
    /// The tool reported nothing useful; ingestion has to stop.
    Terminate,
}
/// Turns `date, time, start_hz, stop_hz, step_hz, bin_count, dB, dB, ...` records into segments.
#[derive(Clone, Copy, Debug)]
pub struct LineParser {
    sentinel_width: Option<usize>,
}
impl Default for LineParser {
    fn default() -> Self {
        Self::new(Some(DEFAULT_SENTINEL_WIDTH))
    }
}
impl LineParser {
    /// `None` disables terminal-sentinel detection.
    pub fn new(sentinel_width: Option<usize>) -> Self {
        Self { sentinel_width }
    }
    pub fn sentinel_width(&self) -> Option<usize> {
        self.sentinel_width
    }
    pub fn parse(&self, line: &str) -> Result<ParsedLine, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::TooFewFields { found: 0 });
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < FIXED_FIELDS {
            return Err(ParseError::TooFewFields {
                found: fields.len(),
            });
        }
        let start_hz = number("start_hz", fields[2])?;
        let stop_hz = number("stop_hz", fields[3])?;
        let step_hz = number("step_hz", fields[4])?;
        number("bin_count", fields[5])?;
        let values = &fields[FIXED_FIELDS..];
        if Some(values.len()) == self.sentinel_width {
            return Ok(ParsedLine::Terminate);
        }
        if values.is_empty() {
            return Err(ParseError::NoPowerValues);
        }
        let power_db = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    field: format!("value_{}", i + 1),
                    value: (*v).to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParsedLine::Segment(SweepSegment {
            timestamp: format!("{} {}", fields[0], fields[1]),
            start_freq_ghz: start_hz / 1e9,
            stop_freq_ghz: stop_hz / 1e9,
            step_mhz: step_hz / 1e6,
            power_db,
        }))
    }
}
fn number(field: &str, value: &str) -> Result<f64, ParseError> {
    value.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}
