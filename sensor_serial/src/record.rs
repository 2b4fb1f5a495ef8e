use std::fmt;

/// Column names of the output file, in field order.
pub const HEADER: [&str; 4] = ["Timestamp", "HeartRate", "Temperature", "GSR"];

/// One line of sensor output: `timestamp,heartrate,temperature,gsr`.
///
/// Fields are kept as opaque text. Nothing is parsed as a number.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SensorRecord {
    timestamp: String,
    heart_rate: String,
    temperature: String,
    gsr: String,
}

impl SensorRecord {
    pub fn new(timestamp: &str, heart_rate: &str, temperature: &str, gsr: &str) -> Self {
        Self {
            timestamp: timestamp.to_owned(),
            heart_rate: heart_rate.to_owned(),
            temperature: temperature.to_owned(),
            gsr: gsr.to_owned(),
        }
    }

    /// Accept a line only if it has exactly four comma-separated fields
    /// and none of them is blank.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.matches(',').count() != 3 {
            return None;
        }

        let mut fields = line.split(',');
        let timestamp = fields.next()?;
        let heart_rate = fields.next()?;
        let temperature = fields.next()?;
        let gsr = fields.next()?;

        let record = Self::new(timestamp, heart_rate, temperature, gsr);
        if record.fields().iter().any(|f| f.trim().is_empty()) {
            return None;
        }
        Some(record)
    }

    pub fn fields(&self) -> [&str; 4] {
        [
            self.timestamp.as_str(),
            self.heart_rate.as_str(),
            self.temperature.as_str(),
            self.gsr.as_str(),
        ]
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn heart_rate(&self) -> &str {
        &self.heart_rate
    }

    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    pub fn gsr(&self) -> &str {
        &self.gsr
    }
}

/// Renders the record as it appears on the wire, without the line terminator.
impl fmt::Display for SensorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields().join(","))
    }
}

/// Decode one raw line, dropping any bytes that are not valid UTF-8.
pub fn decode_line(raw: &[u8]) -> String {
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_line() {
        let record = SensorRecord::parse("12:00:01,72,36.5,300").unwrap();
        assert_eq!(record.fields(), ["12:00:01", "72", "36.5", "300"]);
        assert_eq!(record.timestamp(), "12:00:01");
        assert_eq!(record.gsr(), "300");
    }

    #[test]
    fn rejects_empty_field() {
        assert_eq!(SensorRecord::parse("12:00:02,,36.5,300"), None);
        assert_eq!(SensorRecord::parse(",72,36.5,300"), None);
        assert_eq!(SensorRecord::parse("12:00:02,72,36.5,"), None);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(SensorRecord::parse("12:00:03,72,36.5"), None);
        assert_eq!(SensorRecord::parse("12:00:04,72,36.5,300,extra"), None);
        assert_eq!(SensorRecord::parse("garbage"), None);
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(SensorRecord::parse(""), None);
        assert_eq!(SensorRecord::parse("   \r"), None);
    }

    #[test]
    fn trims_line_but_not_inner_spaces() {
        let record = SensorRecord::parse("  12:00:05,72, 36.5,300\r\n").unwrap();
        assert_eq!(record.fields(), ["12:00:05", "72", " 36.5", "300"]);
    }

    #[test]
    fn rejects_blank_field() {
        assert_eq!(SensorRecord::parse("12:00:06, ,36.5,300"), None);
    }

    #[test]
    fn display_matches_wire_format() {
        let record = SensorRecord::new("12:00:01", "72", "36.5", "300");
        assert_eq!(record.to_string(), "12:00:01,72,36.5,300");
    }

    #[test]
    fn decode_drops_invalid_bytes() {
        assert_eq!(decode_line(b"12:00\xff:01,72,36.5,300"), "12:00:01,72,36.5,300");
        assert_eq!(decode_line(&[0xc3, 0x28]), "(");
    }
}
