use crate::domain::airline::AirlineRecord;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct AirlineRow {
    airline: String,
    registered: bool,
    funded: bool,
    balance: String,
    votes: usize,
}

impl From<&AirlineRecord> for AirlineRow {
    fn from(record: &AirlineRecord) -> Self {
        Self {
            airline: record.airline.to_string(),
            registered: record.registered,
            funded: record.funded,
            balance: record.balance.to_string(),
            votes: record.vote_count(),
        }
    }
}

/// Writes the final airline report as CSV:
/// `airline,registered,funded,balance,votes`.
pub struct AirlineWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AirlineWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_airlines(&mut self, airlines: Vec<AirlineRecord>) -> Result<()> {
        if airlines.is_empty() {
            self.writer
                .write_record(["airline", "registered", "funded", "balance", "votes"])?;
        }
        for record in &airlines {
            self.writer.serialize(AirlineRow::from(record))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
