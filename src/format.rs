use {
    crate::sensors::{Measurements, Section},
    chrono::{DateTime, TimeZone},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

const TIME_FORMAT: &str = "%b %-d %H:%M:%S %Y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown output format '{0}' (expected csv, csv+hdr or json)")]
pub struct UnknownFormatError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    CsvWithHeader,
    Json,
}

impl FromStr for Format {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Format::Csv),
            "csv+hdr" | "csv+header" => Ok(Format::CsvWithHeader),
            "json" => Ok(Format::Json),
            other => Err(UnknownFormatError(other.to_string())),
        }
    }
}

impl Format {
    /// Renders `measurements` as taken at `time`.
    pub fn render<Tz>(
        self,
        measurements: &Measurements,
        time: &DateTime<Tz>,
    ) -> Result<String, serde_json::Error>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Ok(match self {
            Format::Csv => csv_row(measurements, time),
            Format::CsvWithHeader => {
                let mut out = csv_header(measurements);
                out.push_str(&csv_row(measurements, time));
                out
            }
            Format::Json => serde_json::to_string(measurements)? + "\n",
        })
    }
}

fn csv_header(measurements: &Measurements) -> String {
    let mut columns = vec!["Time".to_string()];
    for section in Section::ALL {
        columns.extend(
            measurements
                .section(section)
                .iter()
                .map(|m| format!("{} {}", m.label, section.column_suffix())),
        );
    }
    columns.join(", ") + "\n"
}

fn csv_row<Tz>(measurements: &Measurements, time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut columns = vec![time.format(TIME_FORMAT).to_string()];
    for section in Section::ALL {
        columns.extend(
            measurements
                .section(section)
                .iter()
                .map(|m| m.value.to_string()),
        );
    }
    columns.join(", ") + "\n"
}

#[cfg(test)]
mod tests {
    use {super::*, crate::sensors::Measurement, chrono::Utc};

    fn sample() -> Measurements {
        Measurements {
            internal_temperatures: vec![
                Measurement {
                    label: "Hall".to_string(),
                    value: 19.5,
                },
                Measurement {
                    label: "Den".to_string(),
                    value: 19.0,
                },
            ],
            humidities: vec![Measurement {
                label: "Hall".to_string(),
                value: 31.0,
            }],
            external_temperatures: vec![Measurement {
                label: "Ottawa".to_string(),
                value: -16.0,
            }],
        }
    }

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
    }

    #[test]
    fn format_names() {
        assert_eq!("csv".parse::<Format>(), Ok(Format::Csv));
        assert_eq!("csv+hdr".parse::<Format>(), Ok(Format::CsvWithHeader));
        assert_eq!("csv+header".parse::<Format>(), Ok(Format::CsvWithHeader));
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
        assert_eq!(
            "xml".parse::<Format>(),
            Err(UnknownFormatError("xml".to_string()))
        );
    }

    #[test]
    fn csv_is_a_single_row() {
        assert_eq!(
            Format::Csv.render(&sample(), &time()).unwrap(),
            "Jan 2 15:04:05 2006, 19.5, 19, 31, -16\n"
        );
    }

    #[test]
    fn csv_header_labels_every_column() {
        assert_eq!(
            Format::CsvWithHeader.render(&sample(), &time()).unwrap(),
            "Time, Hall Int. Temp., Den Int. Temp., Hall Humid., Ottawa Ext. Temp.\n\
             Jan 2 15:04:05 2006, 19.5, 19, 31, -16\n"
        );
    }

    #[test]
    fn csv_without_measurements() {
        assert_eq!(
            Format::CsvWithHeader.render(&Measurements::default(), &time()).unwrap(),
            "Time\nJan 2 15:04:05 2006\n"
        );
    }

    #[test]
    fn json_keeps_structure() {
        let out = Format::Json.render(&sample(), &time()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["InternalTemperatures"][0]["Label"], "Hall");
        assert_eq!(value["InternalTemperatures"][0]["Value"], 19.5);
        assert_eq!(value["Humidities"][0]["Value"], 31.0);
        assert_eq!(value["ExternalTemperatures"][0]["Label"], "Ottawa");
        assert_eq!(value["ExternalTemperatures"][0]["Value"], -16.0);
    }
}
