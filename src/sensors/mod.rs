use {anyhow::Result, async_trait::async_trait, serde::Serialize};

mod parser;

pub use parser::{parse, parse_value, ParseWarning, Parsed, ValueParseError};

/// Anything that can hand over the flattened sensor text of the dashboard,
/// in document order.
#[async_trait]
pub trait SensorSource {
    async fn sensor_text(&mut self) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    pub label: String,
    pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurements {
    pub internal_temperatures: Vec<Measurement>,
    pub humidities: Vec<Measurement>,
    pub external_temperatures: Vec<Measurement>,
}

impl Measurements {
    pub fn section(&self, section: Section) -> &[Measurement] {
        match section {
            Section::InternalTemperatures => &self.internal_temperatures,
            Section::Humidities => &self.humidities,
            Section::ExternalTemperatures => &self.external_temperatures,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<Measurement> {
        match section {
            Section::InternalTemperatures => &mut self.internal_temperatures,
            Section::Humidities => &mut self.humidities,
            Section::ExternalTemperatures => &mut self.external_temperatures,
        }
    }

    pub fn len(&self) -> usize {
        Section::ALL.iter().map(|s| self.section(*s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One of the groups the dashboard lays its readings out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    InternalTemperatures,
    Humidities,
    ExternalTemperatures,
}

impl Section {
    /// Output order of the groups.
    pub const ALL: [Section; 3] = [
        Section::InternalTemperatures,
        Section::Humidities,
        Section::ExternalTemperatures,
    ];

    /// Header text the dashboard renders above the group.
    pub fn header(self) -> &'static str {
        match self {
            Section::InternalTemperatures => "TEMPERATURE SENSORS",
            Section::Humidities => "INSIDE HUMIDITY",
            Section::ExternalTemperatures => "OUTSIDE TEMP.",
        }
    }

    /// Suffix appended to a label in CSV header rows.
    pub fn column_suffix(self) -> &'static str {
        match self {
            Section::InternalTemperatures => "Int. Temp.",
            Section::Humidities => "Humid.",
            Section::ExternalTemperatures => "Ext. Temp.",
        }
    }

    pub fn from_header(text: &str) -> Option<Section> {
        Section::ALL.iter().copied().find(|s| s.header() == text)
    }
}
