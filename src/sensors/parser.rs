use {
    crate::sensors::{Measurement, Measurements, Section},
    log::{log, Level},
    std::fmt,
    thiserror::Error,
};

/// A value token without a usable numeric prefix.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no numeric value in {token:?}")]
pub struct ValueParseError {
    pub token: String,
}

/// Something the parser had to drop to keep going.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// Text seen before the first section header.
    PreHeaderNoise(String),
    /// A label with no value before the next header or the end of input.
    UnpairedLabel(String),
    /// A label whose value could not be read.
    SkippedPair {
        label: String,
        error: ValueParseError,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreHeaderNoise(token) => write!(f, "ignored {:?} before any section header", token),
            Self::UnpairedLabel(label) => write!(f, "label {:?} has no value", label),
            Self::SkippedPair { label, error } => write!(f, "skipped {:?}: {}", label, error),
        }
    }
}

impl ParseWarning {
    /// Pre-header noise logs at debug, lost readings at warn.
    pub fn level(&self) -> Level {
        match self {
            Self::PreHeaderNoise(_) => Level::Debug,
            Self::UnpairedLabel(_) | Self::SkippedPair { .. } => Level::Warn,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub measurements: Measurements,
    pub warnings: Vec<ParseWarning>,
}

/// Current section plus the half-read pair, if any.
#[derive(Debug, Default)]
struct State {
    section: Option<Section>,
    pending_label: Option<String>,
}

impl State {
    fn feed(&mut self, token: &str, out: &mut Parsed) {
        if let Some(section) = Section::from_header(token) {
            if let Some(label) = self.pending_label.take() {
                out.warnings.push(ParseWarning::UnpairedLabel(label));
            }
            self.section = Some(section);
            return;
        }

        let section = match self.section {
            Some(section) => section,
            None => {
                out.warnings
                    .push(ParseWarning::PreHeaderNoise(token.to_string()));
                return;
            }
        };

        let label = match self.pending_label.take() {
            Some(label) => label,
            None => {
                self.pending_label = Some(token.to_string());
                return;
            }
        };

        match parse_value(token) {
            Ok(value) => out
                .measurements
                .section_mut(section)
                .push(Measurement { label, value }),
            Err(error) => out.warnings.push(ParseWarning::SkippedPair { label, error }),
        }
    }

    fn finish(self, out: &mut Parsed) {
        if let Some(label) = self.pending_label {
            out.warnings.push(ParseWarning::UnpairedLabel(label));
        }
    }
}

/// Rebuilds the dashboard's readings from its flattened text.
///
/// Section headers switch the group that following tokens belong to; inside a
/// group tokens alternate label, value. Nothing here is fatal: tokens that do
/// not fit are dropped and reported in [`Parsed::warnings`].
pub fn parse<I, S>(tokens: I) -> Parsed
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Parsed::default();
    let mut state = State::default();

    for token in tokens {
        state.feed(token.as_ref(), &mut out);
    }
    state.finish(&mut out);

    for w in &out.warnings {
        log!(w.level(), "{}", w);
    }

    out
}

/// Reads the leading number of a value such as `19.5°` or `31%`.
pub fn parse_value(token: &str) -> Result<f32, ValueParseError> {
    let end = token
        .char_indices()
        .find(|(_, c)| !(c.is_numeric() || *c == '-' || *c == '.'))
        .map_or(token.len(), |(i, _)| i);

    token[..end].parse().map_err(|_| ValueParseError {
        token: token.to_string(),
    })
}
