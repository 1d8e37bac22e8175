use {
    crate::{
        browser::{BrowserError, Page},
        sensors::SensorSource,
    },
    anyhow::Result,
    async_trait::async_trait,
    log::{debug, info},
    std::time::Duration,
    thiserror::Error,
};

const NEST_URL: &str = "https://home.nest.com";
const THERMOSTAT_LINK: &str = ".puck-item > a";
const THERMOSTAT_CARD: &str = ".card.type-thermostat";
const LOGIN_FIELD: &str = "#email";
const PASSWORD_FIELD: &str = "#pass";
const LOGIN_BUTTON: &str = "#signin";

/// Headers, sensor names and readings are sibling elements with nothing
/// telling a temperature apart from a humidity, so they are collected in
/// document order and sorted out by the parser.
const SENSOR_TEXT: &str =
    r#".card.type-thermostat div[class*="style_title"],div[class*="style_value"],header"#;

#[derive(Debug, Error)]
#[error("{step}")]
pub struct ScrapeError {
    pub step: &'static str,
    pub source: BrowserError,
}

trait Step<T> {
    fn step(self, step: &'static str) -> Result<T, ScrapeError>;
}

impl<T> Step<T> for Result<T, BrowserError> {
    fn step(self, step: &'static str) -> Result<T, ScrapeError> {
        self.map_err(|source| ScrapeError { step, source })
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

pub struct NestScraper<'a> {
    page: Page<'a>,
    credentials: Credentials,
    timeout: Duration,
}

impl<'a> NestScraper<'a> {
    /// `timeout` bounds every wait for a page element.
    pub fn new(page: Page<'a>, credentials: Credentials, timeout: Duration) -> Self {
        NestScraper {
            page,
            credentials,
            timeout,
        }
    }

    pub async fn login(&mut self) -> Result<(), ScrapeError> {
        info!("navigating to {}", NEST_URL);
        self.page.navigate(NEST_URL).await.step("opening dashboard")?;

        match self.page.wait_for(THERMOSTAT_LINK, false, self.timeout).await {
            Ok(()) => {
                info!("already logged in");
                return Ok(());
            }
            Err(BrowserError::Timeout(_)) => debug!("login required"),
            Err(source) => {
                return Err(ScrapeError {
                    step: "checking for thermostat",
                    source,
                })
            }
        }

        self.page
            .wait_for(LOGIN_FIELD, false, self.timeout)
            .await
            .step("finding login field")?;
        self.page.click(LOGIN_FIELD).await.step("clicking login field")?;
        // The email field is not always visible, so typing into it is unreliable.
        debug!("entering login {}", self.credentials.login);
        self.page
            .set_active_value(&self.credentials.login)
            .await
            .step("entering login")?;

        self.page
            .click(PASSWORD_FIELD)
            .await
            .step("clicking password field")?;
        self.page
            .set_active_value(&self.credentials.password)
            .await
            .step("entering password")?;

        self.page.click(LOGIN_BUTTON).await.step("clicking sign-in")?;
        info!("submitted login");
        Ok(())
    }
}

#[async_trait]
impl SensorSource for NestScraper<'_> {
    async fn sensor_text(&mut self) -> Result<Vec<String>> {
        self.page
            .wait_for(THERMOSTAT_LINK, false, self.timeout)
            .await
            .step("finding thermostat")?;
        self.page
            .click(THERMOSTAT_LINK)
            .await
            .step("opening thermostat")?;
        self.page
            .wait_for(THERMOSTAT_CARD, true, self.timeout)
            .await
            .step("waiting for thermostat card")?;

        info!("scraping thermostat info");
        let text = self
            .page
            .text_contents(SENSOR_TEXT)
            .await
            .step("reading sensor text")?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_the_failure() {
        let err = Err::<(), _>(BrowserError::Timeout("waiting for #email".to_string()))
            .step("finding login field")
            .unwrap_err();

        assert_eq!(err.step, "finding login field");
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            "finding login field: timed out waiting for #email"
        );
    }
}
