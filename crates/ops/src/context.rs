//! Operations context for dependency injection

use crate::fetch::{DefaultFetcher, FetchConfig, SourceFetcher};
use pkgsig_config::Config;
use pkgsig_errors::Error;
use pkgsig_keyring::DirKeyring;
use pkgsig_pgp::ParseOptions;
use std::time::Duration;

/// Operations context providing access to the keyring and key sources
pub struct OpsCtx {
    /// Trusted keys
    pub keyring: DirKeyring,
    /// Reads key sources
    pub fetcher: Box<dyn SourceFetcher>,
    /// Effective configuration
    pub config: Config,
}

impl OpsCtx {
    /// Packet dump settings from the output configuration
    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        parse_options(&self.config)
    }
}

fn parse_options(config: &Config) -> ParseOptions {
    ParseOptions {
        print_packets: config.output.print_packets,
    }
}

/// Builder for the operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    config: Option<Config>,
    keyring: Option<DirKeyring>,
    fetcher: Option<Box<dyn SourceFetcher>>,
}

impl OpsContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_keyring(mut self, keyring: DirKeyring) -> Self {
        self.keyring = Some(keyring);
        self
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: impl SourceFetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Build the context
    ///
    /// The keyring directory and fetcher default to the ones named by the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring cannot be opened or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let config = self.config.unwrap_or_default();

        let keyring = match self.keyring {
            Some(keyring) => keyring,
            None => DirKeyring::open(config.keyring_dir(), parse_options(&config))?,
        };

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(DefaultFetcher::new(&FetchConfig {
                timeout: Duration::from_secs(config.keys.timeout),
                ..FetchConfig::default()
            })?),
        };

        Ok(OpsCtx {
            keyring,
            fetcher,
            config,
        })
    }
}
