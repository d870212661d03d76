//! Backyard Festival Rust Client Library
//!
//! A client for the Backyard Festival fundraiser API. Fundraisers carry
//! needs (money, time or item requests) stored as a base row plus one
//! type-specific detail row; this crate keeps the two in step and handles
//! display ordering, pledges, reward tiers, fundraiser templates and
//! reports, and user accounts.

pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod fundraisers;
pub mod needs;
pub mod pledges;
pub mod rewards;
pub mod users;
mod validate;

use std::sync::Arc;

use crate::config::{ClientOptions, FestivalConfig};
use crate::credentials::{StaticToken, TokenProvider};
use crate::error::Result;
use crate::fetch::HttpClient;
use crate::fundraisers::FundraisersClient;
use crate::needs::NeedsClient;
use crate::pledges::PledgesClient;
use crate::rewards::RewardsClient;
use crate::users::UsersClient;

/// The main entry point for the Backyard Festival client
#[derive(Clone)]
pub struct Festival {
    http: HttpClient,
    /// Client options
    pub options: ClientOptions,
}

impl Festival {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL of the API, e.g. `https://festival.example.org/api/`
    /// * `token` - API token sent as `Authorization: Token <token>`, if any
    ///
    /// # Example
    ///
    /// ```
    /// use backyard_festival::Festival;
    ///
    /// let festival = Festival::new("https://festival.example.org/api/", None).unwrap();
    /// let needs = festival.needs();
    /// ```
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let config = FestivalConfig::new(api_url, token)?;
        Self::new_with_options(config, ClientOptions::default())
    }

    /// Create a new client with custom options and a fixed token
    pub fn new_with_options(config: FestivalConfig, options: ClientOptions) -> Result<Self> {
        let credentials = Arc::new(StaticToken::new(config.token.clone()));
        Self::with_credentials(config, options, credentials)
    }

    /// Create a new client whose token is read from `credentials` on every request.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use backyard_festival::{Festival, config::{ClientOptions, FestivalConfig}};
    /// use backyard_festival::credentials::TokenStore;
    ///
    /// let store = TokenStore::default();
    /// let config = FestivalConfig::new("http://localhost:8000/", None).unwrap();
    /// let festival =
    ///     Festival::with_credentials(config, ClientOptions::default(), Arc::new(store.clone()))
    ///         .unwrap();
    /// store.login("token-from-login");
    /// ```
    pub fn with_credentials(
        config: FestivalConfig,
        options: ClientOptions,
        credentials: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let client = options.build_http_client()?;
        let http = HttpClient::new(config.api_url, client, credentials);
        Ok(Self { http, options })
    }

    /// Create a client from `FESTIVAL_API_URL` and `FESTIVAL_API_TOKEN`
    pub fn from_env() -> Result<Self> {
        Self::new_with_options(FestivalConfig::from_env()?, ClientOptions::default())
    }

    /// The shared HTTP transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn needs(&self) -> NeedsClient {
        NeedsClient::new(self.http.clone())
    }

    pub fn pledges(&self) -> PledgesClient {
        PledgesClient::new(self.http.clone())
    }

    pub fn rewards(&self) -> RewardsClient {
        RewardsClient::new(self.http.clone())
    }

    pub fn fundraisers(&self) -> FundraisersClient {
        FundraisersClient::new(self.http.clone())
    }

    pub fn users(&self) -> UsersClient {
        UsersClient::new(self.http.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, FestivalConfig};
    pub use crate::credentials::{StaticToken, TokenProvider, TokenStore};
    pub use crate::error::{Error, PartialFailure, Step};
    pub use crate::fundraisers::{Fundraiser, FundraiserFields, FundraisersClient};
    pub use crate::needs::{
        MoveDirection, Need, NeedBoard, NeedChanges, NeedDetail, NeedType, NeedsClient, NewNeed,
        ReorderStrategy,
    };
    pub use crate::users::{NewUser, User, UsersClient};
    pub use crate::Festival;
}
