//! Account signup and the signed-in user

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fetch::{null_as_default, HttpClient};

/// Body for `POST users/signup/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: email.to_string(),
        }
    }

    pub fn with_name(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = first_name.to_string();
        self.last_name = last_name.to_string();
        self
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{}: This field is required.", field)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

/// Client for user accounts
#[derive(Clone)]
pub struct UsersClient {
    http: HttpClient,
}

impl UsersClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Register an account. This does not log in; pass the token from the
    /// login endpoint to a [`crate::credentials::TokenStore`] for that.
    pub async fn signup(&self, user: &NewUser) -> Result<User> {
        user.validate()?;
        let created: User = self
            .http
            .post("users/signup/")
            .json(user)?
            .execute("Error creating account")
            .await?;
        debug!("Created account {}", created.username);
        Ok(created)
    }

    /// The user the current token belongs to
    pub async fn me(&self) -> Result<User> {
        self.http.get("users/me/").execute("Not authenticated").await
    }
}
