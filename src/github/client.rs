//! Octocrab client wrappers.
//!
//! `OctocrabClient` scopes an `Octocrab` instance to a single repository,
//! matching the design where [`Action`](crate::effects::Action) variants
//! carry no repo info. `AppClientFactory` produces such clients on demand,
//! authenticated as the GitHub App installation for the target repository.

use jsonwebtoken::EncodingKey;
use octocrab::models::AppId;
use octocrab::Octocrab;

use crate::effects::ClientFactory;
use crate::types::RepoId;

use super::error::PlatformError;

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The repository this client is scoped to.
    repo: RepoId,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given repository.
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self { client, repo }
    }

    /// Creates a client from a personal access token.
    ///
    /// Convenience for local runs where GitHub App auth is overkill.
    pub fn from_token(token: impl Into<String>, repo: RepoId) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client, repo))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// Returns the repository this client is scoped to.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Returns the repository owner.
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    /// Returns the repository name.
    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Produces repo-scoped clients authenticated as a GitHub App installation.
///
/// The app-level client is built once at startup; a fresh
/// installation-scoped client is derived per delivery, so installation
/// tokens are always current.
#[derive(Clone)]
pub struct AppClientFactory {
    app: Octocrab,
}

impl AppClientFactory {
    /// Builds the factory from App credentials.
    ///
    /// `private_key_pem` is the RSA private key GitHub issued for the App.
    pub fn new(app_id: u64, private_key_pem: &[u8]) -> Result<Self, FactoryError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(FactoryError::InvalidPrivateKey)?;
        let app = Octocrab::builder()
            .app(AppId(app_id), key)
            .build()
            .map_err(FactoryError::Build)?;
        Ok(Self { app })
    }
}

/// Errors constructing an [`AppClientFactory`].
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("invalid GitHub App private key: {0}")]
    InvalidPrivateKey(#[source] jsonwebtoken::errors::Error),

    #[error("failed to build octocrab client: {0}")]
    Build(#[source] octocrab::Error),
}

impl ClientFactory for AppClientFactory {
    type Client = OctocrabClient;
    type Error = PlatformError;

    async fn repo_client(&self, repo: &RepoId) -> Result<OctocrabClient, PlatformError> {
        let installation = self
            .app
            .apps()
            .get_repository_installation(&repo.owner, &repo.repo)
            .await
            .map_err(PlatformError::from_octocrab)?;

        let client = self
            .app
            .installation(installation.id)
            .map_err(PlatformError::from_octocrab)?;

        Ok(OctocrabClient::new(client, repo.clone()))
    }
}
