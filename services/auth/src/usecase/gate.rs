use std::sync::Arc;

use axum::http::HeaderMap;

use bazaar_auth_types::bearer::bearer_token;
use bazaar_auth_types::principal::Principal;
use bazaar_domain::account::AccountKind;

use crate::domain::repository::{AccountRepository, Clock, SessionTokenRepository};
use crate::error::AuthServiceError;
use crate::usecase::token::ValidateTokenUseCase;

/// Allow-list of path prefixes that skip authentication.
///
/// Matching is per path segment: `/auth/customer` covers `/auth/customer` and
/// `/auth/customer/login` but not `/auth/customers`.
#[derive(Debug, Clone, Default)]
pub struct PublicPaths {
    prefixes: Arc<[String]>,
}

impl PublicPaths {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .filter_map(|p| {
                let p = p.as_ref().trim();
                if p.is_empty() {
                    return None;
                }
                let trimmed = p.trim_end_matches('/');
                Some(if trimmed.is_empty() { "/" } else { trimmed }.to_owned())
            })
            .collect();
        Self {
            prefixes: prefixes.into(),
        }
    }

    /// Parse a comma-separated list, as found in `PUBLIC_PATHS`.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            if prefix == "/" {
                return true;
            }
            match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Public,
    Authenticated(Principal),
}

pub struct GateUseCase<A: AccountRepository, T: SessionTokenRepository, C: Clock> {
    pub public_paths: PublicPaths,
    pub validator: ValidateTokenUseCase<A, T, C>,
}

impl<A, T, C> GateUseCase<A, T, C>
where
    A: AccountRepository,
    T: SessionTokenRepository,
    C: Clock,
{
    pub async fn execute(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<GateOutcome, AuthServiceError> {
        // 1. Public paths skip everything else.
        if self.public_paths.is_public(path) {
            return Ok(GateOutcome::Public);
        }

        // 2. Bearer header, rejected before any store lookup.
        let raw = bearer_token(headers).map_err(|_| AuthServiceError::Unauthorized)?;
        let info = self.validator.check_signature(&raw)?;

        // 3. Look the token up in each store; the holding store decides the kind.
        let mut found = None;
        for kind in AccountKind::RESOLUTION_ORDER {
            if let Some(record) = self.validator.tokens.find_by_raw(kind, &raw).await? {
                found = Some(record);
                break;
            }
        }
        let record = found.ok_or(AuthServiceError::Unauthorized)?;

        // 4. Revocation, expiry and account checks.
        let account = self.validator.accept(&info, &record).await?;
        Ok(GateOutcome::Authenticated(Principal::new(
            account.id,
            record.account_kind,
        )))
    }
}
